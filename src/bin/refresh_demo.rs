//! Fires a burst of requests at an expired session and shows that they all
//! ride on a single refresh.
//!
//! $ cargo run --bin refresh_demo

use futures_util::future::join_all;
use jobboard::application_impl::FakeBackend;
use jobboard::application_port::{LoginInput, paths};
use jobboard::client::Client;
use jobboard::domain_model::UserProfile;
use jobboard::domain_port::ApiRequest;
use jobboard::logger::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let backend = Arc::new(FakeBackend::seeded(10));
    let client = Client::from_transport(backend.clone());
    client
        .auth_service
        .login(LoginInput {
            email: "applicant@example.com".to_string(),
            password: "Passw0rd!".to_string(),
        })
        .await?;
    client.hydrate().await;

    backend.expire_access_tokens();
    info!("access tokens expired, sending 5 concurrent requests");

    let requests = (0..5).map(|_| {
        client
            .dispatcher()
            .send_json::<UserProfile>(ApiRequest::get(paths::ME_PATH))
    });
    for result in join_all(requests).await {
        let profile = result?;
        info!(user_id = %profile.user_id, "request succeeded");
    }

    println!(
        "refreshes: {}, refresh calls seen by backend: {}",
        client.dispatcher().coordinator().refresh_count(),
        backend.calls(paths::REFRESH_PATH)
    );
    Ok(())
}
