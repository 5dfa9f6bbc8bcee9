use crate::application_port::paths::{LOGIN_PATH, LOGOUT_PATH, REGISTER_PATH};
use crate::application_port::*;
use crate::domain_model::{Credential, TokenResponse};
use crate::domain_port::{ApiRequest, RequestKind};
use crate::logger::*;
use crate::session::Dispatcher;
use std::sync::Arc;
use validator::Validate;

pub struct RealAuthService {
    dispatcher: Arc<Dispatcher>,
}

impl RealAuthService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, input: LoginInput) -> Result<Credential, ApiError> {
        input.validate()?;

        let request = ApiRequest::post(LOGIN_PATH)
            .kind(RequestKind::Login)
            .json(&input)?;
        let token: TokenResponse = self.dispatcher.send_json(request).await.map_err(|e| {
            warn!(error = %e, "login failed");
            e
        })?;
        let credential = token
            .credential()
            .ok_or_else(|| ApiError::Decode("login response carried no access token".to_string()))?;

        self.dispatcher.session().set(credential.clone());
        info!("logged in");
        Ok(credential)
    }

    async fn register(&self, input: RegisterInput) -> Result<RegisterResponse, ApiError> {
        input.validate()?;

        let request = ApiRequest::post(REGISTER_PATH)
            .kind(RequestKind::Register)
            .json(&input)?;
        let response: RegisterResponse = self.dispatcher.send_json(request).await?;
        info!(user_id = %response.user_id, "registered");

        if let Some(token) = response.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.dispatcher.session().set(Credential::new(token));
        }
        Ok(response)
    }

    async fn restore_session(&self) -> bool {
        if self.dispatcher.session().is_authenticated() {
            return true;
        }
        let outcome = self.dispatcher.coordinator().restore().await;
        let restored = outcome.credential().is_some();
        info!(restored, "startup session restore");
        restored
    }

    async fn logout(&self) -> Result<MessageResponse, ApiError> {
        let request = ApiRequest::post(LOGOUT_PATH).kind(RequestKind::Logout);
        let result = self.dispatcher.send_json::<MessageResponse>(request).await;

        // Local state goes regardless of what the backend said.
        self.dispatcher.session().clear();
        if let Err(e) = &result {
            warn!(error = %e, "logout request failed, session cleared locally");
        }
        result
    }
}
