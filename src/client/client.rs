use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::FeedQuery;
use crate::domain_port::*;
use crate::feed::JobFeed;
use crate::infra_http::{HttpTransport, HttpTransportConfig};
use crate::logger::*;
use crate::session::*;
use crate::settings::Settings;
use std::sync::Arc;
use std::time::Duration;

/// One authenticated client session: a single credential store, a single
/// refresh coordinator and the services built on top of them.
pub struct Client {
    pub auth_service: Arc<dyn AuthService>,
    pub account_service: Arc<dyn AccountService>,
    pub route_guard: RouteGuard,
    session: Arc<SessionState>,
    identity: Arc<IdentityState>,
    identity_sync: Arc<IdentitySync>,
    dispatcher: Arc<Dispatcher>,
}

impl Client {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> = match settings.backend.kind.as_str() {
            "fake" => Arc::new(FakeBackend::seeded(45)),
            "http" => Arc::new(HttpTransport::new(HttpTransportConfig {
                base_url: settings.backend.base_url.clone(),
                timeout: Duration::from_secs(settings.backend.timeout_secs),
            })?),
            other => return Err(anyhow::anyhow!("unknown backend kind: {other:?}")),
        };
        info!(backend = %settings.backend.kind, "client transport ready");

        Ok(Self::from_transport(transport))
    }

    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        let session = Arc::new(SessionState::new());
        let coordinator = Arc::new(RefreshCoordinator::new(transport.clone(), session.clone()));
        let dispatcher = Arc::new(Dispatcher::new(transport, session.clone(), coordinator));

        let account_service: Arc<dyn AccountService> =
            Arc::new(RealAccountService::new(dispatcher.clone()));
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(dispatcher.clone()));

        let identity = Arc::new(IdentityState::new());
        let identity_sync = Arc::new(IdentitySync::new(identity.clone(), account_service.clone()));
        let observer: Arc<dyn SessionObserver> = identity_sync.clone();
        session.add_observer(Arc::downgrade(&observer));

        let route_guard = RouteGuard::new(session.clone(), identity.clone());

        Self {
            auth_service,
            account_service,
            route_guard,
            session,
            identity,
            identity_sync,
            dispatcher,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn identity(&self) -> &Arc<IdentityState> {
        &self.identity
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Startup restore: try the refresh cookie, then wait for the identity
    /// of the restored session.
    pub async fn start(&self) -> IdentityStatus {
        self.auth_service.restore_session().await;
        self.identity_sync.hydrate().await
    }

    /// Wait for the in-flight identity fetch, if any.
    pub async fn hydrate(&self) -> IdentityStatus {
        self.identity_sync.hydrate().await
    }

    pub async fn update_profile(&self, input: UpdateProfileInput) -> ApiResult<MessageResponse> {
        let response = self.account_service.update_me(input).await?;
        self.identity_sync.resync();
        Ok(response)
    }

    pub fn feed(&self, query: FeedQuery) -> JobFeed {
        JobFeed::new(self.dispatcher.clone(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::Role;

    fn client() -> (Arc<FakeBackend>, Client) {
        let backend = Arc::new(FakeBackend::seeded(3));
        let client = Client::from_transport(backend.clone());
        (backend, client)
    }

    fn login_input(email: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
        }
    }

    #[tokio::test]
    async fn login_hydrates_identity_and_opens_guard() {
        let (_backend, client) = client();
        client.auth_service.login(login_input("recruiter@example.com")).await.unwrap();

        match client.hydrate().await {
            IdentityStatus::Resolved(identity) => {
                assert_eq!(identity.role, Some(Role::Recruiter));
                assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
            }
            other => panic!("unexpected identity {other:?}"),
        }
        assert_eq!(
            client.route_guard.evaluate(Requirement::Role(Role::Recruiter)),
            GuardDecision::Allow
        );
    }

    #[tokio::test]
    async fn logout_clears_session_and_identity() {
        let (backend, client) = client();
        client.auth_service.login(login_input("applicant@example.com")).await.unwrap();
        client.hydrate().await;

        backend.set_offline(true);
        assert!(client.auth_service.logout().await.is_err());
        assert!(!client.session().is_authenticated());
        assert_eq!(client.identity().status(), IdentityStatus::Anonymous);
        assert!(matches!(
            client.route_guard.evaluate(Requirement::Authenticated),
            GuardDecision::Deny { .. }
        ));
    }

    #[tokio::test]
    async fn start_restores_from_refresh_cookie() {
        let (backend, client) = client();
        client.auth_service.login(login_input("applicant@example.com")).await.unwrap();

        // A second client sharing the cookie jar, as after a page reload.
        let reloaded = Client::from_transport(backend.clone());
        let status = reloaded.start().await;
        assert!(matches!(status, IdentityStatus::Resolved(_)));
        assert!(reloaded.session().is_authenticated());
    }

    #[tokio::test]
    async fn start_without_cookie_stays_anonymous() {
        let (_backend, client) = client();
        assert_eq!(client.start().await, IdentityStatus::Anonymous);
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn profile_update_resyncs_identity() {
        let (backend, client) = client();
        client.auth_service.login(login_input("recruiter@example.com")).await.unwrap();
        client.hydrate().await;

        let company_id = uuid::Uuid::from_u128(7);
        client
            .update_profile(UpdateProfileInput {
                company_id: Some(company_id),
            })
            .await
            .unwrap();
        assert!(matches!(client.hydrate().await, IdentityStatus::Resolved(_)));
        assert_eq!(backend.calls(paths::ME_PATH), 3);
    }

    #[tokio::test]
    async fn recruiter_needs_a_company_until_profile_update() {
        let (_backend, client) = client();
        client.auth_service.login(login_input("recruiter@example.com")).await.unwrap();
        client.hydrate().await;
        assert_eq!(
            client.route_guard.evaluate(Requirement::RecruiterWithCompany),
            GuardDecision::Deny {
                redirect_to: COMPANY_ROUTE.to_string()
            }
        );

        client
            .update_profile(UpdateProfileInput {
                company_id: Some(uuid::Uuid::from_u128(7)),
            })
            .await
            .unwrap();
        client.hydrate().await;
        assert_eq!(
            client.route_guard.evaluate(Requirement::RecruiterWithCompany),
            GuardDecision::Allow
        );
    }
}
