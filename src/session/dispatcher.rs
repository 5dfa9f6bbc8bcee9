use crate::application_port::{ApiError, ApiResult};
use crate::domain_model::Credential;
use crate::domain_port::{ApiRequest, RawResponse, Transport};
use crate::logger::*;
use crate::session::{RefreshCoordinator, RefreshOutcome, SessionState};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Sends requests with the current bearer credential and recovers from an
/// expired session by refreshing once and retrying once.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    session: Arc<SessionState>,
    coordinator: Arc<RefreshCoordinator>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionState>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            session,
            coordinator,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub async fn send(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        let credential = if request.kind.uses_bearer() {
            self.session.get()
        } else {
            None
        };

        let error = match self.attempt(&request, credential.as_ref()).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if !matches!(error, ApiError::Authorization { .. })
            || request.retried
            || !request.kind.recovers_via_refresh()
        {
            return Err(error);
        }

        debug!(method = %request.method, path = %request.path, "authorization failed, recovering session");
        match self.coordinator.recover(credential.as_ref()).await {
            RefreshOutcome::Refreshed(fresh) => {
                let retry = request.as_retry();
                let result = self.attempt(&retry, Some(&fresh)).await;
                // A second authorization failure is final and ends the session.
                if let Err(ApiError::Authorization { .. }) = &result {
                    warn!(path = %request.path, "refreshed credential rejected, signing out");
                    self.session.clear_if_current(&fresh);
                }
                result
            }
            RefreshOutcome::Failed(message) => Err(ApiError::RefreshFailure { message }),
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        credential: Option<&Credential>,
    ) -> ApiResult<RawResponse> {
        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = credential.is_some(),
            retried = request.retried,
            "dispatching request"
        );
        let response = self.transport.execute(request, credential).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(&response))
        }
    }
}
