use crate::application_port::ApiError;
use crate::application_port::paths::REFRESH_PATH;
use crate::domain_model::{Credential, TokenResponse};
use crate::domain_port::{ApiRequest, RequestKind, Transport};
use crate::logger::*;
use crate::session::{SessionState, lock};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What every caller waiting on one refresh observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(Credential),
    Failed(String),
}

impl RefreshOutcome {
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            RefreshOutcome::Refreshed(credential) => Some(credential),
            RefreshOutcome::Failed(_) => None,
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct PendingRefresh {
    id: u64,
    handle: SharedRefresh,
}

/// Collapses concurrent authorization failures into a single call to the
/// refresh endpoint.
///
/// The pending handle is checked and installed inside one critical section
/// with no suspension point, so N callers failing together produce exactly
/// one refresh call and all observe its outcome.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    session: Arc<SessionState>,
    pending: Arc<Mutex<Option<PendingRefresh>>>,
    next_id: AtomicU64,
    refresh_calls: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionState>) -> Self {
        Self {
            transport,
            session,
            pending: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
            refresh_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Called by a request that failed with an authorization error after
    /// being sent with `failed_with`.
    ///
    /// Joins the in-flight refresh if there is one. If the session already
    /// moved on to another credential since the request was sent, that
    /// credential is returned without refreshing again. If the session was
    /// cleared since then, the request is not recovered.
    pub async fn recover(&self, failed_with: Option<&Credential>) -> RefreshOutcome {
        let handle = {
            let mut pending = lock(&self.pending);
            match pending.as_ref() {
                Some(in_flight) => in_flight.handle.clone(),
                None => match (self.session.get(), failed_with) {
                    (Some(current), _) if failed_with != Some(&current) => {
                        debug!("credential already rotated, skipping refresh");
                        return RefreshOutcome::Refreshed(current);
                    }
                    // The session was cleared while this request was in flight.
                    (None, Some(_)) => {
                        debug!("session ended while request was in flight, not refreshing");
                        return RefreshOutcome::Failed("session ended".to_string());
                    }
                    _ => self.start(&mut pending),
                },
            }
        };
        handle.await
    }

    /// Refresh unconditionally (joining an in-flight refresh if any). Used
    /// to re-establish a session at startup from the refresh cookie.
    pub async fn restore(&self) -> RefreshOutcome {
        let handle = {
            let mut pending = lock(&self.pending);
            match pending.as_ref() {
                Some(in_flight) => in_flight.handle.clone(),
                None => self.start(&mut pending),
            }
        };
        handle.await
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Number of calls issued to the refresh endpoint so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn start(&self, slot: &mut Option<PendingRefresh>) -> SharedRefresh {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let epoch = self.session.epoch();
        let transport = self.transport.clone();
        let session = self.session.clone();
        let pending = self.pending.clone();
        let refresh_calls = self.refresh_calls.clone();

        let handle = async move {
            refresh_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = run_refresh(transport.as_ref(), &session, epoch).await;

            let mut slot = lock(&pending);
            if slot.as_ref().is_some_and(|p| p.id == id) {
                *slot = None;
            }
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(PendingRefresh {
            id,
            handle: handle.clone(),
        });
        handle
    }
}

async fn run_refresh(transport: &dyn Transport, session: &SessionState, epoch: u64) -> RefreshOutcome {
    info!("refreshing session credential");
    let request = ApiRequest::post(REFRESH_PATH).kind(RequestKind::Refresh);

    let result = match transport.execute(&request, None).await {
        Ok(response) if response.is_success() => response
            .json::<TokenResponse>()
            .map_err(|e| ApiError::from(e).to_string())
            .and_then(|token| {
                token
                    .credential()
                    .ok_or_else(|| "refresh response carried no access token".to_string())
            }),
        Ok(response) => Err(ApiError::from_response(&response).user_message()),
        Err(e) => Err(ApiError::from(e).to_string()),
    };

    match result {
        Ok(credential) => {
            if session.set_if_epoch(epoch, credential.clone()) {
                info!("session credential refreshed");
                RefreshOutcome::Refreshed(credential)
            } else {
                warn!("session changed while refreshing, discarding refreshed credential");
                RefreshOutcome::Failed("session changed while refreshing".to_string())
            }
        }
        Err(message) => {
            warn!(%message, "session refresh failed");
            session.clear_if_epoch(epoch);
            RefreshOutcome::Failed(message)
        }
    }
}
