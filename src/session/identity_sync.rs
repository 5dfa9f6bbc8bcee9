use crate::application_port::AccountService;
use crate::domain_model::Identity;
use crate::domain_port::{CredentialTransition, SessionObserver};
use crate::logger::*;
use crate::session::{IdentityState, IdentityStatus, lock};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex};

type SharedFetch = Shared<BoxFuture<'static, ()>>;

struct SyncState {
    last_epoch: u64,
    generation: u64,
    pending: Option<SharedFetch>,
}

/// Keeps the identity projection in step with the session credential.
///
/// Each absent->present transition opens a new generation with at most one
/// identity fetch; a fetch whose generation is no longer current is
/// discarded, so a fast logout/login cannot apply a stale profile.
pub struct IdentitySync {
    identity: Arc<IdentityState>,
    account: Arc<dyn AccountService>,
    state: Arc<Mutex<SyncState>>,
}

impl IdentitySync {
    pub fn new(identity: Arc<IdentityState>, account: Arc<dyn AccountService>) -> Self {
        Self {
            identity,
            account,
            state: Arc::new(Mutex::new(SyncState {
                last_epoch: 0,
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Wait for the current identity fetch, if any, and return the status.
    pub async fn hydrate(&self) -> IdentityStatus {
        let pending = lock(&self.state).pending.clone();
        if let Some(fetch) = pending {
            fetch.await;
        }
        self.identity.status()
    }

    /// Refetch the identity of the current session, e.g. after a profile
    /// update. Does nothing while anonymous.
    pub fn resync(&self) {
        let mut state = lock(&self.state);
        if self.identity.status() == IdentityStatus::Anonymous {
            return;
        }
        self.begin_fetch(&mut state);
    }

    fn begin_fetch(&self, state: &mut SyncState) {
        state.generation += 1;
        self.identity.set_loading();

        let fetch = fetch_identity(
            state.generation,
            self.account.clone(),
            self.identity.clone(),
            self.state.clone(),
        );
        state.pending = Some(fetch.clone());

        // Outside a runtime the fetch runs when someone awaits `hydrate`.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(fetch);
        }
    }
}

fn fetch_identity(
    generation: u64,
    account: Arc<dyn AccountService>,
    identity: Arc<IdentityState>,
    state: Arc<Mutex<SyncState>>,
) -> SharedFetch {
    async move {
        debug!(generation, "fetching identity");
        let result = account.me().await;

        let mut state = lock(&state);
        if state.generation != generation {
            debug!(generation, "discarding identity for superseded session");
            return;
        }
        state.pending = None;

        match result {
            Ok(profile) => {
                info!(user_id = %profile.user_id, role = %profile.user_type, "identity resolved");
                identity.set_resolved(Identity::from(&profile));
            }
            Err(e) => {
                warn!(error = %e, "identity fetch failed");
                identity.set_degraded(e.user_message());
            }
        }
    }
    .boxed()
    .shared()
}

impl SessionObserver for IdentitySync {
    fn on_transition(&self, epoch: u64, transition: &CredentialTransition) {
        let mut state = lock(&self.state);
        if epoch <= state.last_epoch {
            return;
        }
        state.last_epoch = epoch;

        match transition {
            CredentialTransition::Acquired(_) => self.begin_fetch(&mut state),
            CredentialTransition::Replaced(_) => {}
            CredentialTransition::Released => {
                state.generation += 1;
                state.pending = None;
                self.identity.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_port::{ApiError, MessageResponse, UpdateProfileInput};
    use crate::domain_model::{Credential, Role, UserId, UserProfile};
    use crate::session::SessionState;
    use std::sync::Weak;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct FakeAccount {
        calls: AtomicU64,
        fail: bool,
        delay: Duration,
    }

    impl FakeAccount {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU64::new(0),
                fail,
                delay: Duration::from_millis(10),
            })
        }
    }

    #[async_trait::async_trait]
    impl AccountService for FakeAccount {
        async fn me(&self) -> Result<UserProfile, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ApiError::Network("connection reset".into()));
            }
            Ok(UserProfile {
                user_id: UserId(uuid::Uuid::from_u128(call as u128 + 1)),
                email: "ada@example.com".into(),
                user_type: Role::Recruiter,
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                company_id: None,
            })
        }

        async fn update_me(&self, _: UpdateProfileInput) -> Result<MessageResponse, ApiError> {
            Ok(MessageResponse {
                message: "ok".into(),
            })
        }
    }

    fn wired(account: Arc<FakeAccount>) -> (Arc<SessionState>, Arc<IdentityState>, Arc<IdentitySync>) {
        let session = Arc::new(SessionState::new());
        let identity = Arc::new(IdentityState::new());
        let sync = Arc::new(IdentitySync::new(identity.clone(), account));
        let weak: Weak<IdentitySync> = Arc::downgrade(&sync);
        session.add_observer(weak);
        (session, identity, sync)
    }

    #[tokio::test]
    async fn acquiring_a_session_fetches_identity() {
        let account = FakeAccount::new(false);
        let (session, identity, sync) = wired(account.clone());

        session.set(Credential::new("t1"));
        assert_eq!(identity.status(), IdentityStatus::Loading);

        let status = sync.hydrate().await;
        assert!(matches!(status, IdentityStatus::Resolved(_)));
        assert_eq!(identity.get().role, Some(Role::Recruiter));
        assert_eq!(account.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_clears_identity_synchronously() {
        let account = FakeAccount::new(false);
        let (session, identity, sync) = wired(account);

        session.set(Credential::new("t1"));
        sync.hydrate().await;
        assert!(identity.get().is_resolved());

        session.clear();
        assert_eq!(identity.status(), IdentityStatus::Anonymous);
        assert_eq!(identity.get(), Identity::anonymous());
    }

    #[tokio::test]
    async fn rotation_and_repeats_do_not_refetch() {
        let account = FakeAccount::new(false);
        let (session, _identity, sync) = wired(account.clone());

        session.set(Credential::new("t1"));
        session.set(Credential::new("t1"));
        sync.hydrate().await;
        session.set(Credential::new("t2"));
        sync.hydrate().await;

        assert_eq!(account.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_degrades_without_logging_out() {
        let account = FakeAccount::new(true);
        let (session, identity, sync) = wired(account);

        session.set(Credential::new("t1"));
        let status = sync.hydrate().await;

        assert!(matches!(status, IdentityStatus::Degraded(_)));
        assert_eq!(identity.get(), Identity::anonymous());
        assert!(session.get().is_some());
    }

    #[tokio::test]
    async fn stale_fetch_is_discarded_after_logout() {
        let account = FakeAccount::new(false);
        let (session, identity, _sync) = wired(account);

        session.set(Credential::new("t1"));
        session.clear();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(identity.status(), IdentityStatus::Anonymous);
    }

    #[tokio::test]
    async fn relogin_applies_only_latest_fetch() {
        let account = FakeAccount::new(false);
        let (session, identity, sync) = wired(account.clone());

        session.set(Credential::new("t1"));
        while account.calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        session.clear();
        session.set(Credential::new("t2"));
        sync.hydrate().await;
        // Let the first, superseded fetch finish too.
        tokio::time::sleep(Duration::from_millis(30)).await;

        // The second fetch produced user id 2.
        assert_eq!(identity.get().id, Some(UserId(uuid::Uuid::from_u128(2))));
        assert_eq!(account.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn outside_runtime_fetch_waits_for_hydrate() {
        let account = FakeAccount::new(false);
        let (session, identity, sync) = wired(account.clone());

        session.set(Credential::new("t1"));
        assert_eq!(account.calls.load(Ordering::SeqCst), 0);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(sync.hydrate());
        assert!(identity.get().is_resolved());
    }
}
