use crate::domain_model::Identity;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStatus {
    /// No session, nothing to resolve.
    Anonymous,
    /// A session exists and its identity is being fetched.
    Loading,
    Resolved(Identity),
    /// The identity fetch failed while the session stayed valid.
    Degraded(String),
}

/// Holder of the authenticated identity projection.
pub struct IdentityState {
    tx: watch::Sender<IdentityStatus>,
}

impl Default for IdentityState {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(IdentityStatus::Anonymous);
        Self { tx }
    }

    pub fn status(&self) -> IdentityStatus {
        self.tx.borrow().clone()
    }

    /// The projection; empty unless resolved.
    pub fn get(&self) -> Identity {
        match &*self.tx.borrow() {
            IdentityStatus::Resolved(identity) => identity.clone(),
            _ => Identity::anonymous(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityStatus> {
        self.tx.subscribe()
    }

    pub(crate) fn set_loading(&self) {
        self.tx.send_replace(IdentityStatus::Loading);
    }

    pub(crate) fn set_resolved(&self, identity: Identity) {
        self.tx.send_replace(IdentityStatus::Resolved(identity));
    }

    pub(crate) fn set_degraded(&self, reason: String) {
        self.tx.send_replace(IdentityStatus::Degraded(reason));
    }

    pub(crate) fn clear(&self) {
        self.tx.send_replace(IdentityStatus::Anonymous);
    }
}
