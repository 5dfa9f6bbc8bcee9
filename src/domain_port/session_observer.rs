use crate::domain_model::Credential;

/// A committed change of the session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialTransition {
    /// absent -> present
    Acquired(Credential),
    /// present -> a different present value (token rotation)
    Replaced(Credential),
    /// present -> absent
    Released,
}

/// Synchronous observer of session credential changes.
///
/// Called after the new value is committed and before the mutating call
/// returns, so no reader can see the new credential without the observer
/// having reacted to it. `epoch` is the session epoch produced by this
/// commit; it grows with every commit, so observers can drop notifications
/// that arrive out of order. Implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn on_transition(&self, epoch: u64, transition: &CredentialTransition);
}
