//! The authenticated session pipeline: credential state, single-flight
//! refresh, request dispatch with retry-once, identity hydration and route
//! guarding.

mod dispatcher;
mod identity_state;
mod identity_sync;
mod refresh_coordinator;
mod route_guard;
mod session_state;

pub use dispatcher::*;
pub use identity_state::*;
pub use identity_sync::*;
pub use refresh_coordinator::*;
pub use route_guard::*;
pub use session_state::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Critical sections here never panic midway, so a poisoned lock still
// holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
