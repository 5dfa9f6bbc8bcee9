use crate::domain_model::Credential;
use crate::domain_port::{CredentialTransition, SessionObserver};
use crate::logger::*;
use crate::session::lock;
use std::sync::{Mutex, Weak};
use tokio::sync::watch;

struct Inner {
    credential: Option<Credential>,
    epoch: u64,
}

/// Process-wide store of the current access credential.
///
/// Every committed change bumps the epoch and is published to the
/// synchronous observers first, then to `subscribe()` receivers.
pub struct SessionState {
    inner: Mutex<Inner>,
    observers: Mutex<Vec<Weak<dyn SessionObserver>>>,
    watch: watch::Sender<Option<Credential>>,
    published_epoch: Mutex<u64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (watch, _) = watch::channel(None);
        Self {
            inner: Mutex::new(Inner {
                credential: None,
                epoch: 0,
            }),
            observers: Mutex::new(Vec::new()),
            watch,
            published_epoch: Mutex::new(0),
        }
    }

    pub fn get(&self) -> Option<Credential> {
        lock(&self.inner).credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner).credential.is_some()
    }

    pub fn epoch(&self) -> u64 {
        lock(&self.inner).epoch
    }

    pub fn set(&self, credential: Credential) {
        self.commit(Some(credential), None);
    }

    pub fn clear(&self) {
        self.commit(None, None);
    }

    /// Commit `credential` only if no other change happened since `epoch`.
    pub fn set_if_epoch(&self, epoch: u64, credential: Credential) -> bool {
        self.commit(Some(credential), Some(epoch))
    }

    /// Clear only if no other change happened since `epoch`.
    pub fn clear_if_epoch(&self, epoch: u64) -> bool {
        self.commit(None, Some(epoch))
    }

    /// Clear only if the session still holds `credential`.
    pub fn clear_if_current(&self, credential: &Credential) -> bool {
        let epoch = {
            let inner = lock(&self.inner);
            if inner.credential.as_ref() != Some(credential) {
                return false;
            }
            inner.epoch
        };
        self.clear_if_epoch(epoch)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.watch.subscribe()
    }

    pub fn add_observer(&self, observer: Weak<dyn SessionObserver>) {
        lock(&self.observers).push(observer);
    }

    fn commit(&self, next: Option<Credential>, expected_epoch: Option<u64>) -> bool {
        let (epoch, transition, published) = {
            let mut inner = lock(&self.inner);
            if let Some(expected) = expected_epoch {
                if inner.epoch != expected {
                    return false;
                }
            }

            let transition = match (&inner.credential, &next) {
                (Some(current), Some(next)) if current == next => None,
                (None, Some(next)) => Some(CredentialTransition::Acquired(next.clone())),
                (Some(_), Some(next)) => Some(CredentialTransition::Replaced(next.clone())),
                (Some(_), None) => Some(CredentialTransition::Released),
                (None, None) => None,
            };
            let Some(transition) = transition else {
                return true;
            };

            inner.credential = next;
            inner.epoch += 1;
            (inner.epoch, transition, inner.credential.clone())
        };

        match &transition {
            CredentialTransition::Acquired(_) => info!(epoch, "session established"),
            CredentialTransition::Replaced(_) => debug!(epoch, "session credential rotated"),
            CredentialTransition::Released => info!(epoch, "session cleared"),
        }

        self.notify(epoch, &transition);
        self.publish(epoch, published);
        true
    }

    // Commits racing on different threads may get here out of order; the
    // watch only ever moves forward in epoch.
    fn publish(&self, epoch: u64, value: Option<Credential>) {
        let mut published_epoch = lock(&self.published_epoch);
        if epoch > *published_epoch {
            *published_epoch = epoch;
            self.watch.send_replace(value);
        }
    }

    fn notify(&self, epoch: u64, transition: &CredentialTransition) {
        let observers: Vec<_> = {
            let mut observers = lock(&self.observers);
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in observers {
            observer.on_transition(epoch, transition);
        }
    }
}
