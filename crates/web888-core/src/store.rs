// ── Status store ──
//
// Holds the one `Status` a monitor owns and publishes a value copy after
// each merge: through a `watch` channel for async consumers and through
// registered observers for push-style consumers. One merge is applied
// under the channel's lock, so readers never see half a message; there is
// no atomicity across messages.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::watch;
use tracing::error;

use crate::model::{ConnectionMode, Status};

/// Error type observers may return.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Notified with the fresh status after every successful merge.
///
/// Errors and panics are caught and logged; they never reach the session.
pub trait StatusObserver: Send + Sync {
    fn on_update(&self, status: &Status) -> Result<(), ObserverError>;
}

impl<F> StatusObserver for F
where
    F: Fn(&Status) -> Result<(), ObserverError> + Send + Sync,
{
    fn on_update(&self, status: &Status) -> Result<(), ObserverError> {
        self(status)
    }
}

pub struct StatusStore {
    status: watch::Sender<Status>,
    observers: RwLock<Vec<Arc<dyn StatusObserver>>>,
}

impl std::fmt::Debug for StatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStore")
            .field("mode", &self.status.borrow().mode)
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl StatusStore {
    pub fn new(mode: ConnectionMode) -> Self {
        let (status, _) = watch::channel(Status::new(mode));
        Self {
            status,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Current status by value.
    pub fn snapshot(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().connected
    }

    pub fn mode(&self) -> ConnectionMode {
        self.status.borrow().mode
    }

    pub fn add_observer(&self, observer: Arc<dyn StatusObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Apply one merge. If `merge` reports a change, stamp `last_update`,
    /// wake subscribers and notify observers. Returns whether it changed.
    pub fn apply<F>(&self, merge: F) -> bool
    where
        F: FnOnce(&mut Status) -> bool,
    {
        let changed = self.status.send_if_modified(|status| {
            let changed = merge(status);
            if changed {
                status.last_update = Some(Utc::now());
            }
            changed
        });
        if changed {
            self.notify();
        }
        changed
    }

    pub fn set_connected(&self, connected: bool) {
        self.status.send_if_modified(|status| {
            let changed = status.connected != connected;
            status.connected = connected;
            changed
        });
    }

    pub fn set_mode(&self, mode: ConnectionMode) {
        self.status.send_if_modified(|status| {
            let changed = status.mode != mode;
            status.set_mode(mode);
            changed
        });
    }

    fn notify(&self) {
        let observers: Vec<Arc<dyn StatusObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if observers.is_empty() {
            return;
        }

        let status = self.snapshot();
        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_update(&status))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "status observer failed"),
                Err(_) => error!("status observer panicked"),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn unchanged_merge_does_not_stamp() {
        let store = StatusStore::new(ConnectionMode::Http);
        assert!(!store.apply(|_| false));
        assert_eq!(store.snapshot().last_update, None);

        assert!(store.apply(|s| {
            s.users = Some(2);
            true
        }));
        let status = store.snapshot();
        assert_eq!(status.users, Some(2));
        assert!(status.last_update.is_some());
    }

    #[test]
    fn failing_observers_are_isolated() {
        let store = StatusStore::new(ConnectionMode::Http);
        let calls = Arc::new(AtomicUsize::new(0));

        store.add_observer(Arc::new(|_: &Status| -> Result<(), ObserverError> {
            Err("sink offline".into())
        }));
        store.add_observer(Arc::new(|_: &Status| -> Result<(), ObserverError> {
            panic!("observer bug")
        }));
        let counter = Arc::clone(&calls);
        store.add_observer(Arc::new(move |s: &Status| -> Result<(), ObserverError> {
            assert_eq!(s.users, Some(1));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        store.apply(|s| {
            s.users = Some(1);
            true
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.observer_count(), 3);
    }

    #[tokio::test]
    async fn subscribers_see_merges() {
        let store = StatusStore::new(ConnectionMode::WebSocket);
        let mut rx = store.subscribe();

        store.apply(|s| {
            s.name = Some("Rx".into());
            true
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().name.as_deref(), Some("Rx"));
    }

    #[test]
    fn connected_flag() {
        let store = StatusStore::new(ConnectionMode::Http);
        store.set_connected(true);
        assert!(store.is_connected());
        store.set_connected(false);
        assert!(!store.is_connected());
    }
}
