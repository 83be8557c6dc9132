use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::observability::CANCELLED_TOTAL;

/// Cancellation handles for every request currently on the wire.
#[derive(Clone, Default)]
pub struct ActiveRequests {
    inner: Arc<DashMap<Uuid, CancellationToken>>,
}

/// Registration of one in-flight request. Dropping it removes the handle,
/// so every exit path of a request settles its entry.
pub struct InFlight {
    id: Uuid,
    token: CancellationToken,
    set: Arc<DashMap<Uuid, CancellationToken>>,
}

impl ActiveRequests {
    pub fn new() -> Self { Self::default() }

    pub fn register(&self) -> InFlight {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        self.inner.insert(id, token.clone());
        InFlight { id, token, set: Arc::clone(&self.inner) }
    }

    /// Cancel every tracked request and empty the set. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<Uuid> = self.inner.iter().map(|e| *e.key()).collect();
        let mut cancelled = 0;
        for id in ids {
            if let Some((_, token)) = self.inner.remove(&id) {
                token.cancel();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            CANCELLED_TOTAL.inc_by(cancelled as u64);
            debug!(cancelled, "cancelled in-flight requests");
        }
        cancelled
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

impl InFlight {
    pub fn id(&self) -> Uuid { self.id }

    pub fn token(&self) -> &CancellationToken { &self.token }

    /// Abort this request through the same path `cancel_all` uses.
    pub fn cancel(&self) {
        self.token.cancel();
        self.set.remove(&self.id);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_all_on_empty_set_is_noop() {
        let active = ActiveRequests::new();
        assert_eq!(active.cancel_all(), 0);
        assert!(active.is_empty());
    }

    #[test]
    fn cancel_all_aborts_every_handle() {
        let active = ActiveRequests::new();
        let handles: Vec<InFlight> = (0..3).map(|_| active.register()).collect();
        assert_eq!(active.len(), 3);

        assert_eq!(active.cancel_all(), 3);
        assert!(active.is_empty());
        assert!(handles.iter().all(|h| h.token().is_cancelled()));
    }

    #[test]
    fn drop_removes_entry() {
        let active = ActiveRequests::new();
        let h = active.register();
        assert_eq!(active.len(), 1);
        drop(h);
        assert!(active.is_empty());
    }

    #[test]
    fn handles_are_never_reused() {
        let active = ActiveRequests::new();
        let a = active.register();
        let b = active.register();
        assert_ne!(a.id(), b.id());
    }
}
