//! Session state machine shared by the dispatcher and the controller.
//!
//! Transitions go through `watch::Sender::send_if_modified`, so a check and
//! its state change happen under one lock. That is what collapses
//! concurrent teardown triggers (two simultaneous 401s) into one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::token_store::TokenStore;
use crate::http::active::ActiveRequests;
use crate::observability::SESSION_TEARDOWNS_TOTAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
    LoggingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The user asked to sign out.
    Logout,
    /// The backend rejected the credential (HTTP 401).
    Expired,
}

/// Host hook run once at the end of every teardown, typically to navigate
/// to the login screen.
pub trait SessionListener: Send + Sync {
    fn on_teardown(&self, reason: TeardownReason);
}

impl<F> SessionListener for F
where
    F: Fn(TeardownReason) + Send + Sync,
{
    fn on_teardown(&self, reason: TeardownReason) { self(reason) }
}

pub struct SessionMonitor {
    state: watch::Sender<SessionState>,
    listeners: ArcSwap<Vec<Arc<dyn SessionListener>>>,
    tokens: TokenStore,
    active: ActiveRequests,
}

impl SessionMonitor {
    pub fn new(tokens: TokenStore, active: ActiveRequests) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self { state, listeners: ArcSwap::from_pointee(Vec::new()), tokens, active }
    }

    pub fn state(&self) -> SessionState { *self.state.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.state.subscribe() }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&listener));
            next
        });
    }

    /// Move `from` → `to` atomically; false when the current state is not `from`.
    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        let moved = self.state.send_if_modified(|s| {
            if *s == from {
                *s = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!(?from, ?to, "session state changed");
        }
        moved
    }

    pub(crate) fn begin_login(&self) -> bool {
        self.transition(SessionState::Anonymous, SessionState::Authenticating)
    }

    pub(crate) fn finish_login(&self, ok: bool) {
        let to = if ok { SessionState::Authenticated } else { SessionState::Anonymous };
        self.transition(SessionState::Authenticating, to);
    }

    /// Adopt a session found in storage at startup.
    pub(crate) fn resume(&self) -> bool {
        self.transition(SessionState::Anonymous, SessionState::Authenticated)
    }

    /// Claim the teardown. Only the caller that gets `true` may call
    /// [`Self::finish_teardown`]; everyone else is already covered.
    pub(crate) async fn begin_teardown(&self) -> bool {
        if !self.transition(SessionState::Authenticated, SessionState::LoggingOut) {
            return false;
        }
        if let Err(e) = self.tokens.mark_logged_out().await {
            warn!(error = %e, "failed to persist logged-out guard");
        }
        self.active.cancel_all();
        true
    }

    pub(crate) async fn finish_teardown(&self, reason: TeardownReason) {
        self.active.cancel_all();
        if let Err(e) = self.tokens.clear_session().await {
            warn!(error = %e, "failed to clear stored session");
        }
        self.transition(SessionState::LoggingOut, SessionState::Anonymous);
        SESSION_TEARDOWNS_TOTAL.inc();
        info!(?reason, "session ended");

        let listeners = self.listeners.load();
        for listener in listeners.iter() {
            listener.on_teardown(reason);
        }
    }

    /// Tear the session down after an authorization failure. Returns whether
    /// this call performed the teardown.
    ///
    /// Without an authenticated session there is nobody to notify, but a
    /// stale token may still sit in storage and is cleared anyway.
    pub async fn expire(&self) -> bool {
        if !self.begin_teardown().await {
            if self.state() == SessionState::Anonymous {
                if let Err(e) = self.tokens.clear_session().await {
                    warn!(error = %e, "failed to clear stored session");
                }
            }
            return false;
        }
        self.finish_teardown(TeardownReason::Expired).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SessionStorage};
    use models::{Role, User};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn authenticated() -> (Arc<SessionMonitor>, TokenStore, ActiveRequests) {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        let user = User { id: "7".into(), role: Role::Driver, name: None, email: None, phone: None };
        tokens.set_session(&user, "tok").await.unwrap();
        let active = ActiveRequests::new();
        let monitor = Arc::new(SessionMonitor::new(tokens.clone(), active.clone()));
        assert!(monitor.resume());
        (monitor, tokens, active)
    }

    #[tokio::test]
    async fn expire_clears_store_and_notifies_once() {
        let (monitor, tokens, _) = authenticated().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        monitor.add_listener(Arc::new(move |reason: TeardownReason| {
            assert_eq!(reason, TeardownReason::Expired);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let (a, b, c) = tokio::join!(monitor.expire(), monitor.expire(), monitor.expire());
        assert_eq!([a, b, c].iter().filter(|won| **won).count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.state(), SessionState::Anonymous);
        assert_eq!(tokens.get_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn expire_while_anonymous_clears_stale_token_without_notifying() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_many(vec![("token".into(), "stale".into())]).await.unwrap();
        let tokens = TokenStore::new(storage.clone());
        let monitor = SessionMonitor::new(tokens, ActiveRequests::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        monitor.add_listener(Arc::new(move |_: TeardownReason| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!monitor.expire().await);
        assert_eq!(monitor.state(), SessionState::Anonymous);
        assert_eq!(storage.get("token").await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn teardown_cancels_in_flight_requests() {
        let (monitor, _, active) = authenticated().await;
        let pending = active.register();
        assert!(monitor.begin_teardown().await);
        assert!(pending.token().is_cancelled());
        assert!(active.is_empty());
        assert_eq!(monitor.state(), SessionState::LoggingOut);
    }

    #[tokio::test]
    async fn failed_login_returns_to_anonymous() {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        let monitor = SessionMonitor::new(tokens, ActiveRequests::new());
        let mut rx = monitor.subscribe();
        assert!(monitor.begin_login());
        assert!(!monitor.begin_login());
        monitor.finish_login(false);
        assert_eq!(monitor.state(), SessionState::Anonymous);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    }
}
