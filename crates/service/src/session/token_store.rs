use std::sync::Arc;

use models::User;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::storage::SessionStorage;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const LOGGED_OUT_KEY: &str = "loggedOut";

const SET_SESSION_ATTEMPTS: usize = 2;

/// Single source of truth for the bearer credential and cached user profile.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SessionStorage>,
}

/// Strip a leading `Bearer ` so the header is never double-prefixed.
pub fn normalize_token(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self { Self { storage } }

    pub async fn get_token(&self) -> Result<Option<String>, ClientError> {
        let token = self.storage.get(TOKEN_KEY).await?;
        Ok(token.map(|t| normalize_token(&t).to_string()).filter(|t| !t.is_empty()))
    }

    /// Cached user record; an unparseable record reads as absent.
    pub async fn get_user(&self) -> Result<Option<User>, ClientError> {
        let Some(raw) = self.storage.get(USER_KEY).await? else { return Ok(None) };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "stored user record is not valid, ignoring");
                Ok(None)
            }
        }
    }

    /// Both values when a complete session is stored.
    pub async fn load(&self) -> Result<Option<(User, String)>, ClientError> {
        match (self.get_user().await?, self.get_token().await?) {
            (Some(user), Some(token)) => Ok(Some((user, token))),
            _ => Ok(None),
        }
    }

    /// Persist user and token together and lift any logged-out guard.
    /// On repeated failure the keys are removed so no half session remains.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use models::{Role, User};
    /// use service::session::TokenStore;
    /// use service::storage::MemoryStorage;
    ///
    /// let store = TokenStore::new(Arc::new(MemoryStorage::new()));
    /// let user = User { id: "2".into(), role: Role::Client, name: None, email: None, phone: None };
    /// tokio_test::block_on(store.set_session(&user, "Bearer abc")).unwrap();
    /// assert_eq!(tokio_test::block_on(store.get_token()).unwrap().as_deref(), Some("abc"));
    /// ```
    pub async fn set_session(&self, user: &User, token: &str) -> Result<(), ClientError> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Err(ClientError::Validation("session token is empty".into()));
        }
        let user_json = serde_json::to_string(user)?;

        let mut last_err = None;
        for attempt in 1..=SET_SESSION_ATTEMPTS {
            let entries = vec![
                (TOKEN_KEY.to_string(), token.to_string()),
                (USER_KEY.to_string(), user_json.clone()),
            ];
            match self.storage.set_many(entries).await {
                Ok(()) => {
                    self.storage.remove_many(&[LOGGED_OUT_KEY]).await?;
                    debug!(user_id = %user.id, role = %user.role, "session stored");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "failed to store session");
                    last_err = Some(e);
                }
            }
        }

        if let Err(e) = self.storage.remove_many(&[TOKEN_KEY, USER_KEY]).await {
            warn!(error = %e, "failed to roll back partial session");
        }
        Err(last_err.unwrap_or_else(|| ClientError::Storage("session not stored".into())))
    }

    /// Replace only the cached user record, keeping the token.
    pub async fn update_user(&self, user: &User) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set_many(vec![(USER_KEY.to_string(), user_json)]).await
    }

    pub async fn clear_session(&self) -> Result<(), ClientError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY, LOGGED_OUT_KEY]).await
    }

    pub async fn mark_logged_out(&self) -> Result<(), ClientError> {
        self.storage.set_many(vec![(LOGGED_OUT_KEY.to_string(), "true".to_string())]).await
    }

    pub async fn is_logged_out(&self) -> Result<bool, ClientError> {
        Ok(self.storage.get(LOGGED_OUT_KEY).await?.as_deref() == Some("true"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use models::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> User {
        User { id: "2".into(), role: Role::Client, name: None, email: None, phone: None }
    }

    fn store() -> (TokenStore, Arc<MemoryStorage>) {
        let mem = Arc::new(MemoryStorage::new());
        (TokenStore::new(mem.clone()), mem)
    }

    #[tokio::test]
    async fn set_then_get_then_clear_round_trips() -> Result<(), ClientError> {
        let (store, _) = store();
        store.set_session(&user(), "abc").await?;
        assert_eq!(store.get_token().await?.as_deref(), Some("abc"));
        assert_eq!(store.get_user().await?, Some(user()));

        store.clear_session().await?;
        assert_eq!(store.get_token().await?, None);
        assert_eq!(store.get_user().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn clear_session_is_idempotent() -> Result<(), ClientError> {
        let (store, mem) = store();
        store.set_session(&user(), "abc").await?;
        store.mark_logged_out().await?;
        store.clear_session().await?;
        store.clear_session().await?;
        assert!(mem.is_empty().await);
        assert!(!store.is_logged_out().await?);
        Ok(())
    }

    #[tokio::test]
    async fn bearer_prefix_is_stripped_on_store() -> Result<(), ClientError> {
        let (store, _) = store();
        store.set_session(&user(), "Bearer abc").await?;
        assert_eq!(store.get_token().await?.as_deref(), Some("abc"));
        Ok(())
    }

    #[tokio::test]
    async fn new_session_lifts_logged_out_guard() -> Result<(), ClientError> {
        let (store, _) = store();
        store.mark_logged_out().await?;
        assert!(store.is_logged_out().await?);
        store.set_session(&user(), "abc").await?;
        assert!(!store.is_logged_out().await?);
        Ok(())
    }

    #[test]
    fn normalize_handles_case_and_spacing() {
        assert_eq!(normalize_token("bearer  xyz"), "xyz");
        assert_eq!(normalize_token(" xyz "), "xyz");
        assert_eq!(normalize_token("Bear"), "Bear");
    }

    /// Fails the first `failures` writes.
    struct FlakyStorage {
        inner: MemoryStorage,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl SessionStorage for FlakyStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, ClientError> { self.inner.get(key).await }

        async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), ClientError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(ClientError::Storage("disk full".into()));
            }
            self.inner.set_many(entries).await
        }

        async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> { self.inner.remove_many(keys).await }
    }

    #[tokio::test]
    async fn set_session_retries_once() -> Result<(), ClientError> {
        let flaky = Arc::new(FlakyStorage { inner: MemoryStorage::new(), failures: AtomicUsize::new(1) });
        let store = TokenStore::new(flaky);
        store.set_session(&user(), "abc").await?;
        assert_eq!(store.get_token().await?.as_deref(), Some("abc"));
        Ok(())
    }

    #[tokio::test]
    async fn set_session_leaves_nothing_behind_when_retries_fail() -> Result<(), ClientError> {
        let flaky = Arc::new(FlakyStorage { inner: MemoryStorage::new(), failures: AtomicUsize::new(5) });
        let store = TokenStore::new(flaky.clone());
        let err = store.set_session(&user(), "abc").await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert!(flaky.inner.is_empty().await);
        Ok(())
    }
}
