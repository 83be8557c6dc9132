use std::sync::Arc;

use models::{LoginInput, RegisterInput, User};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::monitor::{SessionListener, SessionMonitor, SessionState, TeardownReason};
use super::token_store::TokenStore;
use super::Session;
use crate::api::{AuthApi, AuthSession};
use crate::errors::ClientError;

/// Orchestrates login, registration, logout and startup restore.
#[derive(Clone)]
pub struct SessionController {
    auth: AuthApi,
    tokens: TokenStore,
    monitor: Arc<SessionMonitor>,
}

impl SessionController {
    pub fn new(auth: AuthApi, tokens: TokenStore, monitor: Arc<SessionMonitor>) -> Self {
        Self { auth, tokens, monitor }
    }

    pub fn state(&self) -> SessionState { self.monitor.state() }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.monitor.subscribe() }

    /// Register a hook run once per teardown (logout or expiry).
    pub fn on_teardown(&self, listener: Arc<dyn SessionListener>) { self.monitor.add_listener(listener) }

    pub async fn current_user(&self) -> Result<Option<User>, ClientError> { self.tokens.get_user().await }

    /// Snapshot of the current session, if authenticated.
    pub async fn session(&self) -> Result<Option<Session>, ClientError> {
        if self.state() != SessionState::Authenticated {
            return Ok(None);
        }
        Ok(self.tokens.load().await?.map(|(user, token)| Session {
            user_id: user.id,
            role: user.role,
            token,
            is_authenticated: true,
        }))
    }

    /// Pick up where a previous process left off. A persisted logged-out
    /// guard means a teardown was interrupted, so it is finished here.
    pub async fn restore(&self) -> Result<SessionState, ClientError> {
        if self.tokens.is_logged_out().await? {
            info!("finishing interrupted logout");
            self.tokens.clear_session().await?;
            return Ok(self.state());
        }
        match self.tokens.load().await? {
            Some((user, _)) => {
                if self.monitor.resume() {
                    info!(user_id = %user.id, role = %user.role, "session restored");
                }
            }
            None => debug!("no stored session"),
        }
        Ok(self.state())
    }

    #[instrument(skip(self, input), fields(identifier = %input.identifier))]
    pub async fn login(&self, input: &LoginInput) -> Result<User, ClientError> {
        input.validate()?;
        self.authenticate(self.auth.login(input)).await
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: &RegisterInput) -> Result<User, ClientError> {
        input.validate()?;
        self.authenticate(self.auth.register(input)).await
    }

    async fn authenticate<F>(&self, call: F) -> Result<User, ClientError>
    where
        F: std::future::Future<Output = Result<AuthSession, ClientError>>,
    {
        if !self.monitor.begin_login() {
            return Err(ClientError::Validation(format!("cannot sign in while {:?}", self.state())));
        }
        let result = match call.await {
            Ok(session) => self.tokens.set_session(&session.user, &session.token).await.map(|_| session.user),
            Err(e) => Err(e),
        };
        self.monitor.finish_login(result.is_ok());
        match &result {
            Ok(user) => info!(user_id = %user.id, role = %user.role, "signed in"),
            Err(e) => warn!(error = %e, "sign-in failed"),
        }
        result
    }

    /// Re-read the profile from `/api/auth/me` and cache it.
    pub async fn refresh_user(&self) -> Result<User, ClientError> {
        let user = self.auth.me().await?;
        self.tokens.update_user(&user).await?;
        Ok(user)
    }

    /// Sign out. The backend call is best effort; local state is always
    /// cleared. Concurrent calls (or a racing 401) collapse into one teardown.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if !self.monitor.begin_teardown().await {
            if self.state() == SessionState::Anonymous {
                self.tokens.clear_session().await?;
            }
            debug!("no session to log out");
            return Ok(());
        }
        if let Err(e) = self.auth.logout().await {
            warn!(error = %e, "backend logout failed, clearing local session anyway");
        }
        self.monitor.finish_teardown(TeardownReason::Logout).await;
        Ok(())
    }
}
