//! `DeliveryClient`: one explicitly constructed object owning the token
//! store, the active-request set and the session, so independent clients
//! (e.g. one per test) never share state.

use std::sync::Arc;

use configs::{ApiConfig, AppConfig};
use tracing::info;

use crate::api::{AuthApi, NotificationsApi, OrdersApi, PaymentsApi};
use crate::errors::ClientError;
use crate::http::{ActiveRequests, Dispatcher};
use crate::session::{SessionController, SessionMonitor, TokenStore};
use crate::storage::{JsonMapStore, MemoryStorage, SessionStorage};

#[derive(Clone)]
pub struct DeliveryClient {
    dispatcher: Arc<Dispatcher>,
    session: SessionController,
    auth: AuthApi,
    orders: OrdersApi,
    payments: PaymentsApi,
    notifications: NotificationsApi,
}

impl DeliveryClient {
    /// Build from configuration: file-backed session when `storage.path` is
    /// set, in-memory otherwise. The stored session is restored.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ClientError> {
        let storage: Arc<dyn SessionStorage> = match cfg.storage.path.as_deref() {
            Some(path) => {
                common::env::ensure_parent_dir(path)
                    .await
                    .map_err(|e| ClientError::Storage(e.to_string()))?;
                JsonMapStore::<String, String>::new(path).await?
            }
            None => Arc::new(MemoryStorage::new()),
        };
        let client = Self::with_storage(&cfg.api, storage)?;
        let state = client.session.restore().await?;
        info!(base_url = %cfg.api.base_url, ?state, "delivery client ready");
        Ok(client)
    }

    pub fn with_storage(api: &ApiConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ClientError> {
        let tokens = TokenStore::new(storage);
        let active = ActiveRequests::new();
        let monitor = Arc::new(SessionMonitor::new(tokens.clone(), active.clone()));
        let dispatcher = Arc::new(Dispatcher::new(api, tokens.clone(), active, Arc::clone(&monitor))?);

        let auth = AuthApi::new(Arc::clone(&dispatcher));
        let session = SessionController::new(auth.clone(), tokens, monitor);
        Ok(Self {
            orders: OrdersApi::new(Arc::clone(&dispatcher)),
            payments: PaymentsApi::new(Arc::clone(&dispatcher)),
            notifications: NotificationsApi::new(Arc::clone(&dispatcher)),
            auth,
            session,
            dispatcher,
        })
    }

    /// In-memory client against `base_url` with default timeouts.
    pub fn in_memory(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let api = ApiConfig { base_url: base_url.into(), ..ApiConfig::default() };
        Self::with_storage(&api, Arc::new(MemoryStorage::new()))
    }

    pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }
    pub fn session(&self) -> &SessionController { &self.session }
    pub fn auth(&self) -> &AuthApi { &self.auth }
    pub fn orders(&self) -> &OrdersApi { &self.orders }
    pub fn payments(&self) -> &PaymentsApi { &self.payments }
    pub fn notifications(&self) -> &NotificationsApi { &self.notifications }

    pub fn cancel_all(&self) -> usize { self.dispatcher.cancel_all() }
}
