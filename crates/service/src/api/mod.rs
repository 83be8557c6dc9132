//! Typed endpoint wrappers: one dispatcher call per domain operation.
//!
//! Wrappers check the minimal shape of their arguments, pick the method and
//! path, and decode `data` into the domain type. They never touch the token
//! store; session changes belong to [`crate::session::SessionController`].

use models::ApiResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ClientError;

pub mod auth;
pub mod notifications;
pub mod orders;
pub mod payments;

pub use auth::{AuthApi, AuthSession};
pub use notifications::NotificationsApi;
pub use orders::OrdersApi;
pub use payments::PaymentsApi;

pub(crate) fn unwrap_data<T: DeserializeOwned>(resp: ApiResponse<Value>) -> Result<T, ClientError> {
    let resp: ApiResponse<T> = resp.decode()?;
    Ok(resp.into_data()?)
}
