//! HTTP API gateway client for the delivery backend.
//! - `storage` + `session::TokenStore` keep the bearer token and user record.
//! - `http::Dispatcher` performs each call with shared headers, cancellation and error rules.
//! - `session::SessionController` drives login/logout and expiry teardown.
//! - `api` holds the typed endpoint wrappers.

pub mod api;
pub mod client;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;
pub mod storage;

pub use client::DeliveryClient;
pub use errors::{AuthFailure, ClientError};
pub use session::{Session, SessionListener, SessionState, TeardownReason};
