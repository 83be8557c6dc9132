//! Session lifecycle: durable token store, state machine and controller.

use models::Role;

pub mod controller;
pub mod monitor;
pub mod token_store;

pub use controller::SessionController;
pub use monitor::{SessionListener, SessionMonitor, SessionState, TeardownReason};
pub use token_store::TokenStore;

/// Authenticated session as seen by the host application.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub token: String,
    pub is_authenticated: bool,
}
