use std::time::Duration;

use thiserror::Error;

/// Why a request was refused or rejected for lack of a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("session is logging out")]
    LoggedOut,
    #[error("no session token")]
    MissingToken,
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<String>,
    },
    #[error("auth error: {0}")]
    Auth(#[from] AuthFailure),
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool { matches!(self, ClientError::Auth(_)) }

    /// HTTP status that produced this error, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Auth(AuthFailure::Unauthorized { .. }) => Some(401),
            _ => None,
        }
    }

    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "network",
            ClientError::Api { .. } => "api",
            ClientError::Auth(_) => "auth",
            ClientError::Cancelled => "cancelled",
            ClientError::Timeout(_) => "timeout",
            ClientError::Validation(_) => "validation",
            ClientError::Decode(_) => "decode",
            ClientError::Storage(_) => "storage",
        }
    }
}

impl From<models::ModelError> for ClientError {
    fn from(e: models::ModelError) -> Self {
        match e {
            models::ModelError::Validation(msg) => ClientError::Validation(msg),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self { ClientError::Decode(e.to_string()) }
}
