use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the token when one exists.
    Optional,
    /// Fail with `MissingToken` before sending when no token exists.
    Required,
}

/// One call to the backend, built by the endpoint wrappers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: Option<Value>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) auth: AuthMode,
    pub(crate) timeout: Option<Duration>,
    pub(crate) allow_when_logged_out: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            auth: AuthMode::Optional,
            timeout: None,
            allow_when_logged_out: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(Method::GET, path) }
    pub fn post(path: impl Into<String>) -> Self { Self::new(Method::POST, path) }
    pub fn put(path: impl Into<String>) -> Self { Self::new(Method::PUT, path) }
    pub fn patch(path: impl Into<String>) -> Self { Self::new(Method::PATCH, path) }
    pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::DELETE, path) }

    pub fn authenticated(mut self) -> Self {
        self.auth = AuthMode::Required;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json<T: Serialize>(self, body: &T) -> Result<Self, ClientError> {
        Ok(self.body(serde_json::to_value(body)?))
    }

    /// Caller headers win over the defaults; `Authorization` is only replaced
    /// when set here explicitly.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Let the request through while the logged-out guard is set. Used by
    /// the login and logout flows only.
    pub(crate) fn allow_when_logged_out(mut self) -> Self {
        self.allow_when_logged_out = true;
        self
    }

    pub fn method(&self) -> &Method { &self.method }

    pub fn path(&self) -> &str { &self.path }
}

/// Validate an id before splicing it into a path.
pub(crate) fn segment<'a>(field: &str, value: &'a str) -> Result<&'a str, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::Validation(format!("{field} is required")));
    }
    if value.contains(['/', '?', '#']) {
        return Err(ClientError::Validation(format!("{field} contains reserved characters")));
    }
    Ok(value)
}
