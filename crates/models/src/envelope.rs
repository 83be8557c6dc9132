//! Response envelope shared by every backend endpoint.
//!
//! Some endpoints answer with `{status, data, message}`, others with a bare
//! JSON document. The dispatcher normalizes both into [`ApiResponse`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Fail,
}

impl ResponseStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { status: ResponseStatus::Success, data: Some(data), message: None, token: None }
    }

    pub fn failure(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self { status, data: None, message: Some(message.into()), token: None }
    }

    pub fn is_success(&self) -> bool { self.status == ResponseStatus::Success }
}

impl ApiResponse<Value> {
    /// Read `body` as an envelope when its `status` field is one of the
    /// envelope markers. Anything else is returned untouched in `Err`.
    pub fn from_envelope(body: Value) -> Result<Self, Value> {
        let marker = body
            .as_object()
            .and_then(|obj| obj.get("status"))
            .and_then(Value::as_str)
            .and_then(ResponseStatus::parse);
        let Some(status) = marker else { return Err(body) };

        let mut obj = match body {
            Value::Object(obj) => obj,
            other => return Err(other),
        };
        let data = obj.remove("data").filter(|d| !d.is_null());
        let message = obj.remove("message").and_then(|m| m.as_str().map(str::to_owned));
        let token = obj.remove("token").and_then(|t| t.as_str().map(str::to_owned));
        Ok(Self { status, data, message, token })
    }

    /// Decode `data` into the caller's domain type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        let data = match self.data {
            Some(v) => Some(serde_json::from_value(v)?),
            None => None,
        };
        Ok(ApiResponse { status: self.status, data, message: self.message, token: self.token })
    }
}

impl<T> ApiResponse<T> {
    /// Take the payload of a success envelope.
    pub fn into_data(self) -> Result<T, ModelError> {
        match (self.status, self.data) {
            (ResponseStatus::Success, Some(data)) => Ok(data),
            (ResponseStatus::Success, None) => Err(ModelError::Validation("success response without data".into())),
            (_, _) => Err(ModelError::Validation(self.message.unwrap_or_else(|| "request failed".into()))),
        }
    }
}
