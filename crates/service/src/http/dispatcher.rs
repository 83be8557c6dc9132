//! Request Dispatcher: one HTTP call with the cross-cutting behaviour every
//! endpoint shares (guard check, headers, cancellation, timeout, envelope
//! normalization and error classification).

use std::sync::Arc;
use std::time::{Duration, Instant};

use configs::ApiConfig;
use models::{ApiResponse, ResponseStatus};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::active::ActiveRequests;
use super::request::{ApiRequest, AuthMode};
use crate::errors::{AuthFailure, ClientError};
use crate::observability::{REQUESTS_TOTAL, REQUEST_DURATION, REQUEST_ERRORS_TOTAL};
use crate::session::monitor::SessionMonitor;
use crate::session::token_store::TokenStore;

/// Status line, content type and body of a settled response.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    content_type: Option<String>,
    body: String,
}

enum Outcome {
    Settled(Result<RawResponse, ClientError>),
    Cancelled,
    TimedOut,
}

pub struct Dispatcher {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: TokenStore,
    active: ActiveRequests,
    session: Arc<SessionMonitor>,
}

impl Dispatcher {
    pub fn new(
        cfg: &ApiConfig,
        tokens: TokenStore,
        active: ActiveRequests,
        session: Arc<SessionMonitor>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            timeout: cfg.timeout(),
            tokens,
            active,
            session,
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub fn default_timeout(&self) -> Duration { self.timeout }

    /// Cancel every in-flight request. Safe with nothing in flight.
    pub fn cancel_all(&self) -> usize { self.active.cancel_all() }

    pub fn in_flight(&self) -> usize { self.active.len() }

    /// `dispatch(method, path, body?, headers?)`: token attached when present.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse<Value>, ClientError> {
        let mut req = ApiRequest::new(method, path);
        req.body = body;
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.send(req).await
    }

    #[instrument(skip(self, req), fields(method = %req.method, path = %req.path))]
    pub async fn send(&self, req: ApiRequest) -> Result<ApiResponse<Value>, ClientError> {
        REQUESTS_TOTAL.inc();
        let started = Instant::now();
        let result = self.execute(req).await;
        REQUEST_DURATION.observe(started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            REQUEST_ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
            debug!(error = %e, kind = e.kind(), "request failed");
        }
        result
    }

    async fn execute(&self, req: ApiRequest) -> Result<ApiResponse<Value>, ClientError> {
        if !req.allow_when_logged_out && self.tokens.is_logged_out().await? {
            warn!("request refused while session is logging out");
            self.session.expire().await;
            return Err(AuthFailure::LoggedOut.into());
        }

        let token = self.tokens.get_token().await?;
        if req.auth == AuthMode::Required && token.is_none() {
            return Err(AuthFailure::MissingToken.into());
        }

        let headers = build_headers(token.as_deref(), &req.headers)?;
        let mut builder = self.http.request(req.method.clone(), self.url(&req.path)).headers(headers);
        if let Some(body) = &req.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let timeout = req.timeout.unwrap_or(self.timeout);
        let inflight = self.active.register();
        let request_id = inflight.id();
        debug!(%request_id, "request sent");

        let outcome = tokio::select! {
            biased;
            _ = inflight.token().cancelled() => Outcome::Cancelled,
            res = read_response(builder) => Outcome::Settled(res),
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
        };
        if matches!(outcome, Outcome::TimedOut) {
            inflight.cancel();
        }
        drop(inflight);

        let raw = match outcome {
            Outcome::Settled(res) => res?,
            Outcome::Cancelled => {
                debug!(%request_id, "request cancelled");
                return Err(ClientError::Cancelled);
            }
            Outcome::TimedOut => {
                warn!(%request_id, ?timeout, "request timed out");
                crate::observability::CANCELLED_TOTAL.inc();
                return Err(ClientError::Timeout(timeout));
            }
        };
        debug!(%request_id, status = raw.status, "response received");

        self.classify(raw).await
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn classify(&self, raw: RawResponse) -> Result<ApiResponse<Value>, ClientError> {
        let RawResponse { status, content_type, body } = raw;
        let success = (200..300).contains(&status);

        if status == 401 {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| server_message(&v))
                .unwrap_or_else(|| "Unauthorized".to_string());
            warn!(%message, "backend rejected the session");
            self.session.expire().await;
            return Err(AuthFailure::Unauthorized { message }.into());
        }

        if success && body.trim().is_empty() {
            return Ok(ApiResponse::success(Value::Null));
        }

        if !content_type.as_deref().is_some_and(is_json) {
            return Err(ClientError::Api { status, message: "non-JSON response".into(), body: Some(body) });
        }

        let parsed = serde_json::from_str::<Value>(&body);
        if !success {
            let message = parsed
                .ok()
                .and_then(|v| server_message(&v))
                .unwrap_or_else(|| format!("Request failed with status {status}"));
            return Err(ClientError::Api { status, message, body: Some(body) });
        }

        let json = match parsed {
            Ok(v) => v,
            Err(e) => {
                return Err(ClientError::Api {
                    status,
                    message: format!("invalid JSON response: {e}"),
                    body: Some(body),
                })
            }
        };

        normalize(json).map_err(|message| ClientError::Api { status, message, body: Some(body) })
    }
}

async fn read_response(builder: reqwest::RequestBuilder) -> Result<RawResponse, ClientError> {
    let resp = builder.send().await.map_err(|e| ClientError::Network(e.to_string()))?;
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = resp.text().await.map_err(|e| ClientError::Network(e.to_string()))?;
    Ok(RawResponse { status, content_type, body })
}

fn build_headers(token: Option<&str>, extra: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Validation(format!("invalid token: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Validation(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Validation(format!("invalid header value for {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// `message`, then `error`, as the server's human-readable explanation.
fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

/// Turn a 2xx JSON body into a success envelope. An error/fail envelope
/// yields its message in `Err`.
fn normalize(body: Value) -> Result<ApiResponse<Value>, String> {
    match ApiResponse::from_envelope(body) {
        Ok(mut envelope) if envelope.status == ResponseStatus::Success => {
            if envelope.data.is_none() {
                envelope.data = Some(Value::Null);
            }
            Ok(envelope)
        }
        Ok(envelope) => Err(envelope.message.unwrap_or_else(|| "request failed".to_string())),
        Err(bare) => Ok(ApiResponse::success(bare)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_is_attached_once() {
        let headers = build_headers(Some("abc"), &[]).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn caller_headers_override_defaults_but_keep_authorization() {
        let extra = vec![("Content-Type".to_string(), "application/merge-patch+json".to_string())];
        let headers = build_headers(Some("abc"), &extra).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/merge-patch+json");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn explicit_authorization_wins() {
        let extra = vec![("authorization".to_string(), "Basic Zm9v".to_string())];
        let headers = build_headers(Some("abc"), &extra).unwrap();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic Zm9v");
    }

    #[test]
    fn json_detection() {
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/html"));
    }

    #[test]
    fn bare_body_is_wrapped() {
        let resp = normalize(json!({"id": "o1", "status": "PENDING"})).unwrap();
        assert_eq!(resp, ApiResponse::success(json!({"id": "o1", "status": "PENDING"})));
    }

    #[test]
    fn success_envelope_passes_through() {
        let body = json!({"status": "success", "data": [1, 2], "message": "ok"});
        let resp = normalize(body).unwrap();
        assert_eq!(resp.data, Some(json!([1, 2])));
        assert_eq!(resp.message.as_deref(), Some("ok"));
    }

    #[test]
    fn enveloped_order_is_unwrapped_once() {
        let body = json!({"status": "success", "data": {"id": "o1", "status": "ACCEPTED"}});
        let resp = normalize(body).unwrap();
        assert_eq!(resp.data, Some(json!({"id": "o1", "status": "ACCEPTED"})));
    }

    #[test]
    fn error_envelope_on_2xx_is_an_error() {
        let err = normalize(json!({"status": "error", "message": "order locked"})).unwrap_err();
        assert_eq!(err, "order locked");
    }

    #[test]
    fn server_message_prefers_message_then_error() {
        assert_eq!(server_message(&json!({"error": "e", "message": "m"})).as_deref(), Some("m"));
        assert_eq!(server_message(&json!({"error": "e"})).as_deref(), Some("e"));
        assert_eq!(server_message(&json!({"message": ""})), None);
    }
}
