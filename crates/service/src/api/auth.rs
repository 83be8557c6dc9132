use std::sync::Arc;

use models::{ApiResponse, AuthPayload, LoginInput, RegisterInput, User};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ClientError;
use crate::http::{ApiRequest, Dispatcher};

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthApi {
    dispatcher: Arc<Dispatcher>,
}

/// `/api/auth/me` answers either `{user: {...}}` or the user itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeBody {
    Wrapped { user: User },
    Bare(User),
}

impl AuthApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self { Self { dispatcher } }

    /// `POST /api/auth/login`. Does not store anything; see
    /// [`crate::session::SessionController::login`] for the full flow.
    #[instrument(skip(self, input), fields(identifier = %input.identifier))]
    pub async fn login(&self, input: &LoginInput) -> Result<AuthSession, ClientError> {
        input.validate()?;
        let req = ApiRequest::post("/api/auth/login").json(input)?.allow_when_logged_out();
        let resp = self.dispatcher.send(req).await?;
        into_session(resp)
    }

    /// `POST /api/auth/register`.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: &RegisterInput) -> Result<AuthSession, ClientError> {
        input.validate()?;
        let req = ApiRequest::post("/api/auth/register").json(input)?.allow_when_logged_out();
        let resp = self.dispatcher.send(req).await?;
        into_session(resp)
    }

    /// `GET /api/auth/me`.
    pub async fn me(&self) -> Result<User, ClientError> {
        let resp = self.dispatcher.send(ApiRequest::get("/api/auth/me").authenticated()).await?;
        match super::unwrap_data::<MeBody>(resp)? {
            MeBody::Wrapped { user } | MeBody::Bare(user) => Ok(user),
        }
    }

    /// `POST /api/auth/logout`. Allowed while the logged-out guard is set,
    /// since it runs during teardown.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let req = ApiRequest::post("/api/auth/logout").authenticated().allow_when_logged_out();
        self.dispatcher.send(req).await?;
        Ok(())
    }
}

/// The token may sit in `data.token` or beside `data` in the envelope.
fn into_session(resp: ApiResponse<Value>) -> Result<AuthSession, ClientError> {
    let envelope_token = resp.token.clone();
    let payload: AuthPayload = super::unwrap_data(resp)?;
    let token = payload
        .token
        .or(envelope_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ClientError::Decode("auth response carried no token".into()))?;
    Ok(AuthSession { user: payload.user, token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Role;
    use serde_json::json;

    #[test]
    fn token_inside_data() {
        let resp = ApiResponse::success(json!({"user": {"id": "2", "role": "CLIENT"}, "token": "abc"}));
        let s = into_session(resp).unwrap();
        assert_eq!(s.token, "abc");
        assert_eq!(s.user.role, Role::Client);
    }

    #[test]
    fn token_beside_data() {
        let mut resp = ApiResponse::success(json!({"user": {"id": "3", "role": "DRIVER"}}));
        resp.token = Some("xyz".into());
        assert_eq!(into_session(resp).unwrap().token, "xyz");
    }

    #[test]
    fn missing_token_is_a_decode_error() {
        let resp = ApiResponse::success(json!({"user": {"id": "3", "role": "DRIVER"}}));
        assert!(matches!(into_session(resp), Err(ClientError::Decode(_))));
    }
}
