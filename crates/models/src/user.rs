use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{require_non_empty, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Driver,
    Admin,
}

impl Role {
    /// Lowercase form used in order listing paths (`/api/orders/client/...`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Client => "CLIENT",
            Role::Driver => "DRIVER",
            Role::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Credentials submitted to `/api/auth/login`. `identifier` is an email or phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), password: password.into() }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_empty("identifier", &self.identifier)?;
        require_non_empty("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("password", &self.password)?;
        if !self.email.contains('@') {
            return Err(ModelError::Validation("invalid email".into()));
        }
        if self.role == Role::Admin {
            return Err(ModelError::Validation("admin accounts cannot self-register".into()));
        }
        Ok(())
    }
}

/// Successful login/register payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_with_only_id_and_role_deserializes() {
        let u: User = serde_json::from_value(serde_json::json!({"id": "2", "role": "CLIENT"})).unwrap();
        assert_eq!(u.role, Role::Client);
        assert!(u.email.is_none());
    }

    #[test]
    fn login_rejects_blank_password() {
        let err = LoginInput::new("client@example.com", "  ").validate().unwrap_err();
        assert_eq!(err, ModelError::required("password"));
    }

    #[test]
    fn register_rejects_admin_role() {
        let input = RegisterInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: None,
            password: "secret".into(),
            role: Role::Admin,
        };
        assert!(input.validate().is_err());
    }
}
