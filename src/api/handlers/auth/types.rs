//! Request/response types for the account endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account capability tag chosen at registration.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Cashier,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Cashier => "Cashier",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Admin" => Some(Self::Admin),
            "Cashier" => Some(Self::Cashier),
            _ => None,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendResetEmailRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::Cashier] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("Manager"), None);
    }

    #[test]
    fn reset_password_request_uses_camel_case_confirm_field() -> Result<()> {
        let request: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "token": "abc",
            "password": "password1",
            "confirmPassword": "password1",
        }))?;
        assert_eq!(request.confirm_password, "password1");

        let value = serde_json::to_value(&request)?;
        assert!(value.get("confirmPassword").is_some());
        assert!(value.get("confirm_password").is_none());
        Ok(())
    }

    #[test]
    fn register_request_round_trips() -> Result<()> {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Jane Doe",
            "email": "jane@x.com",
            "password": "password1",
            "role": "Cashier",
        }))?;
        assert_eq!(request.role, Role::Cashier);
        Ok(())
    }
}
