//! Form validation contracts at the service boundary.
//!
//! Validation runs before any store access; a non-empty error list means the
//! request is rejected without side effects. Errors are scoped to the form
//! field they belong to so the UI can render them inline.

use serde::Serialize;
use utoipa::ToSchema;

use super::types::{LoginRequest, RegisterRequest, ResetPasswordRequest, SendResetEmailRequest};
use super::utils::valid_email;

pub const NAME_MIN: usize = 4;
pub const NAME_MAX: usize = 64;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 72;

const MSG_EMAIL: &str = "Email address must be a valid email address.";
const MSG_NAME: &str = "Name must be between 4 and 64 characters long.";
const MSG_PASSWORD_MIN: &str = "Your password must contain 8 or more characters.";
const MSG_PASSWORD_MAX: &str = "Your password must contain less than 72 characters.";
const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match.";

/// A validation error attached to a single form field.
#[derive(ToSchema, Serialize, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if !valid_email(email.trim()) {
        errors.push(FieldError {
            field: "email",
            message: MSG_EMAIL,
        });
    }
}

fn check_password(errors: &mut Vec<FieldError>, field: &'static str, password: &str) {
    let length = password.chars().count();
    if length < PASSWORD_MIN {
        errors.push(FieldError {
            field,
            message: MSG_PASSWORD_MIN,
        });
    } else if length > PASSWORD_MAX {
        errors.push(FieldError {
            field,
            message: MSG_PASSWORD_MAX,
        });
    }
}

#[must_use]
pub fn validate_register(request: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let name_length = request.name.trim().chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&name_length) {
        errors.push(FieldError {
            field: "name",
            message: MSG_NAME,
        });
    }
    check_email(&mut errors, &request.email);
    check_password(&mut errors, "password", &request.password);
    errors
}

#[must_use]
pub fn validate_login(request: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&mut errors, &request.email);
    check_password(&mut errors, "password", &request.password);
    errors
}

#[must_use]
pub fn validate_send_reset_email(request: &SendResetEmailRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&mut errors, &request.email);
    errors
}

#[must_use]
pub fn validate_reset_password(request: &ResetPasswordRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_password(&mut errors, "password", &request.password);
    check_password(&mut errors, "confirmPassword", &request.confirm_password);
    if errors.is_empty() && request.password != request.confirm_password {
        // The mismatch belongs to the confirmation field, not the password.
        errors.push(FieldError {
            field: "confirmPassword",
            message: MSG_PASSWORD_MISMATCH,
        });
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::types::Role;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            password: "password1".to_string(),
            role: Role::Cashier,
        }
    }

    #[test]
    fn valid_register_passes() {
        assert!(validate_register(&register_request()).is_empty());
    }

    #[test]
    fn short_name_rejected() {
        let mut request = register_request();
        request.name = "Jan".to_string();
        let errors = validate_register(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn name_boundaries_accepted() {
        let mut request = register_request();
        request.name = "a".repeat(4);
        assert!(validate_register(&request).is_empty());
        request.name = "a".repeat(64);
        assert!(validate_register(&request).is_empty());
        request.name = "a".repeat(65);
        assert_eq!(validate_register(&request).len(), 1);
    }

    #[test]
    fn invalid_email_rejected() {
        let mut request = register_request();
        request.email = "not-an-email".to_string();
        let errors = validate_register(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn password_bounds_enforced() {
        let mut request = register_request();
        request.password = "short".to_string();
        assert_eq!(validate_register(&request)[0].field, "password");
        request.password = "a".repeat(73);
        assert_eq!(
            validate_register(&request)[0].message,
            MSG_PASSWORD_MAX
        );
        request.password = "a".repeat(72);
        assert!(validate_register(&request).is_empty());
    }

    #[test]
    fn multiple_errors_reported_together() {
        let request = RegisterRequest {
            name: "x".to_string(),
            email: "nope".to_string(),
            password: "short".to_string(),
            role: Role::Admin,
        };
        assert_eq!(validate_register(&request).len(), 3);
    }

    #[test]
    fn login_validation_checks_email_and_password() {
        let request = LoginRequest {
            email: "jane@x.com".to_string(),
            password: "password1".to_string(),
        };
        assert!(validate_login(&request).is_empty());

        let request = LoginRequest {
            email: "jane".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(validate_login(&request).len(), 2);
    }

    #[test]
    fn mismatched_passwords_flagged_on_confirm_field() {
        let request = ResetPasswordRequest {
            token: "token".to_string(),
            password: "password1".to_string(),
            confirm_password: "password2".to_string(),
        };
        let errors = validate_reset_password(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "confirmPassword");
        assert_eq!(errors[0].message, MSG_PASSWORD_MISMATCH);
    }

    #[test]
    fn matching_passwords_pass() {
        let request = ResetPasswordRequest {
            token: "token".to_string(),
            password: "password1".to_string(),
            confirm_password: "password1".to_string(),
        };
        assert!(validate_reset_password(&request).is_empty());
    }

    #[test]
    fn send_reset_email_requires_valid_email() {
        let request = SendResetEmailRequest {
            email: "jane@x.com".to_string(),
        };
        assert!(validate_send_reset_email(&request).is_empty());

        let request = SendResetEmailRequest {
            email: "@x.com".to_string(),
        };
        assert_eq!(validate_send_reset_email(&request).len(), 1);
    }
}
