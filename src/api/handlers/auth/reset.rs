//! Password reset endpoints.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::service::{AuthContext, ResetPasswordOutcome, ResetRequestOutcome};
use super::state::AuthState;
use super::types::{MessageResponse, ResetPasswordRequest, SendResetEmailRequest};
use super::validate::FieldError;

/// Email a reset link carrying a fresh one-time token.
#[utoipa::path(
    post,
    path = "/api/auth/send-reset-email",
    request_body = SendResetEmailRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 404, description = "Email does not exist", body = MessageResponse),
        (status = 502, description = "Mail provider failed", body = MessageResponse),
        (status = 500, description = "Reset request failed", body = String)
    ),
    tag = "auth"
)]
pub async fn send_reset_email(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SendResetEmailRequest>>,
) -> impl IntoResponse {
    let request: SendResetEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let ctx = AuthContext {
        pool: &pool,
        state: &auth_state,
    };

    match super::service::send_reset_email(&ctx, &request).await {
        Ok(ResetRequestOutcome::Sent) => (
            StatusCode::OK,
            Json(MessageResponse::new("Reset email sent.")),
        )
            .into_response(),
        Ok(ResetRequestOutcome::EmailNotFound) => (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Email does not exist.")),
        )
            .into_response(),
        Ok(ResetRequestOutcome::ProviderFailed) => (
            StatusCode::BAD_GATEWAY,
            Json(MessageResponse::new("Failed to send reset email.")),
        )
            .into_response(),
        Ok(ResetRequestOutcome::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(errors)).into_response()
        }
        Err(err) => {
            error!("Failed to request password reset: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset request failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Consume the emailed token and store the new password.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Validation failed or invalid/expired token", body = [FieldError]),
        (status = 500, description = "Reset failed", body = String)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.token.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response();
    }

    let ctx = AuthContext {
        pool: &pool,
        state: &auth_state,
    };

    match super::service::reset_password(&ctx, &request).await {
        Ok(ResetPasswordOutcome::Done) => StatusCode::NO_CONTENT.into_response(),
        Ok(ResetPasswordOutcome::InvalidToken) => {
            (StatusCode::BAD_REQUEST, "Invalid or expired token".to_string()).into_response()
        }
        Ok(ResetPasswordOutcome::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(errors)).into_response()
        }
        Err(err) => {
            error!("Failed to reset password: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Reset failed".to_string()).into_response()
        }
    }
}
