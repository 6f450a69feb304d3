//! Registration endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::service::{AuthContext, RegisterOutcome};
use super::state::AuthState;
use super::types::{MessageResponse, RegisterRequest};
use super::validate::FieldError;

/// Create an account and send the first confirmation email.
///
/// Registration never authenticates; the caller is told a confirmation email
/// is on its way.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, confirmation email sent", body = MessageResponse),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 409, description = "Email already in use", body = MessageResponse),
        (status = 500, description = "Registration failed", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let ctx = AuthContext {
        pool: &pool,
        state: &auth_state,
    };

    match super::service::register(&ctx, &request).await {
        Ok(RegisterOutcome::Registered) => (
            StatusCode::OK,
            Json(MessageResponse::new("Confirmation email sent.")),
        )
            .into_response(),
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::CONFLICT,
            Json(MessageResponse::new("Email already in use.")),
        )
            .into_response(),
        Ok(RegisterOutcome::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(errors)).into_response()
        }
        Err(err) => {
            error!("Failed to register user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response()
        }
    }
}
