//! Login endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::service::{AuthContext, LoginOutcome};
use super::session::session_cookie;
use super::state::AuthState;
use super::types::{LoginRequest, MessageResponse};
use super::validate::FieldError;

/// Verify credentials and set the session cookie.
///
/// Unverified accounts get a fresh confirmation email and a 200 without a
/// session; login is gated on verification.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, or confirmation email sent for unverified accounts", body = MessageResponse),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 401, description = "Incorrect email or password", body = MessageResponse),
        (status = 404, description = "Email does not exist", body = MessageResponse),
        (status = 502, description = "Mail provider failed", body = MessageResponse),
        (status = 500, description = "Login failed", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let ctx = AuthContext {
        pool: &pool,
        state: &auth_state,
    };

    match super::service::login(&ctx, &request).await {
        Ok(LoginOutcome::LoggedIn(session)) => {
            let mut headers = HeaderMap::new();
            match session_cookie(&auth_state, &session.token) {
                Ok(cookie) => {
                    headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => {
                    error!("Failed to build session cookie: {err}");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                        .into_response();
                }
            }
            (
                StatusCode::OK,
                headers,
                Json(MessageResponse::new("Login successful.")),
            )
                .into_response()
        }
        Ok(LoginOutcome::ConfirmationSent) => (
            StatusCode::OK,
            Json(MessageResponse::new("Confirmation email sent.")),
        )
            .into_response(),
        Ok(LoginOutcome::ProviderFailed) => (
            StatusCode::BAD_GATEWAY,
            Json(MessageResponse::new("Failed to send confirmation email.")),
        )
            .into_response(),
        Ok(LoginOutcome::EmailNotFound) => (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Email does not exist.")),
        )
            .into_response(),
        Ok(LoginOutcome::IncorrectCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("Incorrect email or password.")),
        )
            .into_response(),
        Ok(LoginOutcome::Failed) => (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("Something went wrong.")),
        )
            .into_response(),
        Ok(LoginOutcome::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(errors)).into_response()
        }
        Err(err) => {
            error!("Failed to login user: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}
