//! Route-level access control.
//!
//! The storefront mounts its auth dialogs on the root path, so every redirect
//! lands on `/`. The account API itself is always passed through so login and
//! logout keep working regardless of session state.

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;

use super::handlers::auth::session::authenticate_session;

/// Routes that never require a session.
const PUBLIC_ROUTES: &[&str] = &["/", "/health"];

/// Routes that host the auth dialogs; signed-in visitors are sent away.
const AUTH_ROUTES: &[&str] = &["/dashboard"];

const API_AUTH_PREFIX: &str = "/api/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardDecision {
    Allow,
    /// Check the session first, then apply the auth-route or protected rule.
    AuthRoute,
    Protected,
}

/// Classify a path without touching the session store.
pub(crate) fn route_decision(path: &str) -> GuardDecision {
    if path.starts_with(API_AUTH_PREFIX) {
        return GuardDecision::Allow;
    }
    if AUTH_ROUTES.contains(&path) {
        return GuardDecision::AuthRoute;
    }
    if PUBLIC_ROUTES.contains(&path) {
        return GuardDecision::Allow;
    }
    GuardDecision::Protected
}

/// Enforce the route rules before the request reaches its handler.
pub(crate) async fn guard(
    pool: Extension<PgPool>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let decision = route_decision(request.uri().path());
    if decision == GuardDecision::Allow {
        return Ok(next.run(request).await);
    }

    let authenticated = authenticate_session(request.headers(), &pool)
        .await?
        .is_some();

    match decision {
        GuardDecision::AuthRoute if authenticated => {
            Ok(Redirect::temporary("/").into_response())
        }
        GuardDecision::Protected if !authenticated => {
            Ok(Redirect::temporary("/").into_response())
        }
        _ => Ok(next.run(request).await),
    }
}
