//! Root and dashboard routes.
//!
//! The storefront is a separate frontend; these routes exist so redirects
//! from the route guard land somewhere meaningful and so the emailed deep
//! links can be resolved into a wizard step.

use axum::{
    extract::Query,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::auth::flow::ResetFlow;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RootResponse {
    name: String,
    version: String,
    /// Which auth dialog the query parameters resolve to, if any.
    dialog: Option<DialogState>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DialogState {
    auth: String,
    step: String,
}

/// Resolve the landing page, honoring `?auth=reset-password&token=...` deep
/// links into the reset wizard's final step.
pub async fn root(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let pairs = params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()));

    let dialog = match ResetFlow::from_query(pairs) {
        ResetFlow::SetNewPassword { .. } => Some(DialogState {
            auth: "reset-password".to_string(),
            step: "set-new-password".to_string(),
        }),
        ResetFlow::RequestEmail | ResetFlow::EmailSentAck => None,
    };

    Json(RootResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dialog,
    })
}

/// Auth-dialog route; the guard redirects signed-in visitors back to `/`.
pub async fn dashboard() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "dashboard" }))
}
