//! Defines the route handler for logging out.

use axum::{extract::State, http::HeaderMap};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::{AuthState, middleware::get_bearer_token, session::delete_session},
    db,
    json::Json,
};

/// Invalidate the session of the bearer token, if one was sent.
///
/// Logging out is idempotent: requests without a token, or with a token that
/// has already been invalidated, still succeed.
pub async fn log_out(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<Value>, Error> {
    if let Some(token) = get_bearer_token(&headers) {
        let connection = db::lock(&state.db_connection)?;
        delete_session(&token, &connection)?;
    }

    Ok(Json(json!({ "message": "Logged out successfully" })))
}
