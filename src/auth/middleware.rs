//! Authentication middleware that validates bearer tokens and extends sessions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, auth::session::validate_session, db};

use super::SessionToken;

/// The state needed for the auth middleware and log-in.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up sessions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long a session token stays valid without being used.
    pub session_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            session_duration: state.session_duration,
        }
    }
}

/// Get the bearer token from the `Authorization` header, if there is a well-formed one.
pub(super) fn get_bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| SessionToken::from_bearer(bearer.token()))
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID and session token are placed into the request and the request executed
/// normally if the token is valid, otherwise a `401 Unauthorized` JSON error is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = get_bearer_token(request.headers()) else {
        tracing::debug!("Rejected request without a bearer token");
        return Error::Unauthorized.into_response();
    };

    let user_id = {
        let connection = match db::lock(&state.db_connection) {
            Ok(connection) => connection,
            Err(error) => return error.into_response(),
        };

        match validate_session(
            &token,
            state.session_duration,
            OffsetDateTime::now_utc(),
            &connection,
        ) {
            Ok(user_id) => user_id,
            Err(error) => return error.into_response(),
        }
    };

    request.extensions_mut().insert(user_id);
    request.extensions_mut().insert(token);

    next.run(request).await
}
