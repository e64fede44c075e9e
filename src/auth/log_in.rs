//! This file defines the route for handling log-in requests.

use axum::extract::State;
use serde::Serialize;

use crate::{
    Error, User,
    auth::{AuthState, Credentials, SessionToken, session::create_session},
    db,
    json::Json,
    password::verify_password,
    user::get_user_by_email,
};

/// The body returned after a successful log-in.
#[derive(Debug, Serialize)]
pub struct LogInResponse {
    /// The bearer token to send with protected requests.
    pub token: SessionToken,
    /// The user that logged in.
    pub user: User,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, a new session is started and its token is
/// returned together with the user.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email is not registered or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn log_in(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LogInResponse>, Error> {
    let user = {
        let connection = db::lock(&state.db_connection)?;

        match get_user_by_email(&credentials.email, &connection) {
            Ok(user) => Some(user),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        }
    };

    // Unknown emails are checked against a dummy hash so both paths take as long.
    let password_hash = user.as_ref().map(|user| user.password_hash.clone());
    let is_password_valid = verify_password(credentials.password, password_hash)
        .await
        .inspect_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
        })?;

    let user = match user {
        Some(user) if is_password_valid => user,
        Some(user) => {
            tracing::debug!("Incorrect password for user {}", user.id);
            return Err(Error::InvalidCredentials);
        }
        None => return Err(Error::InvalidCredentials),
    };

    let connection = db::lock(&state.db_connection)?;
    let token = create_session(user.id, state.session_duration, &connection)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LogInResponse { token, user }))
}
