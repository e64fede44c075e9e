//! User accounts and bearer token authentication.
//!
//! Clients register, log in to receive a [SessionToken], and then send it as
//! `Authorization: Bearer <token>` on every protected request. The
//! [auth_guard] middleware resolves the token to a [UserID](crate::UserID)
//! that handlers receive via `Extension(user_id): Extension<UserID>`.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Deserialize;

use crate::AppState;

mod change_password;
mod log_in;
mod log_out;
mod middleware;
mod profile;
mod register;
mod session;

pub use change_password::change_password;
pub use log_in::{LogInResponse, log_in};
pub use log_out::log_out;
pub use middleware::{AuthState, auth_guard};
pub use profile::{get_profile, update_profile};
pub use register::register_user;
pub use session::{
    DEFAULT_SESSION_DURATION, SessionToken, create_session_table, delete_user_sessions,
};

#[cfg(test)]
pub(crate) use session::create_session;

/// The state needed by handlers that create or modify user accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The email and password sent to register or log in.
///
/// The password is kept as a plain string, it is validated or verified by the handler.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// The user's email address.
    pub email: String,
    /// The user's password.
    pub password: String,
}
