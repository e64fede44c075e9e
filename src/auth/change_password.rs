//! Defines the route handler for changing the logged in user's password.

use axum::{Extension, extract::State};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error, UserID,
    auth::{AccountState, SessionToken, session::delete_other_sessions},
    db,
    json::Json,
    password::{hash_password, verify_password},
    user::{get_user_by_id, update_password_hash},
};

/// The current and desired passwords.
///
/// `old` and `new` are accepted as shorter aliases of the field names.
#[derive(Deserialize)]
pub struct ChangePasswordData {
    /// The user's current password.
    #[serde(alias = "old")]
    pub old_password: String,
    /// The password to replace it with.
    #[serde(alias = "new")]
    pub new_password: String,
}

/// Replace the password of the user the request is authenticated as.
///
/// Every other session of the user is ended, the session used for this request stays valid.
///
/// # Errors
///
/// - [Error::IncorrectPassword] if `old_password` does not match the current password.
/// - [Error::InvalidPassword] if `new_password` does not meet the password policy.
pub async fn change_password(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Extension(current_session): Extension<SessionToken>,
    Json(data): Json<ChangePasswordData>,
) -> Result<Json<Value>, Error> {
    let user = {
        let connection = db::lock(&state.db_connection)?;
        get_user_by_id(user_id, &connection)?
    };

    let is_password_valid = verify_password(data.old_password, Some(user.password_hash)).await?;

    if !is_password_valid {
        return Err(Error::IncorrectPassword);
    }

    let password_hash = hash_password(data.new_password, state.password_cost).await?;

    let mut connection = db::lock(&state.db_connection)?;
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    update_password_hash(user_id, &password_hash, &transaction)?;
    let ended_sessions = delete_other_sessions(user_id, &current_session, &transaction)?;
    transaction.commit()?;

    tracing::info!("User {user_id} changed their password, ended {ended_sessions} other sessions");

    Ok(Json(json!({ "message": "Password changed successfully" })))
}
