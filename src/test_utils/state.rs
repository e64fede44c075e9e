use rusqlite::Connection;

use crate::{
    AppState, Email, PasswordHash, User,
    auth::create_session,
    user::{create_user, get_user_by_email},
};

/// The lowest cost bcrypt accepts, keeps tests fast.
pub(crate) const TEST_PASSWORD_COST: u32 = 4;

pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection)
        .expect("Could not initialize database")
        .with_password_cost(TEST_PASSWORD_COST)
}

#[track_caller]
pub(crate) fn create_test_user(state: &AppState, email: &str, password: &str) -> User {
    let password_hash = PasswordHash::from_raw_password(password, TEST_PASSWORD_COST)
        .expect("Could not hash test password");
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    create_user(Email::new_unchecked(email), password_hash, &connection)
        .expect("Could not create test user")
}

/// Start a session for the user with `email` and return the bearer token.
#[track_caller]
pub(crate) fn log_in_test_user(state: &AppState, email: &str) -> String {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");
    let user = get_user_by_email(email, &connection).expect("Could not find test user");

    create_session(user.id, state.session_duration, &connection)
        .expect("Could not create test session")
        .as_str()
        .to_owned()
}
