//! Defines the endpoint for registering a new user.

use axum::{extract::State, http::StatusCode};

use crate::{
    Email, Error, User,
    auth::{AccountState, Credentials},
    db,
    json::Json,
    password::hash_password,
    user::create_user,
};

/// A route handler for registering a new user.
///
/// Returns `201 Created` with the new user on success.
///
/// # Errors
///
/// - [Error::InvalidEmail] or [Error::InvalidPassword] if the credentials are rejected.
/// - [Error::DuplicateEmail] if the email is already registered.
pub async fn register_user(
    State(state): State<AccountState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), Error> {
    let email = Email::new(&credentials.email)?;
    let password_hash = hash_password(credentials.password, state.password_cost).await?;

    let connection = db::lock(&state.db_connection)?;
    let user = create_user(email, password_hash, &connection)?;

    tracing::info!("Registered new user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        auth::{AccountState, register_user},
        endpoints,
        test_utils::get_test_state,
    };

    fn get_test_server() -> (TestServer, AccountState) {
        let state = AccountState {
            db_connection: get_test_state().db_connection,
            password_cost: 4,
        };
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
        )
    }

    fn count_users(state: &AccountState) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(id) FROM users", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "demo@example.com", "password": "demo123"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let user = response.json::<serde_json::Value>();
        assert_eq!(user["email"], "demo@example.com");
        assert!(!user["id"].as_str().unwrap().is_empty());
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn create_user_stores_hash_not_password() {
        let (server, state) = get_test_server();

        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "demo@example.com", "password": "demo123"}))
            .await
            .assert_status(StatusCode::CREATED);

        let stored: String = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT password FROM users", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "demo123");
        assert!(bcrypt::verify("demo123", &stored).unwrap());
    }

    #[tokio::test]
    async fn create_user_fails_with_existing_email() {
        let (server, state) = get_test_server();
        let body = json!({"email": "demo@example.com", "password": "demo123"});

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CONFLICT);

        assert_eq!(count_users(&state), 1);
    }

    #[tokio::test]
    async fn create_user_fails_with_invalid_email() {
        let (server, state) = get_test_server();

        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "not-an-email", "password": "demo123"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert_eq!(count_users(&state), 0);
    }

    #[tokio::test]
    async fn create_user_fails_with_short_password() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "demo@example.com", "password": "abc"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert!(
            body["error"].as_str().unwrap().contains("password"),
            "want password error, got {body}"
        );
    }

    #[tokio::test]
    async fn create_user_fails_with_missing_fields() {
        let (server, _) = get_test_server();

        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "demo@example.com"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
