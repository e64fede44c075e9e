//! Route handlers for reading and updating the logged in user's profile.

use axum::{Extension, extract::State};
use serde::Deserialize;

use crate::{
    Email, Error, User, UserID,
    auth::AccountState,
    db,
    json::Json,
    user::{get_user_by_id, update_email},
};

/// The fields of a profile that may be changed. Omitted fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    /// The new email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Get the user the request is authenticated as.
pub async fn get_profile(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = db::lock(&state.db_connection)?;

    get_user_by_id(user_id, &connection).map(Json)
}

/// Update the profile of the user the request is authenticated as.
///
/// # Errors
///
/// - [Error::InvalidEmail] if the new email is not a valid address.
/// - [Error::DuplicateEmail] if the new email belongs to another user.
pub async fn update_profile(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, Error> {
    let email = update.email.as_deref().map(Email::new).transpose()?;

    let connection = db::lock(&state.db_connection)?;

    let user = match email {
        Some(email) => {
            let user = update_email(user_id, &email, &connection)?;
            tracing::info!("User {user_id} changed their email");
            user
        }
        None => get_user_by_id(user_id, &connection)?,
    };

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        auth::{auth_guard, get_profile, update_profile},
        endpoints,
        test_utils::{create_test_user, get_test_state, log_in_test_user},
    };

    fn get_test_server() -> (TestServer, String) {
        let state = get_test_state();
        create_test_user(&state, "taken@example.com", "demo123");
        create_test_user(&state, "demo@example.com", "demo123");
        let token = log_in_test_user(&state, "demo@example.com");

        let app = Router::new()
            .route(endpoints::PROFILE, get(get_profile).put(update_profile))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            token,
        )
    }

    #[tokio::test]
    async fn get_profile_returns_current_user() {
        let (server, token) = get_test_server();

        let response = server
            .get(endpoints::PROFILE)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let user = response.json::<serde_json::Value>();
        assert_eq!(user["email"], "demo@example.com");
        assert!(user.get("password").is_none());
    }

    #[tokio::test]
    async fn get_profile_requires_token() {
        let (server, _) = get_test_server();

        server
            .get(endpoints::PROFILE)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_profile_changes_email() {
        let (server, token) = get_test_server();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(&token)
            .json(&json!({"email": "new@example.com"}))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["email"],
            "new@example.com"
        );

        let profile = server
            .get(endpoints::PROFILE)
            .authorization_bearer(&token)
            .await
            .json::<serde_json::Value>();
        assert_eq!(profile["email"], "new@example.com");
    }

    #[tokio::test]
    async fn update_profile_without_fields_changes_nothing() {
        let (server, token) = get_test_server();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(&token)
            .json(&json!({}))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["email"],
            "demo@example.com"
        );
    }

    #[tokio::test]
    async fn update_profile_rejects_invalid_email() {
        let (server, token) = get_test_server();

        server
            .put(endpoints::PROFILE)
            .authorization_bearer(&token)
            .json(&json!({"email": "nope"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_email() {
        let (server, token) = get_test_server();

        server
            .put(endpoints::PROFILE)
            .authorization_bearer(&token)
            .json(&json!({"email": "taken@example.com"}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }
}
