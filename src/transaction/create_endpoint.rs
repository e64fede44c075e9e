//! Defines the endpoint for creating a new transaction.

use axum::{Extension, extract::State, http::StatusCode};

use crate::{
    Error, UserID, db,
    json::Json,
    transaction::{NewTransaction, Transaction, TransactionState, core::create_transaction},
};

/// A route handler for creating a new transaction owned by the logged in user.
///
/// Returns `201 Created` with the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = db::lock(&state.db_connection)?;

    let transaction = create_transaction(new_transaction, user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::{
        AppState,
        auth::auth_guard,
        endpoints,
        test_utils::{assert_json_error, create_test_user, get_test_state, log_in_test_user},
        transaction::{create_transaction_endpoint, list_transactions},
    };

    fn get_test_server() -> (TestServer, AppState, String) {
        let state = get_test_state();
        create_test_user(&state, "demo@example.com", "demo123");
        let token = log_in_test_user(&state, "demo@example.com");

        let app = Router::new()
            .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
            token,
        )
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (server, state, token) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"description": "Groceries", "amount": 12.3, "type": "expense"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["description"], "Groceries");
        assert_eq!(body["amount"].as_f64(), Some(12.3));
        assert_eq!(body["type"], "expense");
        assert!(!body["id"].as_str().unwrap().is_empty());

        let connection = state.db_connection.lock().unwrap();
        let user_id = crate::user::get_user_by_email("demo@example.com", &connection)
            .unwrap()
            .id;
        let transactions = list_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, Decimal::new(123, 1));
        assert_eq!(body["id"], transactions[0].id.to_string());
    }

    #[tokio::test]
    async fn accepts_any_type_string() {
        let (server, _, token) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"description": "Refund", "amount": -5, "type": "refund"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<serde_json::Value>()["type"], "refund");
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let (server, _, token) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"description": "Groceries", "amount": "lots", "type": "expense"}))
            .await;

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_missing_fields() {
        let (server, _, token) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"description": "Groceries"}))
            .await;

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn requires_token() {
        let (server, _, _) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"description": "Groceries", "amount": 1, "type": "expense"}))
            .await;

        assert_json_error(&response, StatusCode::UNAUTHORIZED);
    }
}
