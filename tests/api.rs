use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use finance_tracker::{AppState, build_router};

fn get_test_server() -> TestServer {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    let state = AppState::new(connection)
        .expect("Could not initialize database")
        .with_password_cost(4);

    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

async fn register_and_log_in(server: &TestServer, email: &str, password: &str) -> String {
    server
        .post("/auth/register")
        .json(&json!({"email": email, "password": password}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({"email": email, "password": password}))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .expect("log in response should contain a token")
        .to_owned()
}

#[tokio::test]
async fn register_log_in_and_record_transactions() {
    let server = get_test_server();
    let token = register_and_log_in(&server, "demo@example.com", "demo123").await;

    let created = server
        .post("/transactions")
        .authorization_bearer(&token)
        .json(&json!({"description": "Salary", "amount": 2500, "type": "income"}))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created = created.json::<Value>();
    assert_eq!(created["description"], "Salary");
    assert_eq!(created["type"], "income");
    assert_eq!(created["amount"].as_f64(), Some(2500.0));

    server
        .post("/transactions")
        .authorization_bearer(&token)
        .json(&json!({"description": "Groceries", "amount": 50.25, "type": "expense"}))
        .await
        .assert_status(StatusCode::CREATED);

    let listed = server
        .get("/transactions")
        .authorization_bearer(&token)
        .await;
    listed.assert_status_ok();
    let listed = listed.json::<Vec<Value>>();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], created);
    assert_eq!(listed[1]["description"], "Groceries");
    assert_eq!(listed[1]["amount"].as_f64(), Some(50.25));
}

#[tokio::test]
async fn log_in_response_has_user_without_password() {
    let server = get_test_server();
    server
        .post("/auth/register")
        .json(&json!({"email": "foo@bar.baz", "password": "hunter2"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({"email": "foo@bar.baz", "password": "hunter2"}))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["user"]["email"], "foo@bar.baz");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn transactions_are_scoped_to_their_owner() {
    let server = get_test_server();
    let alice = register_and_log_in(&server, "alice@example.com", "password1").await;
    let bob = register_and_log_in(&server, "bob@example.com", "password2").await;

    server
        .post("/transactions")
        .authorization_bearer(&alice)
        .json(&json!({"description": "Rent", "amount": 1200, "type": "expense"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/transactions").authorization_bearer(&bob).await;

    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let server = get_test_server();

    let response = server.get("/transactions").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn log_out_revokes_token() {
    let server = get_test_server();
    let token = register_and_log_in(&server, "foo@bar.baz", "hunter2").await;

    server
        .post("/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    server
        .get("/auth/profile")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_then_log_in_with_new_password() {
    let server = get_test_server();
    let token = register_and_log_in(&server, "foo@bar.baz", "hunter2").await;

    server
        .put("/auth/change-password")
        .authorization_bearer(&token)
        .json(&json!({"old_password": "hunter2", "new_password": "hunter3"}))
        .await
        .assert_status_ok();

    server
        .post("/auth/login")
        .json(&json!({"email": "foo@bar.baz", "password": "hunter2"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/auth/login")
        .json(&json!({"email": "foo@bar.baz", "password": "hunter3"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let server = get_test_server();
    register_and_log_in(&server, "foo@bar.baz", "hunter2").await;

    let response = server
        .post("/auth/register")
        .json(&json!({"email": "foo@bar.baz", "password": "another"}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}
