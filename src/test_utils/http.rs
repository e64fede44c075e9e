use axum::http::StatusCode;
use axum_test::TestResponse;

#[track_caller]
pub(crate) fn assert_json_error(response: &TestResponse, status: StatusCode) {
    response.assert_status(status);

    let body = response.json::<serde_json::Value>();
    assert!(
        body["error"].as_str().is_some_and(|message| !message.is_empty()),
        "want JSON body with an error message, got {body}"
    );
}
