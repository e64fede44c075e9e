//! Middleware for logging requests and responses.

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The `tracing` target that SQL statements are logged under.
///
/// Enable it with a filter directive such as `finance_tracker::sql=debug`.
pub const SQL_LOG_TARGET: &str = "finance_tracker::sql";

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Bodies larger than this, or of unknown size, are passed through without being
/// read so that handlers still enforce their own body limits.
///
/// Matches axum's default request body limit.
pub const MAX_LOGGED_BODY_BYTES: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and session tokens in JSON bodies and credential headers are redacted.
/// Bodies over [MAX_LOGGED_BODY_BYTES] or of unknown length are not read.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let request = if is_loggable(&body) {
        let body_bytes = match axum::body::to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!("Could not read request body: {error}");
                return Error::InvalidInput("could not read request body".to_owned())
                    .into_response();
            }
        };
        log_request(&parts, &display_body(&parts.headers, &body_bytes));
        Request::from_parts(parts, body_bytes.into())
    } else {
        log_request(&parts, &unlogged_body(&body));
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    if !is_loggable(&body) {
        log_response(&parts, &unlogged_body(&body));
        return Response::from_parts(parts, body);
    }

    let body_bytes = match axum::body::to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &display_body(&parts.headers, &body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// Whether `body` has a known length small enough to buffer for the logs.
fn is_loggable(body: &Body) -> bool {
    body.size_hint()
        .exact()
        .is_some_and(|length| length <= MAX_LOGGED_BODY_BYTES as u64)
}

fn unlogged_body(body: &Body) -> String {
    match body.size_hint().exact() {
        Some(length) => format!("<{length} bytes, not logged>"),
        None => "<streamed body, not logged>".to_owned(),
    }
}

/// Copy `headers` with the values of credential headers masked.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [AUTHORIZATION, COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    headers
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Render a body for the logs with any sensitive JSON fields masked.
fn display_body(headers: &HeaderMap, body: &[u8]) -> String {
    if is_json(headers) {
        if let Ok(mut json) = serde_json::from_slice::<Value>(body) {
            redact_secrets(&mut json);
            return json.to_string();
        }
    }

    String::from_utf8_lossy(body).to_string()
}

fn is_secret_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();

    name.contains("password") || name.contains("token") || name == "old" || name == "new"
}

fn redact_secrets(json: &mut Value) {
    match json {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if is_secret_field(key) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_secrets(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

/// Cut `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            headers.method,
            headers.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            headers.method,
            headers.uri
        );
    }
    tracing::debug!("Request headers: {:#?}", redact_headers(&headers.headers));
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            headers.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", headers.status);
    }
    tracing::debug!("Response headers: {:#?}", redact_headers(&headers.headers));
}
