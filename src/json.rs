//! A JSON extractor and response type whose rejections are reported as [Error]s.

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Wraps [axum::Json] so that malformed request bodies produce a `400 Bad Request`
/// with the app's JSON error body instead of axum's plain text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
