pub mod dashboard;
pub mod donations;
pub mod expenses;
pub mod reports;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub(crate) fn bad_field(name: &str, err: MultipartError) -> Response {
    tracing::warn!("failed to read form field {name}: {err}");
    (StatusCode::BAD_REQUEST, "Malformed form data").into_response()
}
