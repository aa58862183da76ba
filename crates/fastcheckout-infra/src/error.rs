//! Rendering of `AppError` into the uniform response envelope.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fastcheckout_core::{ApiResponse, AppError, ErrorMetadata};

/// Builds the envelope response for `error`.
///
/// `expose_details` controls whether sensitive details are included; non-sensitive
/// details (validation fields, retry hints) are always sent.
pub fn envelope_response(error: &AppError, expose_details: bool) -> Response {
    let status =
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let details = if error.is_sensitive() && !expose_details {
        None
    } else {
        error.details()
    };

    let body: ApiResponse<()> =
        ApiResponse::failure(error.error_code(), error.client_message(), details);
    let mut response = (status, Json(body)).into_response();

    if let Some(secs) = error.retry_after_secs() {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    response
}
