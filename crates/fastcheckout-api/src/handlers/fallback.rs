use crate::error::HttpAppError;
use axum::http::{Method, Uri};
use fastcheckout_core::AppError;

pub async fn not_found(method: Method, uri: Uri) -> HttpAppError {
    HttpAppError(AppError::NotFound(format!(
        "No route for {} {}",
        method,
        uri.path()
    )))
}
