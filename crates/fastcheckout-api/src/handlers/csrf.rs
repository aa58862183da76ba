use crate::state::AppState;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use fastcheckout_core::ApiResponse;
use fastcheckout_infra::middleware::csrf_cookie;
use fastcheckout_infra::generate_csrf_token;
use serde_json::json;
use std::sync::Arc;

/// Issues a fresh token and sets it as the `csrf-token` cookie. Clients echo
/// it back in `X-CSRF-Token` on state-changing requests.
pub async fn issue_csrf_token(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let token = generate_csrf_token();
    let cookie = csrf_cookie(&token, state.config.is_production());
    (
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(json!({ "csrfToken": token }))),
    )
}
