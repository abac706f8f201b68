//! Administrator one-time password login.

use super::{ApiError, AppState};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use ppgee_core::auth::AuthError;
use serde_json::{json, Value};

pub(super) async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let token = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get("token").and_then(Value::as_str).map(str::to_string))
        .filter(|token| !token.trim().is_empty());
    let Some(token) = token else {
        return error_body(StatusCode::BAD_REQUEST, "Token is required");
    };

    let Some(verifier) = state.verifier.as_ref() else {
        error!("event=login module=http status=error error_code=otp_secret_missing");
        return ApiError::internal().into_response();
    };

    match verifier.verify(&token) {
        Ok(true) => {
            info!("event=login module=http status=ok");
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        Ok(false) => {
            warn!("event=login module=http status=error error_code=invalid_token");
            error_body(StatusCode::UNAUTHORIZED, "Invalid token")
        }
        Err(AuthError::MissingToken) => error_body(StatusCode::BAD_REQUEST, "Token is required"),
        Err(err) => {
            error!("event=login module=http status=error error={err}");
            ApiError::internal().into_response()
        }
    }
}

pub(super) async fn method_not_allowed() -> Response {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
