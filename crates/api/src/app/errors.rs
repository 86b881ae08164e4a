use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shutter_auth::AccountError;

/// Map account-flow failures to HTTP.
///
/// Credential problems are always 4xx; only genuine server faults are 5xx,
/// and their details stay in the logs.
pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "Invalid credentials")
        }
        AccountError::AlreadyExists => {
            json_error(StatusCode::BAD_REQUEST, "user_exists", "User already exists")
        }
        AccountError::InvalidIdentity(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        AccountError::Store(_) | AccountError::Secret(_) | AccountError::Issue(_) => {
            tracing::error!(error = %err, "account request failed");
            internal_error()
        }
    }
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
