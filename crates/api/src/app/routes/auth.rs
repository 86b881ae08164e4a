//! Identity-provider endpoints: the only place plaintext secrets arrive.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use shutter_auth::{AccountError, Credential};

use crate::app::{
    dto::{CredentialsRequest, TokenResponse},
    errors::{account_error_to_response, internal_error},
    Accounts,
};
use crate::context::BearerToken;

pub async fn register(
    Extension(accounts): Extension<Arc<Accounts>>,
    Json(req): Json<CredentialsRequest>,
) -> axum::response::Response {
    run_account_flow(accounts, move |accounts| {
        accounts.register(&req.username, &req.password)
    })
    .await
}

pub async fn login(
    Extension(accounts): Extension<Arc<Accounts>>,
    Json(req): Json<CredentialsRequest>,
) -> axum::response::Response {
    run_account_flow(accounts, move |accounts| {
        accounts.login(&req.username, &req.password)
    })
    .await
}

/// Revoke the credential presented with this request.
pub async fn logout(
    Extension(accounts): Extension<Arc<Accounts>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> axum::response::Response {
    match accounts.authority().revoke(&token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => crate::middleware::unauthorized(),
    }
}

/// Argon2 digests block; run them on the blocking pool.
async fn run_account_flow<F>(accounts: Arc<Accounts>, flow: F) -> axum::response::Response
where
    F: FnOnce(&Accounts) -> Result<Credential, AccountError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || flow(&accounts)).await {
        Ok(Ok(credential)) => Json(TokenResponse::bearer(credential)).into_response(),
        Ok(Err(err)) => account_error_to_response(err),
        Err(join_error) => {
            tracing::error!(error = %join_error, "account flow task failed");
            internal_error()
        }
    }
}
