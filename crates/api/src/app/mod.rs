//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use shutter_auth::{AccountService, CredentialAuthority, SecretDigest, SecretError, SecretHasher};
use shutter_core::InMemoryIdentityStore;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Account flows over the process-local identity store.
pub type Accounts = AccountService<Arc<InMemoryIdentityStore<SecretDigest>>>;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> Result<Router, SecretError> {
    let authority = CredentialAuthority::new(&config.signing);
    build_app_with_authority(config, authority)
}

/// Same as [`build_app`] with a caller-supplied authority (custom clock or
/// shared denylist).
pub fn build_app_with_authority(
    config: &AppConfig,
    authority: CredentialAuthority,
) -> Result<Router, SecretError> {
    let hasher = Arc::new(SecretHasher::new(config.hashing.clone()));
    let store = Arc::new(InMemoryIdentityStore::new());
    let accounts: Arc<Accounts> =
        Arc::new(AccountService::new(store, hasher, authority.clone())?);

    let auth_state = middleware::AuthState { authority };

    // Protected routes: require a verified bearer credential.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Ok(Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(accounts))))
}
