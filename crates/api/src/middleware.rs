use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use shutter_auth::CredentialAuthority;

use crate::app::errors::json_error;
use crate::context::{BearerToken, PrincipalContext};

#[derive(Clone)]
pub struct AuthState {
    pub authority: CredentialAuthority,
}

/// Gate a route behind a valid bearer credential.
///
/// Every failure (missing header, wrong scheme, malformed, bad signature,
/// expired, revoked) produces the same 401 response. The specific reason is
/// only logged.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).ok_or_else(unauthorized)?;

    let claims = state
        .authority
        .verify_claims(token)
        .map_err(|_rejection| unauthorized())?;

    let token = BearerToken(token.to_string());
    req.extensions_mut().insert(PrincipalContext::from_claims(claims));
    req.extensions_mut().insert(token);

    Ok(next.run(req).await)
}

pub fn unauthorized() -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid token")
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let header = header.strip_prefix("Bearer ")?;

    let token = header.trim();
    if token.is_empty() {
        tracing::debug!("empty bearer credential");
        return None;
    }

    Some(token)
}
