use serde::{Deserialize, Serialize};

use shutter_auth::Credential;

// -------------------------
// Request DTOs
// -------------------------

/// Body of both `/register` and `/login`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(credential: Credential) -> Self {
        Self {
            access_token: credential.into_inner(),
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub username: String,
    pub expires_at: i64,
}
