use shutter_auth::CredentialClaims;
use shutter_core::Identity;

/// Principal context for a request (authenticated identity).
///
/// Inserted by the auth middleware after the bearer credential verified;
/// handlers treat the identity as authenticated with no further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity: Identity,
    token_id: Option<String>,
    expires_at: i64,
}

impl PrincipalContext {
    pub fn from_claims(claims: CredentialClaims) -> Self {
        Self {
            identity: claims.sub,
            token_id: claims.jti,
            expires_at: claims.exp,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// The raw bearer credential of the current request (needed to revoke it).
#[derive(Clone)]
pub struct BearerToken(pub String);

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
