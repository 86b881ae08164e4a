use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutter_core::Identity;

use crate::error::Rejection;

/// Claims carried by a credential (JWT registered claim names).
///
/// Timestamps are whole unix seconds, as in any JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject / asserted identity.
    pub sub: Identity,

    /// Issued-at timestamp. Optional on the wire: older issuers sign only
    /// `sub` and `exp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration timestamp. The credential is valid strictly before it.
    pub exp: i64,

    /// Unique token id, used for revocation. Absent on tokens minted by
    /// other JWT libraries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl CredentialClaims {
    pub fn new(sub: Identity, issued_at: DateTime<Utc>, lifetime_secs: i64) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub,
            iat: Some(iat),
            exp: iat.saturating_add(lifetime_secs),
            jti: Some(Uuid::now_v7().to_string()),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Deterministically validate the time window of already authenticated claims.
///
/// Expiry is a strict inequality: at exactly `exp` the credential is expired.
/// Sub-second precision of `now` is truncated, matching the claim resolution.
pub fn validate_claims(claims: &CredentialClaims, now: DateTime<Utc>) -> Result<(), Rejection> {
    if claims.iat.is_some_and(|iat| claims.exp <= iat) {
        return Err(Rejection::Malformed);
    }
    if now.timestamp() >= claims.exp {
        return Err(Rejection::Expired);
    }
    Ok(())
}
