use thiserror::Error;

/// Why a presented credential was not accepted.
///
/// The variant is for internal diagnostics only. Callers at a trust boundary
/// must collapse every variant into one "unauthenticated" response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Not a token at all: wrong shape, bad encoding, or unreadable claims.
    #[error("malformed credential")]
    Malformed,

    /// Signature does not verify under an accepted key with the configured
    /// algorithm (also covers foreign algorithms and unknown key ids).
    #[error("credential signature does not verify")]
    BadSignature,

    #[error("credential has expired")]
    Expired,

    #[error("credential has been revoked")]
    Revoked,
}

impl Rejection {
    /// Stable short name for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed",
            Rejection::BadSignature => "bad_signature",
            Rejection::Expired => "expired",
            Rejection::Revoked => "revoked",
        }
    }
}

/// Failure to mint a credential.
///
/// With a validated `SigningConfig` neither variant is reachable in practice;
/// they exist so that encoding stays panic-free.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to encode credential: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("signing key rejected by MAC")]
    Key,
}
