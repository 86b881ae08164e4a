//! Signing configuration shared by every service in a trust domain.
//!
//! Every process that issues or verifies credentials for the same trust
//! domain must be built from an identical `SigningConfig`; any divergence
//! makes cross-service verification fail with `BadSignature`.
//!
//! Nothing in this module reads the environment. The process edge
//! (`shutter-api::config`) loads values and passes them through the
//! validating constructors here.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Well-known development key. Never use it outside local development.
pub const DEFAULT_SIGNING_KEY: &str = "defaultsecret";

/// Default token lifetime (one hour).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Upper bound on token lifetime (one year).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;

/// Key id used when none is configured.
pub const DEFAULT_KEY_ID: &str = "primary";

/// Misconfiguration detected while building the signing or hashing setup.
///
/// These are fatal at process start: a service must refuse to serve rather
/// than fail per request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("misconfiguration: signing key must not be empty")]
    EmptyKey,

    #[error("misconfiguration: key id must not be empty")]
    EmptyKeyId,

    #[error("misconfiguration: duplicate key id '{0}'")]
    DuplicateKeyId(String),

    #[error("misconfiguration: unsupported signing algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("misconfiguration: token lifetime must be between 1 and {max} seconds (got {0})", max = MAX_TOKEN_LIFETIME_SECS)]
    InvalidLifetime(i64),

    #[error("misconfiguration: the default signing key is not allowed in production")]
    DefaultKeyInProduction,

    #[error("misconfiguration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Symmetric MAC algorithms accepted for credential signatures.
///
/// Exactly one is configured per trust domain; verification never consults
/// the algorithm named inside a presented token to pick another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Algorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl Algorithm {
    /// JOSE name of the algorithm (as written in the token header).
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
        }
    }
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(ConfigError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Secret key material for the MAC. Zeroed on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn is_default(&self) -> bool {
        self.as_bytes() == DEFAULT_SIGNING_KEY.as_bytes()
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.0.len())
    }
}

/// A verification-only key kept around while outstanding tokens drain.
#[derive(Debug, Clone)]
pub struct PreviousKey {
    pub key_id: String,
    pub key: SigningKey,
}

/// Process-wide signing parameters.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    key_id: String,
    key: SigningKey,
    algorithm: Algorithm,
    lifetime_secs: i64,
    previous: Vec<PreviousKey>,
}

impl SigningConfig {
    pub fn new(
        key: impl Into<Vec<u8>>,
        algorithm: Algorithm,
        lifetime_secs: i64,
    ) -> Result<Self, ConfigError> {
        let key = SigningKey::new(key)?;
        if !(1..=MAX_TOKEN_LIFETIME_SECS).contains(&lifetime_secs) {
            return Err(ConfigError::InvalidLifetime(lifetime_secs));
        }

        let config = Self {
            key_id: DEFAULT_KEY_ID.to_string(),
            key,
            algorithm,
            lifetime_secs,
            previous: Vec::new(),
        };

        if config.uses_default_key() {
            tracing::warn!(
                "signing key is the built-in development default; tokens can be forged by anyone who knows it"
            );
        }

        Ok(config)
    }

    /// Set the key id written into every issued token header.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Result<Self, ConfigError> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(ConfigError::EmptyKeyId);
        }
        if self.previous.iter().any(|p| p.key_id == key_id) {
            return Err(ConfigError::DuplicateKeyId(key_id));
        }
        self.key_id = key_id;
        Ok(self)
    }

    /// Accept tokens signed by an older key (verification only).
    pub fn with_previous_key(
        mut self,
        key_id: impl Into<String>,
        key: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(ConfigError::EmptyKeyId);
        }
        if key_id == self.key_id || self.previous.iter().any(|p| p.key_id == key_id) {
            return Err(ConfigError::DuplicateKeyId(key_id));
        }
        self.previous.push(PreviousKey {
            key_id,
            key: SigningKey::new(key)?,
        });
        Ok(self)
    }

    /// Reject the development key when running in production.
    pub fn ensure_production_ready(&self) -> Result<(), ConfigError> {
        if self.uses_default_key() {
            return Err(ConfigError::DefaultKeyInProduction);
        }
        Ok(())
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    pub fn previous_keys(&self) -> &[PreviousKey] {
        &self.previous
    }

    pub fn uses_default_key(&self) -> bool {
        self.key.is_default()
    }
}
