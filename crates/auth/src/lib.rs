//! `shutter-auth`: credential issuance and verification (the trust core).
//!
//! Two responsibilities:
//! - **Secret Verifier** ([`secret`]): digests and checks plaintext secrets.
//! - **Credential Authority** ([`authority`]): mints and verifies signed,
//!   time-bounded identity assertions.
//!
//! This crate is intentionally decoupled from HTTP, storage and the process
//! environment. Configuration is injected through validated constructors.

pub mod accounts;
pub mod authority;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod revocation;
pub mod secret;
pub mod token;

pub use accounts::{AccountError, AccountService};
pub use authority::CredentialAuthority;
pub use claims::{validate_claims, CredentialClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Algorithm, ConfigError, SigningConfig, SigningKey};
pub use error::{IssueError, Rejection};
pub use keys::{KeyRing, KeySet};
pub use revocation::{InMemoryRevocationList, RevocationList};
pub use secret::{HashParams, SecretDigest, SecretError, SecretHasher};
pub use token::{Credential, CredentialHeader};
