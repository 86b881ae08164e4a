//! Secret Verifier: one-way digests of plaintext secrets.
//!
//! Digests are Argon2id PHC strings. The per-secret salt and the work factor
//! travel inside the stored string, so a digest stays verifiable after the
//! configured parameters change.
//!
//! Unsalted SHA-256 hex digests (written by earlier deployments) are still
//! accepted by [`SecretHasher::verify`] and always report
//! [`SecretHasher::needs_rehash`], so callers can upgrade them on the next
//! successful login.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::ConfigError;

/// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret digest failed: {0}")]
    Digest(String),
}

/// Argon2id work factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    params: Params,
}

impl HashParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, ConfigError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            ConfigError::invalid(format!(
                "invalid secret hashing parameters (m={memory_kib}, t={iterations}, p={parallelism}): {e}"
            ))
        })?;
        Ok(Self { params })
    }

    pub fn memory_kib(&self) -> u32 {
        self.params.m_cost()
    }

    pub fn iterations(&self) -> u32 {
        self.params.t_cost()
    }

    pub fn parallelism(&self) -> u32 {
        self.params.p_cost()
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            params: Params::new(DEFAULT_MEMORY_KIB, DEFAULT_ITERATIONS, DEFAULT_PARALLELISM, None)
                .unwrap_or_default(),
        }
    }
}

/// Stored one-way digest of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretDigest(String);

impl SecretDigest {
    /// Wrap a digest loaded from an identity store.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_legacy(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecretHasher {
    params: HashParams,
}

impl SecretHasher {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HashParams {
        &self.params
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.params.params.clone())
    }

    /// Digest a secret under a fresh random salt.
    ///
    /// Only fails for inputs Argon2 cannot take (larger than 4 GiB).
    pub fn digest(&self, plaintext: &[u8]) -> Result<SecretDigest, SecretError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hash(plaintext, &salt)
    }

    /// Deterministic digest: the same plaintext and salt always give the
    /// same digest. `salt` must be 4 to 48 bytes.
    pub fn digest_with_salt(&self, plaintext: &[u8], salt: &[u8]) -> Result<SecretDigest, SecretError> {
        let salt = SaltString::encode_b64(salt).map_err(|e| SecretError::Digest(e.to_string()))?;
        self.hash(plaintext, &salt)
    }

    fn hash(&self, plaintext: &[u8], salt: &SaltString) -> Result<SecretDigest, SecretError> {
        let hash = self
            .argon2()
            .hash_password(plaintext, salt)
            .map_err(|e| SecretError::Digest(e.to_string()))?;
        Ok(SecretDigest(hash.to_string()))
    }

    /// Whether `plaintext` matches `digest`. Never fails: an unreadable
    /// digest simply does not match.
    pub fn verify(&self, plaintext: &[u8], digest: &SecretDigest) -> bool {
        if digest.is_legacy() {
            let computed = legacy_digest(plaintext);
            let stored = digest.as_str().to_ascii_lowercase();
            return computed.as_bytes().ct_eq(stored.as_bytes()).into();
        }

        match PasswordHash::new(digest.as_str()) {
            Ok(parsed) => self.argon2().verify_password(plaintext, &parsed).is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "stored secret digest is unreadable");
                false
            }
        }
    }

    /// Whether `digest` should be replaced by a fresh one under the current
    /// parameters (legacy format, other algorithm, or other work factor).
    pub fn needs_rehash(&self, digest: &SecretDigest) -> bool {
        if digest.is_legacy() {
            return true;
        }

        let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
            return true;
        };
        if parsed.algorithm != argon2::Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.memory_kib()
                    || stored.t_cost() != self.params.iterations()
                    || stored.p_cost() != self.params.parallelism()
            }
            Err(_) => true,
        }
    }
}

/// Unsalted SHA-256 lowercase hex, the pre-Argon2 storage format.
fn legacy_digest(plaintext: &[u8]) -> String {
    format!("{:x}", Sha256::digest(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> SecretHasher {
        SecretHasher::new(HashParams::new(64, 1, 1).unwrap())
    }

    #[test]
    fn digest_verifies_original_and_rejects_others() {
        let h = hasher();
        let digest = h.digest(b"secret").unwrap();

        assert!(digest.as_str().starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
        assert!(h.verify(b"secret", &digest));
        assert!(!h.verify(b"wrong", &digest));
        assert!(!h.verify(b"", &digest));
    }

    #[test]
    fn fixed_salt_is_deterministic() {
        let h = hasher();
        let a = h.digest_with_salt(b"secret", b"0123456789abcdef").unwrap();
        let b = h.digest_with_salt(b"secret", b"0123456789abcdef").unwrap();
        assert_eq!(a, b);

        let c = h.digest_with_salt(b"secret", b"fedcba9876543210").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn random_salts_differ_but_both_verify() {
        let h = hasher();
        let a = h.digest(b"secret").unwrap();
        let b = h.digest(b"secret").unwrap();
        assert_ne!(a, b);
        assert!(h.verify(b"secret", &a));
        assert!(h.verify(b"secret", &b));
    }

    #[test]
    fn digest_never_contains_plaintext() {
        let h = hasher();
        let digest = h.digest(b"hunter2-hunter2").unwrap();
        assert!(!digest.as_str().contains("hunter2"));
    }

    #[test]
    fn digests_from_other_work_factors_still_verify() {
        let old = SecretHasher::new(HashParams::new(32, 1, 1).unwrap());
        let digest = old.digest(b"secret").unwrap();

        let current = hasher();
        assert!(current.verify(b"secret", &digest));
        assert!(current.needs_rehash(&digest));
        assert!(!old.needs_rehash(&digest));
    }

    #[test]
    fn legacy_sha256_digest_is_accepted_and_flagged() {
        let h = hasher();
        // sha256("secret")
        let legacy = SecretDigest::from_stored(
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b",
        );
        assert!(legacy.is_legacy());
        assert!(h.verify(b"secret", &legacy));
        assert!(!h.verify(b"wrong", &legacy));
        assert!(h.needs_rehash(&legacy));

        let upper = SecretDigest::from_stored(legacy.as_str().to_ascii_uppercase());
        assert!(h.verify(b"secret", &upper));
    }

    #[test]
    fn unreadable_digest_never_matches() {
        let h = hasher();
        for stored in ["", "plaintext", "$argon2id$garbage", "$2b$12$notbcrypt"] {
            let digest = SecretDigest::from_stored(stored);
            assert!(!h.verify(b"plaintext", &digest), "{stored:?}");
            assert!(h.needs_rehash(&digest));
        }
    }

    #[test]
    fn invalid_params_are_misconfiguration() {
        assert!(matches!(HashParams::new(0, 1, 1), Err(ConfigError::Invalid(_))));
        assert!(matches!(HashParams::new(64, 0, 1), Err(ConfigError::Invalid(_))));
        assert!(matches!(HashParams::new(64, 1, 0), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn short_salt_is_refused() {
        assert!(hasher().digest_with_salt(b"secret", b"ab").is_err());
    }

    #[test]
    fn default_params_follow_owasp_baseline() {
        let p = HashParams::default();
        assert_eq!(p.memory_kib(), DEFAULT_MEMORY_KIB);
        assert_eq!(p.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(p.parallelism(), DEFAULT_PARALLELISM);
    }
}
