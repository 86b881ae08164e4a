//! Registration and login flows composed from the Secret Verifier and the
//! Credential Authority.
//!
//! The identity store is injected; this module never decides where digests
//! live.

use std::sync::Arc;

use thiserror::Error;

use shutter_core::{DomainError, Identity, IdentityStore};

use crate::authority::CredentialAuthority;
use crate::error::IssueError;
use crate::secret::{SecretDigest, SecretError, SecretHasher};
use crate::token::Credential;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown identity or wrong secret; callers cannot tell which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity already exists")]
    AlreadyExists,

    #[error("invalid identity: {0}")]
    InvalidIdentity(DomainError),

    #[error("identity store failure: {0}")]
    Store(DomainError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Issue(#[from] IssueError),
}

pub struct AccountService<S> {
    store: S,
    hasher: Arc<SecretHasher>,
    authority: CredentialAuthority,
    /// Verified against when the identity is unknown, so that both failure
    /// paths cost one digest computation.
    decoy: SecretDigest,
}

impl<S> AccountService<S>
where
    S: IdentityStore<SecretDigest>,
{
    pub fn new(
        store: S,
        hasher: Arc<SecretHasher>,
        authority: CredentialAuthority,
    ) -> Result<Self, SecretError> {
        let decoy = hasher.digest(b"decoy secret for unknown identities")?;
        Ok(Self {
            store,
            hasher,
            authority,
            decoy,
        })
    }

    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an identity with the given secret and return a fresh credential.
    pub fn register(&self, username: &str, password: &str) -> Result<Credential, AccountError> {
        let identity = Identity::new(username).map_err(AccountError::InvalidIdentity)?;
        if self.store.exists(&identity) {
            return Err(AccountError::AlreadyExists);
        }

        let digest = self.hasher.digest(password.as_bytes())?;
        self.store
            .create(identity.clone(), digest)
            .map_err(|e| match e {
                DomainError::Conflict(_) => AccountError::AlreadyExists,
                other => AccountError::Store(other),
            })?;

        tracing::info!(subject = %identity, "identity registered");
        Ok(self.authority.issue(&identity)?)
    }

    /// Check a secret against the stored digest and return a fresh credential.
    ///
    /// Outdated digests (legacy SHA-256 or an older work factor) are replaced
    /// after a successful check.
    pub fn login(&self, username: &str, password: &str) -> Result<Credential, AccountError> {
        let stored = Identity::new(username)
            .ok()
            .and_then(|identity| self.store.get(&identity).map(|digest| (identity, digest)));

        let Some((identity, digest)) = stored else {
            std::hint::black_box(self.hasher.verify(password.as_bytes(), &self.decoy));
            tracing::debug!("login rejected: unknown identity");
            return Err(AccountError::InvalidCredentials);
        };

        if !self.hasher.verify(password.as_bytes(), &digest) {
            tracing::debug!(subject = %identity, "login rejected: secret mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        if self.hasher.needs_rehash(&digest) {
            self.upgrade_digest(&identity, password);
        }

        Ok(self.authority.issue(&identity)?)
    }

    fn upgrade_digest(&self, identity: &Identity, password: &str) {
        let result = self
            .hasher
            .digest(password.as_bytes())
            .map_err(AccountError::from)
            .and_then(|fresh| {
                self.store
                    .put(identity.clone(), fresh)
                    .map_err(AccountError::Store)
            });

        match result {
            Ok(()) => tracing::info!(subject = %identity, "secret digest upgraded"),
            Err(e) => tracing::warn!(subject = %identity, error = %e, "secret digest upgrade failed"),
        }
    }
}
