//! Credential Authority: mints and verifies signed, time-bounded identity
//! assertions.
//!
//! - No IO
//! - No shared mutable state beyond the key ring and denylist
//! - Safe to clone and call from any number of threads

use std::sync::Arc;

use chrono::Duration;

use shutter_core::Identity;

use crate::claims::{validate_claims, CredentialClaims};
use crate::clock::{Clock, SystemClock};
use crate::config::{Algorithm, ConfigError, SigningConfig, SigningKey};
use crate::error::{IssueError, Rejection};
use crate::keys::KeyRing;
use crate::revocation::{InMemoryRevocationList, RevocationList};
use crate::token::{self, Credential, CredentialHeader};

#[derive(Debug, Clone)]
pub struct CredentialAuthority {
    algorithm: Algorithm,
    lifetime_secs: i64,
    keys: Arc<KeyRing>,
    clock: Arc<dyn Clock>,
    revocations: Arc<dyn RevocationList>,
}

impl CredentialAuthority {
    /// Build an authority on the system clock with a private in-memory denylist.
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            algorithm: config.algorithm(),
            lifetime_secs: config.lifetime_secs(),
            keys: Arc::new(KeyRing::from_config(config)),
            clock: Arc::new(SystemClock),
            revocations: Arc::new(InMemoryRevocationList::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_revocation_list(mut self, revocations: Arc<dyn RevocationList>) -> Self {
        self.revocations = revocations;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> Duration {
        Duration::seconds(self.lifetime_secs)
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Mint a credential asserting `identity`, valid for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<Credential, IssueError> {
        let now = self.clock.now();
        let keys = self.keys.snapshot();
        let (key_id, key) = keys.active();

        let claims = CredentialClaims::new(identity.clone(), now, self.lifetime_secs);
        let header = CredentialHeader::new(self.algorithm, key_id);
        let credential = token::encode(&header, &claims, self.algorithm, key)?;

        tracing::info!(
            subject = %identity,
            jti = claims.jti.as_deref().unwrap_or_default(),
            kid = key_id,
            exp = claims.exp,
            "credential issued"
        );

        Ok(credential)
    }

    /// Verify a presented token and return the identity it asserts.
    pub fn verify(&self, token: &str) -> Result<Identity, Rejection> {
        self.verify_claims(token).map(|claims| claims.sub)
    }

    /// Verify a presented token and return all of its claims.
    pub fn verify_claims(&self, token: &str) -> Result<CredentialClaims, Rejection> {
        self.check(token).inspect_err(|rejection| {
            tracing::debug!(reason = rejection.reason(), "credential rejected");
        })
    }

    fn check(&self, token: &str) -> Result<CredentialClaims, Rejection> {
        let now = self.clock.now();

        let raw = token::split(token).ok_or(Rejection::Malformed)?;
        let header: CredentialHeader =
            token::decode_segment(raw.header).ok_or(Rejection::Malformed)?;

        if header.alg != self.algorithm.as_str() {
            tracing::debug!(
                presented = %header.alg,
                configured = %self.algorithm,
                "credential algorithm does not match configuration"
            );
            return Err(Rejection::BadSignature);
        }

        let keys = self.keys.snapshot();
        let key = keys
            .find(header.kid.as_deref(), now)
            .ok_or(Rejection::BadSignature)?;

        if !token::verify_tag(self.algorithm, key, &raw) {
            return Err(Rejection::BadSignature);
        }

        let claims: CredentialClaims =
            token::decode_segment(raw.claims).ok_or(Rejection::Malformed)?;
        validate_claims(&claims, now)?;

        if let Some(jti) = claims.jti.as_deref() {
            if self.revocations.is_revoked(jti, now) {
                return Err(Rejection::Revoked);
            }
        }

        Ok(claims)
    }

    /// Invalidate a valid credential before its natural expiry.
    ///
    /// Only credentials carrying a token id can be revoked; others are
    /// rejected as `Malformed`.
    pub fn revoke(&self, token: &str) -> Result<(), Rejection> {
        let claims = self.verify_claims(token)?;
        let jti = claims.jti.as_deref().ok_or(Rejection::Malformed)?;

        self.revocations.revoke(jti, claims.exp);
        self.revocations.purge_expired(self.clock.now());
        tracing::info!(subject = %claims.sub, jti, "credential revoked");
        Ok(())
    }

    /// Switch signing to a new key. Tokens signed by the outgoing key keep
    /// verifying for `grace`.
    pub fn rotate_key(
        &self,
        key_id: impl Into<String>,
        key: SigningKey,
        grace: Duration,
    ) -> Result<(), ConfigError> {
        let key_id = key_id.into();
        self.keys.rotate(key_id.clone(), key, grace, self.clock.now())?;
        tracing::info!(kid = %key_id, grace_secs = grace.num_seconds(), "signing key rotated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::DEFAULT_SIGNING_KEY;

    const T0: i64 = 1_700_000_000;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    fn config(key: &str, lifetime: i64) -> SigningConfig {
        SigningConfig::new(key, Algorithm::HS256, lifetime).unwrap()
    }

    fn authority_at(config: &SigningConfig, clock: &Arc<ManualClock>) -> CredentialAuthority {
        CredentialAuthority::new(config).with_clock(clock.clone())
    }

    fn reencode_header(token: &str, header: &str) -> String {
        let rest = token.split_once('.').unwrap().1;
        format!("{}.{rest}", URL_SAFE_NO_PAD.encode(header))
    }

    #[test]
    fn alice_scenario() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 3600), &clock);

        let token = authority.issue(&alice()).unwrap();

        clock.set(chrono::DateTime::from_timestamp(T0 + 10, 0).unwrap());
        assert_eq!(authority.verify(token.as_str()), Ok(alice()));

        clock.set(chrono::DateTime::from_timestamp(T0 + 3601, 0).unwrap());
        assert_eq!(authority.verify(token.as_str()), Err(Rejection::Expired));

        assert_eq!(authority.verify("not-a-token"), Err(Rejection::Malformed));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 60), &clock);
        let token = authority.issue(&alice()).unwrap();

        clock.advance(Duration::seconds(59));
        assert_eq!(authority.verify(token.as_str()), Ok(alice()));

        clock.advance(Duration::seconds(1));
        assert_eq!(authority.verify(token.as_str()), Err(Rejection::Expired));
    }

    #[test]
    fn claims_carry_issue_and_expiry() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 3600), &clock);
        let token = authority.issue(&alice()).unwrap();

        let claims = authority.verify_claims(token.as_str()).unwrap();
        assert_eq!(claims.iat, Some(T0));
        assert_eq!(claims.exp, T0 + 3600);
        assert!(claims.jti.is_some());
    }

    #[test]
    fn each_issue_gets_a_distinct_token_id() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 3600), &clock);

        let a = authority.verify_claims(authority.issue(&alice()).unwrap().as_str()).unwrap();
        let b = authority.verify_claims(authority.issue(&alice()).unwrap().as_str()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn garbage_inputs_are_malformed() {
        let authority = CredentialAuthority::new(&config("test-secret", 60));
        for input in ["", ".", "..", "a.b", "%%%.eyJ9.sig", "e30"] {
            assert_eq!(authority.verify(input), Err(Rejection::Malformed), "{input:?}");
        }
    }

    #[test]
    fn foreign_algorithm_in_header_is_refused() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 60), &clock);
        let token = authority.issue(&alice()).unwrap();

        for header in [
            r#"{"alg":"HS512","typ":"JWT","kid":"primary"}"#,
            r#"{"alg":"none","typ":"JWT","kid":"primary"}"#,
            r#"{"alg":"hs256","typ":"JWT","kid":"primary"}"#,
        ] {
            let forged = reencode_header(token.as_str(), header);
            assert_eq!(authority.verify(&forged), Err(Rejection::BadSignature), "{header}");
        }
    }

    #[test]
    fn unsigned_token_is_refused() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 60), &clock);
        let token = authority.issue(&alice()).unwrap();

        let (signing_input, _) = token.as_str().rsplit_once('.').unwrap();
        let stripped = format!("{signing_input}.");
        assert_eq!(authority.verify(&stripped), Err(Rejection::BadSignature));
    }

    #[test]
    fn unknown_key_id_is_bad_signature() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 60), &clock);
        let token = authority.issue(&alice()).unwrap();

        let forged = reencode_header(token.as_str(), r#"{"alg":"HS256","kid":"ghost"}"#);
        assert_eq!(authority.verify(&forged), Err(Rejection::BadSignature));
    }

    #[test]
    fn shared_configuration_forms_one_trust_domain() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let auth_service = authority_at(&config("shared", 3600), &clock);
        let photo_service = authority_at(&config("shared", 3600), &clock);
        let outsider = authority_at(&config("different", 3600), &clock);

        let token = auth_service.issue(&alice()).unwrap();
        assert_eq!(photo_service.verify(token.as_str()), Ok(alice()));
        assert_eq!(outsider.verify(token.as_str()), Err(Rejection::BadSignature));

        let token = outsider.issue(&alice()).unwrap();
        assert_eq!(auth_service.verify(token.as_str()), Err(Rejection::BadSignature));
    }

    #[test]
    fn revoked_token_is_rejected_but_others_survive() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("test-secret", 3600), &clock);

        let revoked = authority.issue(&alice()).unwrap();
        let kept = authority.issue(&alice()).unwrap();

        authority.revoke(revoked.as_str()).unwrap();
        assert_eq!(authority.verify(revoked.as_str()), Err(Rejection::Revoked));
        assert_eq!(authority.verify(kept.as_str()), Ok(alice()));

        // Revocation is shared by clones (same trust-domain process).
        let clone = authority.clone();
        assert_eq!(clone.verify(revoked.as_str()), Err(Rejection::Revoked));
    }

    #[test]
    fn revoking_an_invalid_token_fails() {
        let authority = CredentialAuthority::new(&config("test-secret", 60));
        assert_eq!(authority.revoke("not-a-token"), Err(Rejection::Malformed));
    }

    #[test]
    fn rotation_with_unbounded_grace_is_refused() {
        let authority = CredentialAuthority::new(&config("test-secret", 60));
        let token = authority.issue(&alice()).unwrap();

        let err = authority
            .rotate_key("next", SigningKey::new("new-secret").unwrap(), Duration::MAX)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(authority.verify(token.as_str()), Ok(alice()));
    }

    #[test]
    fn rotation_keeps_old_tokens_alive_for_grace_window() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let authority = authority_at(&config("old-secret", 3600), &clock);
        let old_token = authority.issue(&alice()).unwrap();

        authority
            .rotate_key("next", SigningKey::new("new-secret").unwrap(), Duration::seconds(300))
            .unwrap();
        let new_token = authority.issue(&alice()).unwrap();

        let header: CredentialHeader =
            token::decode_segment(token::split(new_token.as_str()).unwrap().header).unwrap();
        assert_eq!(header.kid.as_deref(), Some("next"));

        clock.advance(Duration::seconds(299));
        assert_eq!(authority.verify(old_token.as_str()), Ok(alice()));

        clock.advance(Duration::seconds(1));
        assert_eq!(authority.verify(old_token.as_str()), Err(Rejection::BadSignature));
        assert_eq!(authority.verify(new_token.as_str()), Ok(alice()));
    }

    #[test]
    fn previous_keys_from_configuration_verify_but_never_sign() {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let legacy = authority_at(&config("old-secret", 3600), &clock);
        let old_token = legacy.issue(&alice()).unwrap();

        let rotated = config("new-secret", 3600)
            .with_key_id("2025")
            .unwrap()
            .with_previous_key("primary", "old-secret")
            .unwrap();
        let authority = authority_at(&rotated, &clock);

        assert_eq!(authority.verify(old_token.as_str()), Ok(alice()));

        let fresh = authority.issue(&alice()).unwrap();
        assert_eq!(legacy.verify(fresh.as_str()), Err(Rejection::BadSignature));
    }

    #[test]
    fn default_key_still_works_but_is_flagged() {
        let config = config(DEFAULT_SIGNING_KEY, 60);
        assert!(config.uses_default_key());
        let authority = CredentialAuthority::new(&config);
        let token = authority.issue(&alice()).unwrap();
        assert_eq!(authority.verify(token.as_str()), Ok(alice()));
    }

    #[test]
    fn authority_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CredentialAuthority>();
    }
}
