//! Compact token encoding: `base64url(header).base64url(claims).base64url(tag)`.
//!
//! This is the JWS compact serialization with an HMAC tag, so any JWT
//! library holding the same key can read tokens minted here. The encoding is
//! URL-safe and self-describing; a verifier needs only the signing
//! configuration.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};

use crate::claims::CredentialClaims;
use crate::config::{Algorithm, SigningKey};
use crate::error::IssueError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// An encoded, signed credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl AsRef<str> for Credential {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// JOSE header. `alg` is kept as a raw string so foreign values can be seen
/// and refused rather than failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialHeader {
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl CredentialHeader {
    pub fn new(algorithm: Algorithm, key_id: &str) -> Self {
        Self {
            alg: algorithm.as_str().to_string(),
            typ: Some("JWT".to_string()),
            kid: Some(key_id.to_string()),
        }
    }
}

/// Borrowed segments of a token, not yet authenticated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawToken<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    /// `header.claims`, the bytes covered by the tag.
    pub signing_input: &'a str,
    pub signature: &'a str,
}

/// Split a token into its segments.
///
/// The signature is whatever follows the last `.`; everything before it is
/// the signing input. A stray `.` inside the claims or signature therefore
/// only ever breaks the tag, never the framing.
pub(crate) fn split(token: &str) -> Option<RawToken<'_>> {
    let (signing_input, signature) = token.rsplit_once('.')?;
    let (header, claims) = signing_input.split_once('.')?;
    if header.is_empty() {
        return None;
    }
    Some(RawToken {
        header,
        claims,
        signing_input,
        signature,
    })
}

pub(crate) fn decode_segment<T: DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub(crate) fn encode(
    header: &CredentialHeader,
    claims: &CredentialClaims,
    algorithm: Algorithm,
    key: &SigningKey,
) -> Result<Credential, IssueError> {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{claims}");
    let tag = sign(algorithm, key, signing_input.as_bytes())?;

    Ok(Credential(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(tag)
    )))
}

fn sign(algorithm: Algorithm, key: &SigningKey, input: &[u8]) -> Result<Vec<u8>, IssueError> {
    let tag = match algorithm {
        Algorithm::HS256 => {
            let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| IssueError::Key)?;
            mac.update(input);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS384 => {
            let mut mac = HmacSha384::new_from_slice(key.as_bytes()).map_err(|_| IssueError::Key)?;
            mac.update(input);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS512 => {
            let mut mac = HmacSha512::new_from_slice(key.as_bytes()).map_err(|_| IssueError::Key)?;
            mac.update(input);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(tag)
}

/// Check the tag of a raw token in constant time.
pub(crate) fn verify_tag(algorithm: Algorithm, key: &SigningKey, raw: &RawToken<'_>) -> bool {
    let Ok(tag) = URL_SAFE_NO_PAD.decode(raw.signature) else {
        return false;
    };
    let input = raw.signing_input.as_bytes();

    match algorithm {
        Algorithm::HS256 => HmacSha256::new_from_slice(key.as_bytes())
            .map(|mut mac| {
                mac.update(input);
                mac.verify_slice(&tag).is_ok()
            })
            .unwrap_or(false),
        Algorithm::HS384 => HmacSha384::new_from_slice(key.as_bytes())
            .map(|mut mac| {
                mac.update(input);
                mac.verify_slice(&tag).is_ok()
            })
            .unwrap_or(false),
        Algorithm::HS512 => HmacSha512::new_from_slice(key.as_bytes())
            .map(|mut mac| {
                mac.update(input);
                mac.verify_slice(&tag).is_ok()
            })
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use shutter_core::Identity;

    use super::*;

    fn sample(algorithm: Algorithm) -> (Credential, SigningKey) {
        let key = SigningKey::new("k").unwrap();
        let claims = CredentialClaims::new(
            Identity::new("alice").unwrap(),
            DateTime::from_timestamp(1_000, 0).unwrap(),
            60,
        );
        let token = encode(&CredentialHeader::new(algorithm, "primary"), &claims, algorithm, &key)
            .unwrap();
        (token, key)
    }

    #[test]
    fn token_has_three_url_safe_segments() {
        let (token, _) = sample(Algorithm::HS256);
        assert_eq!(token.as_str().split('.').count(), 3);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn header_names_algorithm_and_key() {
        let (token, _) = sample(Algorithm::HS384);
        let raw = split(token.as_str()).unwrap();
        let header: CredentialHeader = decode_segment(raw.header).unwrap();
        assert_eq!(header.alg, "HS384");
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.kid.as_deref(), Some("primary"));
    }

    #[test]
    fn tag_verifies_only_with_same_key_and_algorithm() {
        for algorithm in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let (token, key) = sample(algorithm);
            let raw = split(token.as_str()).unwrap();
            assert!(verify_tag(algorithm, &key, &raw));
            assert!(!verify_tag(algorithm, &SigningKey::new("other").unwrap(), &raw));
        }

        let (token, key) = sample(Algorithm::HS256);
        let raw = split(token.as_str()).unwrap();
        assert!(!verify_tag(Algorithm::HS512, &key, &raw));
    }

    #[test]
    fn split_requires_header_and_separators() {
        assert!(split("not-a-token").is_none());
        assert!(split("a.b").is_none());
        assert!(split(".b.c").is_none());

        let raw = split("h.c.with.dots").unwrap();
        assert_eq!(raw.header, "h");
        assert_eq!(raw.claims, "c.with");
        assert_eq!(raw.signing_input, "h.c.with");
        assert_eq!(raw.signature, "dots");
    }

    #[test]
    fn credential_debug_does_not_leak_token() {
        let (token, _) = sample(Algorithm::HS256);
        assert_eq!(format!("{token:?}"), "Credential(<redacted>)");
    }
}
