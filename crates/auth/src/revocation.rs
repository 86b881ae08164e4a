use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

/// Denylist of revoked token ids.
///
/// An entry only needs to live until the token's own expiry; after that the
/// token is rejected as expired anyway.
pub trait RevocationList: Send + Sync + core::fmt::Debug {
    fn revoke(&self, token_id: &str, expires_at: i64);
    fn is_revoked(&self, token_id: &str, now: DateTime<Utc>) -> bool;
    /// Drop entries whose token has expired. Returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// In-memory denylist for a single process.
#[derive(Debug, Default)]
pub struct InMemoryRevocationList {
    inner: RwLock<HashMap<String, i64>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevocationList for InMemoryRevocationList {
    fn revoke(&self, token_id: &str, expires_at: i64) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(token_id.to_string(), expires_at);
        }
    }

    fn is_revoked(&self, token_id: &str, now: DateTime<Utc>) -> bool {
        match self.inner.read() {
            Ok(map) => map
                .get(token_id)
                .is_some_and(|exp| now.timestamp() < *exp),
            // Fail closed: a poisoned denylist cannot vouch for any token.
            Err(_) => true,
        }
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut map) = self.inner.write() else {
            return 0;
        };
        let before = map.len();
        let now = now.timestamp();
        map.retain(|_, exp| now < *exp);
        before - map.len()
    }
}
