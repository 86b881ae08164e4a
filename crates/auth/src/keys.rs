//! Signing key ring with graceful rotation.
//!
//! The ring holds one active key (used to sign and verify) and any number of
//! previous keys that still verify until their `retire_at` instant. Rotation
//! swaps the whole set behind an `Arc`, so concurrent readers always see a
//! complete snapshot and never a half-installed key.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::config::{ConfigError, SigningConfig, SigningKey};

#[derive(Debug, Clone)]
struct RetiringKey {
    key_id: String,
    key: SigningKey,
    /// `None` keeps the key until the process restarts.
    retire_at: Option<DateTime<Utc>>,
}

/// Immutable snapshot of the keys accepted at one point in time.
#[derive(Debug, Clone)]
pub struct KeySet {
    active_id: String,
    active: SigningKey,
    previous: Vec<RetiringKey>,
}

impl KeySet {
    pub fn active(&self) -> (&str, &SigningKey) {
        (&self.active_id, &self.active)
    }

    /// Key to verify a token with. A token without `kid` may only use the
    /// active key.
    pub fn find(&self, key_id: Option<&str>, now: DateTime<Utc>) -> Option<&SigningKey> {
        let Some(key_id) = key_id else {
            return Some(&self.active);
        };

        if key_id == self.active_id {
            return Some(&self.active);
        }

        self.previous
            .iter()
            .find(|k| k.key_id == key_id && k.retire_at.is_none_or(|at| now < at))
            .map(|k| &k.key)
    }

    /// Ids of every key that verifies at `now`, active first.
    pub fn accepted_ids(&self, now: DateTime<Utc>) -> Vec<&str> {
        std::iter::once(self.active_id.as_str())
            .chain(
                self.previous
                    .iter()
                    .filter(|k| k.retire_at.is_none_or(|at| now < at))
                    .map(|k| k.key_id.as_str()),
            )
            .collect()
    }

    fn contains(&self, key_id: &str) -> bool {
        self.active_id == key_id || self.previous.iter().any(|k| k.key_id == key_id)
    }
}

#[derive(Debug)]
pub struct KeyRing {
    current: RwLock<Arc<KeySet>>,
}

impl KeyRing {
    pub fn new(key_id: impl Into<String>, key: SigningKey) -> Self {
        Self {
            current: RwLock::new(Arc::new(KeySet {
                active_id: key_id.into(),
                active: key,
                previous: Vec::new(),
            })),
        }
    }

    pub fn from_config(config: &SigningConfig) -> Self {
        let previous = config
            .previous_keys()
            .iter()
            .map(|p| RetiringKey {
                key_id: p.key_id.clone(),
                key: p.key.clone(),
                retire_at: None,
            })
            .collect();

        Self {
            current: RwLock::new(Arc::new(KeySet {
                active_id: config.key_id().to_string(),
                active: config.key().clone(),
                previous,
            })),
        }
    }

    pub fn snapshot(&self) -> Arc<KeySet> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Install `key` as the active signing key.
    ///
    /// The outgoing key keeps verifying until `now + grace`. Keys whose grace
    /// window already ended are dropped from the ring.
    pub fn rotate(
        &self,
        key_id: impl Into<String>,
        key: SigningKey,
        grace: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), ConfigError> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(ConfigError::EmptyKeyId);
        }
        let retire_at = now
            .checked_add_signed(grace)
            .ok_or_else(|| ConfigError::invalid("rotation grace period out of range"))?;

        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.contains(&key_id) {
            return Err(ConfigError::DuplicateKeyId(key_id));
        }

        let mut previous: Vec<RetiringKey> = guard
            .previous
            .iter()
            .filter(|k| k.retire_at.is_none_or(|at| now < at))
            .cloned()
            .collect();
        previous.push(RetiringKey {
            key_id: guard.active_id.clone(),
            key: guard.active.clone(),
            retire_at: Some(retire_at),
        });

        *guard = Arc::new(KeySet {
            active_id: key_id,
            active: key,
            previous,
        });

        Ok(())
    }
}
