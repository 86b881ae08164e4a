//! Process configuration, loaded once at start from the environment.
//!
//! Every value has a development default. Relying on the defaults in
//! production is unsafe: the default `JWT_SECRET` is public knowledge, and
//! with `SHUTTER_ENV=production` it is refused outright.

use std::net::SocketAddr;

use shutter_auth::config::{DEFAULT_KEY_ID, DEFAULT_SIGNING_KEY, DEFAULT_TOKEN_LIFETIME_SECS};
use shutter_auth::secret::{DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM};
use shutter_auth::{Algorithm, ConfigError, HashParams, SigningConfig};
use zeroize::Zeroizing;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub signing: SigningConfig,
    pub hashing: HashParams,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("SHUTTER_ENV").as_deref().map(str::trim) {
            None | Some("development") | Some("dev") | Some("test") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::invalid(format!("unknown SHUTTER_ENV '{other}'")));
            }
        };

        let secret = Zeroizing::new(
            lookup("JWT_SECRET").unwrap_or_else(|| DEFAULT_SIGNING_KEY.to_string()),
        );

        let algorithm = match var("JWT_ALGORITHM") {
            Some(raw) => raw.parse::<Algorithm>()?,
            None => Algorithm::default(),
        };

        let lifetime = parse_or("TOKEN_EXPIRY_SECONDS", var("TOKEN_EXPIRY_SECONDS"), DEFAULT_TOKEN_LIFETIME_SECS)?;

        let mut signing = SigningConfig::new(secret.as_bytes(), algorithm, lifetime)?
            .with_key_id(var("JWT_KEY_ID").unwrap_or_else(|| DEFAULT_KEY_ID.to_string()))?;

        if let Some(previous) = var("JWT_PREVIOUS_KEYS").map(Zeroizing::new) {
            for (key_id, key) in parse_previous_keys(&previous)? {
                signing = signing.with_previous_key(key_id, key.as_bytes())?;
            }
        }

        if environment == Environment::Production {
            signing.ensure_production_ready()?;
        }

        let hashing = HashParams::new(
            parse_or("PASSWORD_HASH_MEMORY_KIB", var("PASSWORD_HASH_MEMORY_KIB"), DEFAULT_MEMORY_KIB)?,
            parse_or("PASSWORD_HASH_ITERATIONS", var("PASSWORD_HASH_ITERATIONS"), DEFAULT_ITERATIONS)?,
            parse_or("PASSWORD_HASH_PARALLELISM", var("PASSWORD_HASH_PARALLELISM"), DEFAULT_PARALLELISM)?,
        )?;

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(format!("BIND_ADDR: {e}")))?;

        Ok(Self {
            environment,
            signing,
            hashing,
            bind_addr,
        })
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(format!("{name}='{raw}': {e}"))),
        None => Ok(default),
    }
}

/// Parse `kid=secret,kid=secret`.
fn parse_previous_keys(raw: &str) -> Result<Vec<(String, Zeroizing<String>)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(kid, key)| (kid.trim().to_string(), Zeroizing::new(key.to_string())))
                .ok_or_else(|| ConfigError::invalid("JWT_PREVIOUS_KEYS entries must be 'kid=secret'"))
        })
        .collect()
}
