//! `shutter-core`: shared building blocks for the credential services.
//!
//! This crate contains **pure domain** primitives (no crypto, no transport).

pub mod error;
pub mod identity;
pub mod store;

pub use error::{DomainError, DomainResult};
pub use identity::Identity;
pub use store::{IdentityStore, InMemoryIdentityStore};
