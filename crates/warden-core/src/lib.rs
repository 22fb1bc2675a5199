//! # Warden Core - Layer 1: Foundation
//!
//! **Purpose**: Shared vocabulary for every Warden crate.
//!
//! This crate defines the unified error type, the effect traits the credential
//! backend talks through, the keyed hashing used to store secret identifiers,
//! and the startup configuration.
//!
//! # Architecture Constraints
//!
//! - YES Effect trait definitions (`StorageEffects`, `PhysicalTimeEffects`)
//! - YES Pure, synchronous helpers (hashing, configuration validation)
//! - NO effect handler implementations (those live in `warden-effects`)
//! - NO authentication logic (that's `warden-appgroup`)

#![forbid(unsafe_code)]

/// Startup configuration and loading traits
pub mod config;

/// Effect trait definitions
pub mod effects;

/// Unified error type
pub mod errors;

/// Keyed hashing of secret identifiers
pub mod hash;

pub use config::{BackendConfig, WardenConfig};
pub use errors::{Result, WardenError};
pub use hash::{HmacSha256Hasher, SecretIdHasher};
