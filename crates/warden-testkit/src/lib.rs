//! Warden Testing Infrastructure
//!
//! Deterministic and fault-injecting effect handlers plus logging setup for
//! tests across the workspace.
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! warden-testkit = { path = "../warden-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod storage;
pub mod tracing_init;

pub use clock::ManualClock;
pub use storage::{FailingStorageHandler, FailureMode};
pub use tracing_init::init_test_tracing;

/// Salt used by test backends
pub const TEST_SALT: &str = "warden-test-salt";
