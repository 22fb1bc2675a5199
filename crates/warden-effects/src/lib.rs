//! # Warden Effects - Layer 2: Effect Handlers
//!
//! Production implementations of the effect traits declared in `warden-core`.
//!
//! **Layer Constraint**: NO mock handlers - those belong in `warden-testkit`.
//! The in-memory storage handler is a real backend for single-process hosts,
//! not a mock.

#![forbid(unsafe_code)]

pub mod storage;
pub mod time;

pub use storage::{FilesystemStorageHandler, MemoryStorageHandler, TimeoutStorageHandler};
pub use time::RealTimeHandler;
