//! Effect trait definitions
//!
//! The credential backend never touches a database, a filesystem or the
//! system clock directly. It goes through these traits, and the host (or a
//! test) picks the handlers.
//!
//! - `StorageEffects`: key/value storage of opaque byte blobs
//! - `PhysicalTimeEffects`: wall-clock Unix seconds for expiration checks
//!
//! Production handlers live in `warden-effects`; deterministic and
//! fault-injecting handlers live in `warden-testkit`.

pub mod storage;
pub mod time;

pub use storage::{StorageEffects, StorageError};
pub use time::{PhysicalTimeEffects, TimeError};
