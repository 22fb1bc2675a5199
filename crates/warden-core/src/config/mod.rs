//! Configuration for the Warden credential backend
//!
//! Configuration is read once at startup and never mutated afterwards; the
//! backend context holds its own copy.

mod backend;
mod traits;

pub use backend::BackendConfig;
pub use traits::WardenConfig;
