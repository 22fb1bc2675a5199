//! Storage effect handlers
//!
//! - [`MemoryStorageHandler`]: process-local map, suitable for single-node hosts
//! - [`FilesystemStorageHandler`]: one `.dat` file per key under a base directory
//! - [`TimeoutStorageHandler`]: bounds every call of an inner handler

mod filesystem;
mod memory;
mod timeout;

pub use filesystem::FilesystemStorageHandler;
pub use memory::MemoryStorageHandler;
pub use timeout::TimeoutStorageHandler;
