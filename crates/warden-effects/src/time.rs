//! Time effect handler
//!
//! Stateless implementation of `PhysicalTimeEffects` backed by the system
//! clock. Deterministic clocks belong in `warden-testkit`.

use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};
use warden_core::effects::{PhysicalTimeEffects, TimeError};

/// Real time handler for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn now_secs(&self) -> Result<u64, TimeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| TimeError::OperationFailed {
                reason: format!("System clock before Unix epoch: {e}"),
            })
    }
}
