//! Physical time effect trait
//!
//! SecretID expiration is measured in whole Unix seconds. Tests substitute a
//! settable clock so expiry can be exercised without sleeping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Clock failure. Always fatal: expiry cannot be judged without a clock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// No clock source is available
    #[error("Time service unavailable")]
    ServiceUnavailable,
    /// The clock returned an unusable reading
    #[error("Operation failed: {reason}")]
    OperationFailed {
        /// Clock diagnostic
        reason: String,
    },
}

/// Wall-clock source used for SecretID expiry and lease deadlines
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current Unix timestamp in seconds.
    async fn now_secs(&self) -> Result<u64, TimeError>;
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for std::sync::Arc<T> {
    async fn now_secs(&self) -> Result<u64, TimeError> {
        (**self).now_secs().await
    }
}

impl From<TimeError> for crate::WardenError {
    fn from(err: TimeError) -> Self {
        Self::internal(err.to_string())
    }
}
