//! Settable physical clock

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use warden_core::effects::{PhysicalTimeEffects, TimeError};

/// A physical clock that only moves when told to
///
/// Clones share the same time, so a test can hand one clone to the backend
/// and advance the other.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start` Unix seconds
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Current reading
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Move the clock forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute reading
    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2024-01-01T00:00:00Z
        Self::new(1_704_067_200)
    }
}

#[async_trait]
impl PhysicalTimeEffects for ManualClock {
    async fn now_secs(&self) -> Result<u64, TimeError> {
        Ok(self.now())
    }
}
