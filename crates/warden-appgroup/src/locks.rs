//! Striped locks over SecretID records
//!
//! The read-decrement-write of a record must be exclusive per record. A
//! fixed set of stripes, picked by the record's hashed id, gives that
//! guarantee without a lock map that grows with every issued secret.

use tokio::sync::{Mutex, MutexGuard};

pub(crate) struct SecretIdLocks {
    stripes: Vec<Mutex<()>>,
}

impl SecretIdLocks {
    /// `count` is clamped to at least one stripe
    pub(crate) fn new(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe_index(&self, hashed_id: &str) -> usize {
        let seed = hashed_id
            .bytes()
            .take(16)
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
        seed % self.stripes.len()
    }

    /// Hold the stripe guarding `hashed_id`
    pub(crate) async fn lock(&self, hashed_id: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_index(hashed_id)].lock().await
    }

    pub(crate) fn len(&self) -> usize {
        self.stripes.len()
    }
}

impl std::fmt::Debug for SecretIdLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretIdLocks")
            .field("stripes", &self.len())
            .finish()
    }
}
