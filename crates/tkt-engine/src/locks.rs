//! Per-identifier redemption locks.
//!
//! The ledger offers no compare-and-set, so two concurrent scans of the same
//! code can both read N and both write N+1. Holding the identifier's lock
//! across validate and redeem closes that window inside one process. Other
//! processes writing the same sheet are not covered.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct RedemptionLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RedemptionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `identifier`. Released on drop.
    pub async fn acquire(&self, identifier: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // Idle slots are referenced only by the map.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(identifier.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Identifiers currently held or awaited.
    pub async fn active(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}
