//! Per-key mutual exclusion for check-then-write mutations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Slots are pruned once the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

/// A set of async mutexes addressed by id.
///
/// Holders of the guard for a key run one at a time; different keys never
/// contend. Idle slots are dropped lazily.
#[derive(Default)]
pub struct KeyedMutex {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and hold it until the guard is dropped.
    pub async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.len() >= PRUNE_THRESHOLD {
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            slots.entry(key).or_default().clone()
        };

        slot.lock_owned().await
    }

    /// Number of tracked keys, idle ones included.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
