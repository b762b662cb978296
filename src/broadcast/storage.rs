//! Key/value storage shared between tabs, with change notifications.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use super::{LogoutChannel, LogoutEvents, OriginId, StorageEvent, EVENT_CAPACITY};

/// Last-writer-wins string store visible to every attached tab.
#[derive(Clone)]
pub struct SharedStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
    tx: broadcast::Sender<StorageEvent>,
    next_origin: Arc<AtomicU64>,
}

impl SharedStorage {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
            tx,
            next_origin: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attach a new tab with its own origin id.
    pub fn attach(&self) -> StorageTab {
        StorageTab {
            storage: self.clone(),
            origin: self.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Current value under `key`, if any tab has written it.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, origin: OriginId) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        // No subscribers is fine: nobody else is listening yet.
        let _ = self.tx.send(StorageEvent {
            key: key.to_string(),
            value,
            origin,
        });
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's view of a [`SharedStorage`].
#[derive(Clone)]
pub struct StorageTab {
    storage: SharedStorage,
    origin: OriginId,
}

impl StorageTab {
    pub fn origin(&self) -> OriginId {
        self.origin
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.storage.get(key)
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.storage.set(key, value.into(), self.origin);
    }
}

impl LogoutChannel for StorageTab {
    fn publish(&self, key: &str, stamp_millis: i64) {
        self.set(key, stamp_millis.to_string());
    }

    fn subscribe(&self) -> LogoutEvents {
        LogoutEvents::new(self.storage.tx.subscribe(), self.origin)
    }

    fn current(&self, key: &str) -> Option<String> {
        self.storage.get(key)
    }
}
