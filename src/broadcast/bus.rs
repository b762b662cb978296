//! Message-only broadcast medium (no persisted value).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{LogoutChannel, LogoutEvents, OriginId, StorageEvent, EVENT_CAPACITY};

/// Named-message bus shared by every attached tab.
#[derive(Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<StorageEvent>,
    next_origin: Arc<AtomicU64>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tx,
            next_origin: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn attach(&self) -> BusTab {
        BusTab {
            tx: self.tx.clone(),
            origin: self.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's endpoint on a [`BroadcastBus`].
#[derive(Clone)]
pub struct BusTab {
    tx: broadcast::Sender<StorageEvent>,
    origin: OriginId,
}

impl LogoutChannel for BusTab {
    fn publish(&self, key: &str, stamp_millis: i64) {
        let _ = self.tx.send(StorageEvent {
            key: key.to_string(),
            value: stamp_millis.to_string(),
            origin: self.origin,
        });
    }

    fn subscribe(&self) -> LogoutEvents {
        LogoutEvents::new(self.tx.subscribe(), self.origin)
    }

    fn current(&self, _key: &str) -> Option<String> {
        None
    }

    fn retains_values(&self) -> bool {
        false
    }
}
