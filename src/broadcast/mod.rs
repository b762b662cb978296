//! Cross-tab logout signalling.
//!
//! Every tab (one [`crate::session::SessionManager`] each) attaches to a
//! shared medium. Erasing a token writes a timestamp under the logout key;
//! every *other* attached tab observes the write and drops its own token.
//!
//! Two media are provided:
//! - [`SharedStorage`]: a key/value store with change notifications, shaped
//!   like browser local storage (the written value stays readable).
//! - [`BroadcastBus`]: a plain message bus with no persisted value.

mod bus;
mod storage;

pub use bus::{BroadcastBus, BusTab};
pub use storage::{SharedStorage, StorageTab};

use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tracing::debug;

/// Identifies the tab that wrote a value.
pub type OriginId = u64;

/// Capacity of the in-process change-notification channel.
const EVENT_CAPACITY: usize = 64;

/// A write observed on the shared medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub value: String,
    pub origin: OriginId,
}

/// Publish/subscribe capability used by the session manager for logout.
pub trait LogoutChannel: Send + Sync {
    /// Write a logout stamp under `key` so every other tab observes it.
    fn publish(&self, key: &str, stamp_millis: i64);

    /// Subscribe to writes made by other tabs.
    fn subscribe(&self) -> LogoutEvents;

    /// Value currently stored under `key`. Always `None` on a medium that
    /// keeps no values (see [`LogoutChannel::retains_values`]).
    fn current(&self, key: &str) -> Option<String>;

    /// Whether [`LogoutChannel::current`] reflects past writes. A listener
    /// that missed events can only resync against a medium that does.
    fn retains_values(&self) -> bool {
        true
    }
}

/// What a subscriber observes on the medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutNotice {
    /// Another tab wrote `key`.
    Write(StorageEvent),
    /// The subscriber fell behind and `skipped` events were dropped; any of
    /// them may have been a logout.
    Missed(u64),
}

/// Stream of storage events written by other tabs.
pub struct LogoutEvents {
    rx: broadcast::Receiver<StorageEvent>,
    origin: OriginId,
}

impl LogoutEvents {
    pub(crate) fn new(rx: broadcast::Receiver<StorageEvent>, origin: OriginId) -> Self {
        Self { rx, origin }
    }

    /// Wait for the next foreign event. Returns `None` once the medium is gone.
    pub async fn recv(&mut self) -> Option<LogoutNotice> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => return Some(LogoutNotice::Write(event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "logout listener lagged behind");
                    return Some(LogoutNotice::Missed(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Milliseconds since the unix epoch, the value written by a logout.
pub fn unix_now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
