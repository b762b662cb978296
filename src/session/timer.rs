//! Scoped renewal timer handle.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A single pending renewal callback.
///
/// Dropping the handle cancels the callback, so replacing or clearing the
/// slot that owns it is always enough to disarm it.
pub(crate) struct RenewalTimer {
    handle: JoinHandle<()>,
    delay: Duration,
}

impl RenewalTimer {
    /// Arm `on_fire` to run once after `delay`. Must be called inside a
    /// tokio runtime.
    ///
    /// `on_fire` is synchronous: it may drop this very handle (through the
    /// slot that owns it) without cutting itself short.
    pub(crate) fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(delay_ms = delay.as_millis() as u64, "arming renewal timer");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self { handle, delay }
    }

    pub(crate) fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for RenewalTimer {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            debug!("cancelling renewal timer");
        }
        self.handle.abort();
    }
}
