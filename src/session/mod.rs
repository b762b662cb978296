//! In-memory session token manager.
//!
//! One [`SessionManager`] per tab owns the access token, renews it shortly
//! before it expires, lets any number of callers wait on a single refresh,
//! and keeps every other tab's login state in sync on logout.
//!
//! The token is never written to durable storage. The only value the
//! manager ever persists is the logout timestamp on the shared
//! [`LogoutChannel`].
//!
//! ```text
//! LoggedOut --set_token--> LoggedIn --timer--> Refreshing --granted--> LoggedIn
//!     ^                                            |
//!     +--------- rejected / erase / remote logout -+
//! ```

mod claims;
mod refresh;
mod state;
mod timer;

pub use claims::TokenClaims;
pub use state::SessionState;

#[cfg(test)]
pub(crate) use claims::encode_unsigned;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{RefreshResponse, TokenGrant, TokenSource};
use crate::broadcast::{unix_now_millis, LogoutChannel, LogoutEvents, LogoutNotice};
use crate::error::{GatewayError, SessionError};
use refresh::{FlightReceiver, FlightSender, RefreshFlight, RefreshOutcome};
use state::SessionCell;
use timer::RenewalTimer;

/// Default refresh endpoint, relative to the gateway base URL.
pub const DEFAULT_REFRESH_ENDPOINT: &str = "/refresh-token";
/// Default shared key used for cross-tab logout.
pub const DEFAULT_LOGOUT_EVENT_NAME: &str = "ra-logout";
/// Renewal fires this long before the token's validity window ends.
pub const DEFAULT_RENEWAL_MARGIN: Duration = Duration::from_secs(5);
/// Validity assumed when neither the grant nor the token says otherwise.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Tunables for one session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub refresh_endpoint: String,
    pub logout_event_name: String,
    pub renewal_margin: Duration,
    pub default_token_ttl: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            logout_event_name: DEFAULT_LOGOUT_EVENT_NAME.to_string(),
            renewal_margin: DEFAULT_RENEWAL_MARGIN,
            default_token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// Handle to one tab's session. Clones share the same state.
///
/// Construct it inside a tokio runtime: construction spawns the cross-tab
/// logout listener and arming a renewal timer spawns a task. Call
/// [`SessionManager::shutdown`] at teardown.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

// Lock order: `cell` before `settings`.
struct Inner {
    cell: Mutex<SessionCell>,
    settings: Mutex<SessionSettings>,
    source: Arc<dyn TokenSource>,
    channel: Arc<dyn LogoutChannel>,
    listener: Mutex<Option<JoinHandle<()>>>,
    next_flight: AtomicU64,
    /// Last logout stamp this tab knows about under the watched key,
    /// written by itself or another tab. A listener that fell behind
    /// compares the stored value against it.
    seen_logout: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(
        source: Arc<dyn TokenSource>,
        channel: Arc<dyn LogoutChannel>,
        settings: SessionSettings,
    ) -> Self {
        // Subscribe before reading the stored stamp and before returning, so
        // no logout written after construction can be missed.
        let events = channel.subscribe();
        let seen_logout = channel.current(&settings.logout_event_name);
        let inner = Arc::new(Inner {
            cell: Mutex::new(SessionCell::default()),
            settings: Mutex::new(settings),
            source,
            channel,
            listener: Mutex::new(None),
            next_flight: AtomicU64::new(1),
            seen_logout: Mutex::new(seen_logout),
        });
        let handle = tokio::spawn(listen_for_logout(Arc::downgrade(&inner), events));
        *lock(&inner.listener) = Some(handle);
        Self { inner }
    }

    /// Store `token` and arm renewal `validity_secs` minus the margin from now.
    ///
    /// Supersedes any previous token and cancels its timer.
    pub fn set_token(&self, token: impl Into<String>, validity_secs: u64) -> bool {
        let mut cell = lock(&self.inner.cell);
        self.inner.install(&mut cell, token.into(), validity_secs);
        true
    }

    /// Store a gateway grant, deriving its validity window when absent.
    pub fn set_grant(&self, grant: TokenGrant) -> bool {
        let validity = self.validity_for(&grant);
        self.set_token(grant.token, validity)
    }

    /// Current token, without waiting on any refresh.
    pub fn token(&self) -> Option<String> {
        lock(&self.inner.cell).token.clone()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner.cell).state()
    }

    /// Clear the token, cancel renewal and tell every other tab.
    ///
    /// Broadcasts even when no token is held, which forces a logout of all
    /// tabs.
    pub fn erase_token(&self) -> bool {
        let had_token = lock(&self.inner.cell).clear();
        self.inner.publish_logout();
        if had_token {
            info!("session token erased");
        }
        true
    }

    /// Wait for the refresh in flight, if any.
    ///
    /// Resolves `Ok(true)` immediately when nothing is in flight. Otherwise
    /// every concurrent caller shares that refresh's outcome.
    pub async fn wait_for_token_refresh(&self) -> Result<bool, SessionError> {
        let rx = lock(&self.inner.cell)
            .flight
            .as_ref()
            .map(|flight| flight.rx.clone());
        match rx {
            Some(rx) => refresh::settled(rx).await,
            None => Ok(true),
        }
    }

    /// Renew the token through the gateway now.
    ///
    /// Joins the refresh already in flight instead of issuing a second
    /// request. Resolves `Ok(false)` when the gateway refuses to renew (the
    /// session is then logged out) and `Err` when the request itself fails.
    pub async fn get_refreshed_token(&self) -> Result<bool, SessionError> {
        let rx = {
            let mut cell = lock(&self.inner.cell);
            self.inner.join_or_start_refresh(&mut cell)
        };
        refresh::settled(rx).await
    }

    /// Error hook for API responses: 401/403 log the session out.
    pub fn check_error(&self, status: u16) -> Result<(), SessionError> {
        if status == 401 || status == 403 {
            debug!(status, "api rejected the session token");
            self.erase_token();
            return Err(SessionError::AuthRequired);
        }
        Ok(())
    }

    /// Claims of the current token, when it is a readable JWT.
    pub fn claims(&self) -> Option<TokenClaims> {
        self.token().as_deref().and_then(TokenClaims::decode)
    }

    /// Validity window for a grant: explicit expiry, else the token's `exp`,
    /// else the configured default.
    pub fn validity_for(&self, grant: &TokenGrant) -> u64 {
        self.inner.validity_for(grant)
    }

    pub fn set_refresh_token_endpoint(&self, endpoint: impl Into<String>) {
        lock(&self.inner.settings).refresh_endpoint = endpoint.into();
    }

    /// Watch a different key. A stamp already stored under it is not a new
    /// logout.
    pub fn set_logout_event_name(&self, name: impl Into<String>) {
        let name = name.into();
        *lock(&self.inner.seen_logout) = self.inner.channel.current(&name);
        lock(&self.inner.settings).logout_event_name = name;
    }

    pub fn settings(&self) -> SessionSettings {
        lock(&self.inner.settings).clone()
    }

    /// Tear down: stop listening for other tabs, cancel renewal and drop the
    /// token without broadcasting.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.inner.listener).take() {
            handle.abort();
        }
        lock(&self.inner.cell).clear();
        debug!("session manager shut down");
    }
}

impl Inner {
    fn install(self: &Arc<Self>, cell: &mut SessionCell, token: String, validity_secs: u64) {
        let delay = Duration::from_secs(validity_secs).saturating_sub(self.renewal_margin());
        // The new generation is install's return value, but the timer must be
        // armed with it first; it is always the next one.
        let generation = cell.generation.wrapping_add(1);
        let weak = Arc::downgrade(self);
        let timer = RenewalTimer::arm(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_renewal_due(generation);
            }
        });
        cell.install(token, timer);
        debug!(validity_secs, "session token stored");
    }

    fn on_renewal_due(self: &Arc<Self>, generation: u64) {
        let mut cell = lock(&self.cell);
        if cell.generation != generation {
            return;
        }
        // This fired timer is the one in the slot.
        cell.timer = None;
        drop(self.join_or_start_refresh(&mut cell));
    }

    fn join_or_start_refresh(self: &Arc<Self>, cell: &mut SessionCell) -> FlightReceiver {
        if let Some(flight) = &cell.flight {
            debug!(flight = flight.id, "joining refresh in flight");
            return flight.rx.clone();
        }
        let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
        let (flight, tx) = RefreshFlight::open(id);
        let rx = flight.rx.clone();
        cell.flight = Some(flight);
        let endpoint = lock(&self.settings).refresh_endpoint.clone();
        tokio::spawn(Arc::clone(self).run_refresh(id, cell.generation, endpoint, tx));
        rx
    }

    /// One refresh round-trip. Runs to completion on its own task.
    async fn run_refresh(
        self: Arc<Self>,
        flight: u64,
        generation: u64,
        endpoint: String,
        tx: FlightSender,
    ) {
        info!(flight, %endpoint, "renewing session token");
        let response = self.source.refresh(&endpoint).await;
        let (outcome, logged_out) = self.settle(flight, generation, response);
        if logged_out {
            self.publish_logout();
        }
        let _ = tx.send(Some(outcome));
    }

    fn settle(
        self: &Arc<Self>,
        flight: u64,
        generation: u64,
        response: Result<RefreshResponse, GatewayError>,
    ) -> (RefreshOutcome, bool) {
        let mut cell = lock(&self.cell);
        if cell.flight.as_ref().is_some_and(|f| f.id == flight) {
            cell.flight = None;
        }
        if cell.generation != generation {
            debug!(flight, "discarding refresh result for a superseded session");
            let authenticated = cell.token.is_some();
            return (RefreshOutcome::Superseded { authenticated }, false);
        }
        match response {
            Ok(RefreshResponse::Granted(grant)) if !grant.token.trim().is_empty() => {
                let validity = self.validity_for(&grant);
                self.install(&mut cell, grant.token, validity);
                info!(flight, validity_secs = validity, "session token renewed");
                (RefreshOutcome::Renewed, false)
            }
            Ok(RefreshResponse::Granted(_)) => {
                warn!(flight, "token renewal failure: empty token");
                cell.clear();
                (RefreshOutcome::Expired, true)
            }
            Ok(RefreshResponse::Rejected(status)) => {
                warn!(flight, status, "token renewal failure");
                cell.clear();
                (RefreshOutcome::Expired, true)
            }
            Err(err) => {
                warn!(flight, error = %err, "token renewal request failed");
                (RefreshOutcome::Failed(err.to_string()), false)
            }
        }
    }

    fn validity_for(&self, grant: &TokenGrant) -> u64 {
        let fallback = lock(&self.settings).default_token_ttl.as_secs();
        grant
            .token_expiry
            .or_else(|| {
                TokenClaims::decode(&grant.token)
                    .and_then(|claims| claims.remaining_secs(unix_now_millis() / 1000))
            })
            .unwrap_or(fallback)
    }

    fn renewal_margin(&self) -> Duration {
        lock(&self.settings).renewal_margin
    }

    fn publish_logout(&self) {
        let key = lock(&self.settings).logout_event_name.clone();
        let stamp = unix_now_millis();
        *lock(&self.seen_logout) = Some(stamp.to_string());
        self.channel.publish(&key, stamp);
    }

    /// Events were dropped before this tab saw them. Treat the session as
    /// logged out elsewhere when the stored stamp moved, or when the medium
    /// keeps no values to check against.
    fn resync_after_missed(&self, key: &str, skipped: u64) {
        if !self.channel.retains_values() {
            warn!(skipped, "missed cross-tab events on a medium without values; logging out");
            self.clear_from_remote();
            return;
        }
        let current = self.channel.current(key);
        let mut seen = lock(&self.seen_logout);
        if current.is_some() && current != *seen {
            *seen = current;
            drop(seen);
            debug!(skipped, "missed a logout from another tab");
            self.clear_from_remote();
        }
    }

    /// Another tab logged out: drop local state, never re-broadcast.
    fn clear_from_remote(&self) {
        if lock(&self.cell).clear() {
            info!("session ended by another tab");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
        }
    }
}

async fn listen_for_logout(weak: Weak<Inner>, mut events: LogoutEvents) {
    while let Some(notice) = events.recv().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        let watched = lock(&inner.settings).logout_event_name.clone();
        match notice {
            LogoutNotice::Write(event) if event.key == watched => {
                *lock(&inner.seen_logout) = Some(event.value);
                inner.clear_from_remote();
            }
            LogoutNotice::Write(_) => {}
            LogoutNotice::Missed(skipped) => inner.resync_after_missed(&watched, skipped),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
