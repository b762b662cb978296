//! Per-tab session state.

use super::refresh::RefreshFlight;
use super::timer::RenewalTimer;

/// Coarse authentication state of one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token, no timer.
    LoggedOut,
    /// Token present, no refresh in flight. The renewal timer is armed,
    /// except after a renewal that failed at the transport layer: that
    /// token is kept but not renewed again until the next
    /// `get_refreshed_token` or login.
    LoggedIn,
    /// Token present, refresh in flight.
    Refreshing,
}

/// Single-owner mutable cell behind the session manager.
#[derive(Default)]
pub(crate) struct SessionCell {
    pub(crate) token: Option<String>,
    /// Bumped on every install or clear; a refresh only applies its result
    /// when the generation it started under is still current.
    pub(crate) generation: u64,
    pub(crate) timer: Option<RenewalTimer>,
    pub(crate) flight: Option<RefreshFlight>,
}

impl SessionCell {
    pub(crate) fn state(&self) -> SessionState {
        match (&self.token, &self.flight) {
            (None, _) => SessionState::LoggedOut,
            (Some(_), Some(_)) => SessionState::Refreshing,
            (Some(_), None) => SessionState::LoggedIn,
        }
    }

    /// Replace the token and timer. Returns the new generation.
    ///
    /// A refresh still in flight belongs to the old generation: it is
    /// detached here, so the new token's own timer starts a fresh one
    /// instead of joining a result that will be discarded.
    pub(crate) fn install(&mut self, token: String, timer: RenewalTimer) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.token = Some(token);
        // Dropping the previous handle cancels it.
        self.timer = Some(timer);
        self.flight = None;
        self.generation
    }

    /// Drop the token, cancel the timer and detach any refresh in flight.
    /// Returns whether a token was held.
    pub(crate) fn clear(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.timer = None;
        self.flight = None;
        self.token.take().is_some()
    }
}
