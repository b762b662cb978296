//! Coalesced refresh flights.
//!
//! A flight is one refresh round-trip. Every caller that waits while it is
//! outstanding holds a receiver on the same watch channel and observes the
//! same settled outcome.

use tokio::sync::watch;

use crate::error::SessionError;

/// How a refresh flight ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    /// A fresh token was installed.
    Renewed,
    /// The gateway refused to renew; the session was logged out.
    Expired,
    /// The session was erased or replaced while the request was
    /// outstanding; the result was discarded.
    Superseded { authenticated: bool },
    /// The request never produced a status.
    Failed(String),
}

impl RefreshOutcome {
    fn into_result(self) -> Result<bool, SessionError> {
        match self {
            Self::Renewed => Ok(true),
            Self::Expired => Ok(false),
            Self::Superseded { authenticated } => Ok(authenticated),
            Self::Failed(msg) => Err(SessionError::Refresh(msg)),
        }
    }
}

pub(crate) type FlightSender = watch::Sender<Option<RefreshOutcome>>;
pub(crate) type FlightReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// Marker for the refresh currently in flight.
pub(crate) struct RefreshFlight {
    pub(crate) id: u64,
    pub(crate) rx: FlightReceiver,
}

impl RefreshFlight {
    pub(crate) fn open(id: u64) -> (Self, FlightSender) {
        let (tx, rx) = watch::channel(None);
        (Self { id, rx }, tx)
    }
}

/// Wait until the flight behind `rx` settles.
pub(crate) async fn settled(mut rx: FlightReceiver) -> Result<bool, SessionError> {
    let outcome = rx
        .wait_for(Option::is_some)
        .await
        .map_err(|_| SessionError::RefreshAborted)?
        .clone();
    outcome
        .ok_or(SessionError::RefreshAborted)?
        .into_result()
}
