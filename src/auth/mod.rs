//! Auth gateway client and the console's auth provider.
//!
//! The gateway issues tokens on `POST /login`, renews them on the refresh
//! endpoint using the ambient renewal cookie, and revokes that cookie on
//! `POST /logout`. [`TokenSource`] is the narrow seam the session manager
//! depends on, so tests can script refresh outcomes without a network.

mod gateway;
mod provider;
mod types;

pub use gateway::HttpAuthGateway;
pub use provider::{AuthProvider, LOGIN_ROUTE};
pub use types::{Credentials, RefreshResponse, TokenGrant};

use crate::error::GatewayError;
use async_trait::async_trait;

/// Source of renewed tokens.
///
/// `Ok(Rejected(..))` means the gateway answered with a non-success status;
/// `Err(..)` means no usable answer arrived at all.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn refresh(&self, endpoint: &str) -> Result<RefreshResponse, GatewayError>;
}
