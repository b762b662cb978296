//! Configuration data model.
//!
//! Struct/enum definitions plus default values. Loading and precedence live
//! in `loader`, `sources` and `env`.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USERNAME};
use crate::session::{
    SessionSettings, DEFAULT_LOGOUT_EVENT_NAME, DEFAULT_REFRESH_ENDPOINT, DEFAULT_RENEWAL_MARGIN,
    DEFAULT_TOKEN_TTL,
};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    pub login: LoginConfig,
}

impl Config {
    /// Settings handed to the session manager.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            refresh_endpoint: self.gateway.refresh_endpoint.clone(),
            logout_event_name: self.session.logout_event_name.clone(),
            renewal_margin: Duration::from_secs(self.session.renewal_margin_secs),
            default_token_ttl: Duration::from_secs(self.session.default_token_ttl_secs),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.http_timeout_secs)
    }
}

/// Where the auth gateway and API live.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Relative to `base_url` unless absolute.
    pub refresh_endpoint: String,
    pub http_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.into(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Token lifecycle tunables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub logout_event_name: String,
    pub renewal_margin_secs: u64,
    pub default_token_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logout_event_name: DEFAULT_LOGOUT_EVENT_NAME.into(),
            renewal_margin_secs: DEFAULT_RENEWAL_MARGIN.as_secs(),
            default_token_ttl_secs: DEFAULT_TOKEN_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoginConfig {
    pub username: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.into(),
        }
    }
}

/// Result of explicit config initialization (`kuvasz-session init`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInitResult {
    Created { path: std::path::PathBuf },
    AlreadyInitialized { path: std::path::PathBuf },
    Overwritten {
        path: std::path::PathBuf,
        backup_path: std::path::PathBuf,
    },
}
