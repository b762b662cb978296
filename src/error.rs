//! Unified error types for the session manager and its collaborators.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Errors from the auth gateway (login, refresh, logout endpoints).
#[derive(Debug)]
pub enum GatewayError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status where the caller expected success.
    Status(u16, String),
    /// The gateway answered 2xx with an unusable body.
    Invalid(String),
}

impl GatewayError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code, _) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) if body.is_empty() => write!(f, "status {code}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors surfaced by the session token manager.
///
/// An expired renewal cookie is not an error: it resolves a refresh to
/// `false` and logs the session out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The refresh request failed before the gateway produced a status.
    Refresh(String),
    /// The refresh task went away without settling (runtime shutdown).
    RefreshAborted,
    /// No valid token; the caller must route the user to the login screen.
    AuthRequired,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh(msg) => write!(f, "token refresh failed: {msg}"),
            Self::RefreshAborted => write!(f, "token refresh was aborted before it settled"),
            Self::AuthRequired => write!(f, "authentication required; log in again"),
        }
    }
}

impl std::error::Error for SessionError {}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from authenticated REST API calls.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status other than 401/403, passed through unmodified.
    Status { code: u16, body: String },
    /// 401/403 from the API; the local token has been erased.
    AuthRequired(u16),
    /// Response could not be interpreted.
    InvalidResponse(String),
    Session(SessionError),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::AuthRequired(code) => Some(*code),
            _ => None,
        }
    }

    /// True when the caller should redirect to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::AuthRequired(_) | Self::Session(SessionError::AuthRequired)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::AuthRequired(code) => {
                write!(f, "status {code}: session is no longer authorized; log in again")
            }
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            Self::Session(e) => write!(f, "session: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}
