//! HTTP client for the login/refresh/logout endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::types::{Credentials, RefreshResponse, TokenGrant};
use super::TokenSource;
use crate::error::GatewayError;

/// Error body produced by the kuvasz backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    error: String,
}

/// Auth gateway over HTTP.
///
/// The underlying client keeps a cookie store so the renewal cookie set by
/// `/login` rides along on refresh and logout requests.
#[derive(Clone)]
pub struct HttpAuthGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("kuvasz-session/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(http, base_url)
    }

    /// Use an existing client, sharing its cookie store.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The HTTP client carrying the session cookies.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a configured endpoint against the base URL. Absolute URLs
    /// pass through unchanged.
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    /// Exchange credentials for a token. Any non-2xx status is an error.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, GatewayError> {
        let response = self
            .http
            .post(self.resolve("/login"))
            .json(credentials)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let grant: TokenGrant = response.json().await?;
        if grant.token.trim().is_empty() {
            return Err(GatewayError::Invalid(
                "login response did not include a token".to_string(),
            ));
        }
        Ok(grant)
    }

    /// Revoke the renewal cookie on the server.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.resolve("/logout"))
            .header("Content-Type", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl TokenSource for HttpAuthGateway {
    async fn refresh(&self, endpoint: &str) -> Result<RefreshResponse, GatewayError> {
        let url = self.resolve(endpoint);
        debug!(%url, "requesting token refresh");
        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(RefreshResponse::Rejected(status.as_u16()));
        }
        let grant: TokenGrant = response.json().await?;
        Ok(RefreshResponse::Granted(grant))
    }
}

/// Build a status error, preferring the backend's human message.
async fn status_error(response: reqwest::Response) -> GatewayError {
    let code = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.error.is_empty() => body.error,
        Ok(body) if !body.code.is_empty() => body.code,
        _ => text.trim().to_string(),
    };
    GatewayError::Status(code, message)
}
