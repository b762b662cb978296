//! HTTP transport helpers for API requests.

use std::time::Duration;

use crate::error::ApiError;
use crate::session::SessionManager;

/// Build an HTTP client with timeout and cookie store applied.
pub(super) fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Pass 2xx through, route 401/403 through the session's error hook and
/// surface every other status unmodified.
pub(super) async fn check_status(
    session: &SessionManager,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    if session.check_error(code).is_err() {
        return Err(ApiError::AuthRequired(code));
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { code, body })
}

/// Read a JSON body; an empty body reads as `null`.
pub(super) async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, ApiError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|err| ApiError::InvalidResponse(format!("malformed JSON body: {err}")))
}
