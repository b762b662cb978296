//! API client orchestration.
//!
//! - bearer resolution is delegated to `auth`.
//! - status handling and body decoding are delegated to `transport`.

mod auth;
mod transport;

use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::session::SessionManager;

/// REST client that authenticates every request through the session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionManager,
}

impl ApiClient {
    /// Build a client with its own connection pool.
    pub fn new(base_url: &str, timeout: Duration, session: SessionManager) -> Self {
        Self::with_client(transport::build_http_client(timeout), base_url, session)
    }

    /// Reuse an existing client, e.g. the auth gateway's, to share cookies.
    pub fn with_client(http: reqwest::Client, base_url: &str, session: SessionManager) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Absolute URL for an API path such as `/api/db`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request; finish it with [`ApiClient::send`].
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Attach the current bearer token and dispatch.
    pub async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = match auth::resolve_bearer_token(&self.session).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        debug!(status = response.status().as_u16(), url = %response.url(), "api response");
        transport::check_status(&self.session, response).await
    }

    /// Send and decode a JSON body.
    pub async fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = self.send(request).await?;
        transport::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SharedStorage;
    use crate::session::{SessionSettings, SessionState};
    use crate::testsupport::{http_response, serve_canned, ScriptedSource};
    use std::sync::Arc;

    fn session(storage: &SharedStorage) -> SessionManager {
        SessionManager::new(
            Arc::new(ScriptedSource::new(vec![])),
            Arc::new(storage.attach()),
            SessionSettings::default(),
        )
    }

    #[tokio::test]
    async fn send_attaches_bearer_token() {
        let (addr, server) =
            serve_canned(vec![http_response(200, &[], r#"{"id":1,"name":"source"}"#)]).await;
        let session = session(&SharedStorage::new());
        session.set_token("abc", 600);
        let client = ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(3), session);

        let body = client
            .send_json(client.request(Method::GET, "/api/db/1"))
            .await
            .expect("request");
        assert_eq!(body["name"], "source");

        let requests = server.await.unwrap();
        let request = requests[0].to_ascii_lowercase();
        assert!(request.starts_with("get /api/db/1 "), "got: {request}");
        assert!(request.contains("authorization: bearer abc"), "got: {request}");
        client.session().shutdown();
    }

    #[tokio::test]
    async fn unauthorized_response_logs_out() {
        let (addr, _server) = serve_canned(vec![http_response(401, &[], "")]).await;
        let storage = SharedStorage::new();
        let session = session(&storage);
        session.set_token("abc", 600);
        let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(3), session);

        let err = client
            .send(client.request(Method::GET, "/api/url"))
            .await
            .expect_err("401 expected");
        assert!(err.requires_login(), "got: {err}");
        assert_eq!(client.session().state(), SessionState::LoggedOut);
        assert!(storage.get("ra-logout").is_some());
    }

    #[tokio::test]
    async fn other_errors_pass_through_and_keep_session() {
        let (addr, _server) = serve_canned(vec![http_response(
            500,
            &[],
            r#"{"code":"0000","error":"Cannot read request"}"#,
        )])
        .await;
        let session = session(&SharedStorage::new());
        session.set_token("abc", 600);
        let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(3), session);

        let err = client
            .send(client.request(Method::POST, "/api/url/restart"))
            .await
            .expect_err("500 expected");
        match err {
            ApiError::Status { code, body } => {
                assert_eq!(code, 500);
                assert!(body.contains("Cannot read request"));
            }
            other => panic!("expected status error, got: {other}"),
        }
        assert_eq!(client.session().token().as_deref(), Some("abc"));
        client.session().shutdown();
    }

    #[tokio::test]
    async fn request_without_session_goes_out_bare() {
        let (addr, server) = serve_canned(vec![http_response(200, &[], "")]).await;
        let client = ApiClient::new(
            &format!("http://{addr}"),
            Duration::from_secs(3),
            session(&SharedStorage::new()),
        );

        let body = client
            .send_json(client.request(Method::POST, "/api/map/refresh"))
            .await
            .expect("request");
        assert_eq!(body, Value::Null);
        let requests = server.await.unwrap();
        assert!(!requests[0].to_ascii_lowercase().contains("authorization:"));
    }
}
