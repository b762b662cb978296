//! Login/logout/check flows used by the console shell.

use std::sync::Arc;
use tracing::{info, warn};

use super::gateway::HttpAuthGateway;
use super::types::Credentials;
use crate::error::{GatewayError, SessionError};
use crate::session::SessionManager;

/// Route the console redirects to when authentication is required.
pub const LOGIN_ROUTE: &str = "/login";

/// Ties the HTTP gateway to one tab's session manager.
#[derive(Clone)]
pub struct AuthProvider {
    gateway: Arc<HttpAuthGateway>,
    session: SessionManager,
    refresh_endpoint: String,
}

impl AuthProvider {
    /// `refresh_endpoint` may be relative to the gateway's base URL.
    pub fn new(
        gateway: Arc<HttpAuthGateway>,
        session: SessionManager,
        refresh_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            session,
            refresh_endpoint: refresh_endpoint.into(),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn gateway(&self) -> &HttpAuthGateway {
        &self.gateway
    }

    /// Exchange credentials for a token and start renewing it.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), GatewayError> {
        self.session
            .set_refresh_token_endpoint(self.gateway.resolve(&self.refresh_endpoint));
        let grant = self.gateway.login(credentials).await?;
        self.session.set_grant(grant);
        info!(username = %credentials.username, "logged in");
        Ok(())
    }

    /// Log out locally right away, then revoke the renewal cookie.
    ///
    /// The server call is best effort. Returns the route to show next.
    pub async fn logout(&self) -> &'static str {
        self.session.erase_token();
        if let Err(err) = self.gateway.logout().await {
            warn!(error = %err, "server logout failed");
        }
        LOGIN_ROUTE
    }

    /// Succeeds when a token is held once any pending refresh has settled.
    pub async fn check_auth(&self) -> Result<(), SessionError> {
        self.session.wait_for_token_refresh().await?;
        match self.session.token() {
            Some(_) => Ok(()),
            None => Err(SessionError::AuthRequired),
        }
    }

    /// Error hook for failed API calls.
    pub fn check_error(&self, status: u16) -> Result<(), SessionError> {
        self.session.check_error(status)
    }

    /// Role claim of the current token (`admin` or `viewer` on kuvasz).
    pub async fn permissions(&self) -> Result<Option<String>, SessionError> {
        self.check_auth().await?;
        Ok(self.session.claims().and_then(|claims| claims.role))
    }

    /// Try to restore a session from the renewal cookie alone.
    pub async fn restore(&self) -> Result<bool, SessionError> {
        self.session
            .set_refresh_token_endpoint(self.gateway.resolve(&self.refresh_endpoint));
        self.session.get_refreshed_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SharedStorage;
    use crate::session::{encode_unsigned, SessionSettings, SessionState};
    use crate::testsupport::{http_response, serve_canned};
    use serde_json::json;
    use std::time::Duration;

    fn provider(addr: std::net::SocketAddr, storage: &SharedStorage) -> AuthProvider {
        let gateway = Arc::new(HttpAuthGateway::new(
            &format!("http://{addr}"),
            Duration::from_secs(3),
        ));
        let session = SessionManager::new(
            gateway.clone(),
            Arc::new(storage.attach()),
            SessionSettings::default(),
        );
        AuthProvider::new(gateway, session, "/refresh-token")
    }

    #[tokio::test]
    async fn login_stores_token_and_resolves_refresh_endpoint() {
        let jwt = encode_unsigned(&json!({"sub": "admin", "role": "admin"}));
        let body = json!({"token": jwt, "tokenExpiry": 300}).to_string();
        let (addr, _server) = serve_canned(vec![http_response(200, &[], &body)]).await;
        let auth = provider(addr, &SharedStorage::new());

        auth.login(&Credentials::new("admin", "secret"))
            .await
            .expect("login");
        assert_eq!(auth.session().state(), SessionState::LoggedIn);
        assert_eq!(auth.session().token().as_deref(), Some(jwt.as_str()));
        assert_eq!(
            auth.session().settings().refresh_endpoint,
            format!("http://{addr}/refresh-token")
        );
        assert_eq!(auth.check_auth().await, Ok(()));
        assert_eq!(auth.permissions().await, Ok(Some("admin".to_string())));
        auth.session().shutdown();
    }

    #[tokio::test]
    async fn failed_login_leaves_session_logged_out() {
        let (addr, _server) = serve_canned(vec![http_response(
            400,
            &[],
            r#"{"code":"invalid_request","error":"Invalid user, only user admin is supported in this model"}"#,
        )])
        .await;
        let auth = provider(addr, &SharedStorage::new());

        let err = auth
            .login(&Credentials::new("root", "secret"))
            .await
            .expect_err("login should fail");
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(auth.check_auth().await, Err(SessionError::AuthRequired));
        assert_eq!(auth.permissions().await, Err(SessionError::AuthRequired));
    }

    #[tokio::test]
    async fn logout_erases_before_server_call_and_tolerates_failure() {
        let (addr, server) = serve_canned(vec![http_response(500, &[], "")]).await;
        let storage = SharedStorage::new();
        let auth = provider(addr, &storage);
        auth.session().set_token("abc", 600);

        assert_eq!(auth.logout().await, LOGIN_ROUTE);
        assert_eq!(auth.session().token(), None);
        assert!(storage.get("ra-logout").is_some());
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /logout "));
    }

    #[tokio::test]
    async fn restore_uses_renewal_cookie_session() {
        let (addr, server) = serve_canned(vec![http_response(
            200,
            &[],
            r#"{"token":"restored","tokenExpiry":120}"#,
        )])
        .await;
        let auth = provider(addr, &SharedStorage::new());

        assert_eq!(auth.restore().await, Ok(true));
        assert_eq!(auth.session().token().as_deref(), Some("restored"));
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /refresh-token "));
        auth.session().shutdown();
    }

    #[tokio::test]
    async fn check_error_routes_auth_failures_to_login() {
        let (addr, _server) = serve_canned(vec![]).await;
        let auth = provider(addr, &SharedStorage::new());
        auth.session().set_token("abc", 600);

        assert_eq!(auth.check_error(502), Ok(()));
        assert_eq!(auth.check_error(401), Err(SessionError::AuthRequired));
        assert_eq!(auth.session().token(), None);
    }
}
