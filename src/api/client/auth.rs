//! Bearer resolution for API requests.
//!
//! Kept apart from dispatch so the "wait, then read" ordering is easy to
//! test without touching transport logic.

use crate::error::ApiError;
use crate::session::SessionManager;

/// Resolve the bearer token for an outgoing request.
///
/// Waits for any refresh in flight first, so a request never leaves with a
/// token that is about to be replaced. `None` means no session: the request
/// goes out bare and the API answers 401.
pub(super) async fn resolve_bearer_token(
    session: &SessionManager,
) -> Result<Option<String>, ApiError> {
    session.wait_for_token_refresh().await?;
    Ok(session.token())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SharedStorage;
    use crate::error::{GatewayError, SessionError};
    use crate::session::SessionSettings;
    use crate::testsupport::ScriptedSource;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn bearer_waits_for_refresh_in_flight() {
        let source = Arc::new(ScriptedSource::gated(vec![ScriptedSource::grant("def", 600)]));
        let session = SessionManager::new(
            source.clone(),
            Arc::new(SharedStorage::new().attach()),
            SessionSettings::default(),
        );
        session.set_token("abc", 600);
        let refresh = {
            let session = session.clone();
            tokio::spawn(async move { session.get_refreshed_token().await })
        };
        tokio::task::yield_now().await;

        let bearer = {
            let session = session.clone();
            tokio::spawn(async move { resolve_bearer_token(&session).await })
        };
        tokio::task::yield_now().await;
        source.release();

        assert_eq!(bearer.await.unwrap().unwrap().as_deref(), Some("def"));
        assert_eq!(refresh.await.unwrap(), Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_surfaces_as_session_error() {
        let source = Arc::new(ScriptedSource::gated(vec![Err(GatewayError::Invalid(
            "dns failure".into(),
        ))]));
        let session = SessionManager::new(
            source.clone(),
            Arc::new(SharedStorage::new().attach()),
            SessionSettings::default(),
        );
        let refresh = {
            let session = session.clone();
            tokio::spawn(async move { session.get_refreshed_token().await })
        };
        tokio::task::yield_now().await;
        let bearer = {
            let session = session.clone();
            tokio::spawn(async move { resolve_bearer_token(&session).await })
        };
        tokio::task::yield_now().await;
        source.release();

        match bearer.await.unwrap() {
            Err(ApiError::Session(SessionError::Refresh(msg))) => assert_eq!(msg, "dns failure"),
            other => panic!("expected session error, got: {other:?}"),
        }
        assert!(refresh.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn no_session_means_no_bearer() {
        let session = SessionManager::new(
            Arc::new(ScriptedSource::new(vec![])),
            Arc::new(SharedStorage::new().attach()),
            SessionSettings::default(),
        );
        assert_eq!(resolve_bearer_token(&session).await.unwrap(), None);
    }
}
