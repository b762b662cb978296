//! kuvasz-session: the token lifecycle behind the kuvasz-streamer console.
//!
//! A [`session::SessionManager`] holds one in-memory JWT per "tab", renews
//! it shortly before it expires, coalesces concurrent refreshes, and
//! follows logouts broadcast by other tabs. The [`auth`] module talks to
//! the Auth Gateway and [`api`] issues authenticated REST calls.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use kuvasz_session::api::{ApiClient, ListParams, Resource};
//! use kuvasz_session::auth::{AuthProvider, Credentials, HttpAuthGateway};
//! use kuvasz_session::broadcast::SharedStorage;
//! use kuvasz_session::session::{SessionManager, SessionSettings};
//!
//! # async fn example() {
//! let gateway = Arc::new(HttpAuthGateway::new("http://localhost:8000", Duration::from_secs(30)));
//! let storage = SharedStorage::new();
//! let session = SessionManager::new(
//!     gateway.clone(),
//!     Arc::new(storage.attach()),
//!     SessionSettings::default(),
//! );
//! let auth = AuthProvider::new(gateway.clone(), session.clone(), "/refresh-token");
//! auth.login(&Credentials::new("admin", "secret")).await.unwrap();
//!
//! let api = ApiClient::with_client(gateway.http().clone(), gateway.base_url(), session);
//! let page = api.list(Resource::Db, &ListParams::page(1, 10)).await.unwrap();
//! println!("{} databases", page.total);
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod broadcast;
pub mod build_info;
pub mod config;
pub mod error;
pub mod session;
#[cfg(test)]
pub mod testsupport;
