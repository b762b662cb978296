//! Authenticated client for the console's REST API.
//!
//! - `client`: bearer attachment and auth-failure handling
//! - `resources`: the `db`, `url`, `tbl` and `map` resources plus the
//!   replication actions the backend exposes

mod client;
mod resources;

pub use client::ApiClient;
pub use resources::{ListPage, ListParams, Resource, SortOrder};
