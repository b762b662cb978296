//! Console resources in the simple-REST dialect.
//!
//! Lists take `sort=["field","ASC"]`, `range=[start,end]` (inclusive) and
//! `filter={...}` as JSON-encoded query parameters and report the total in
//! the `X-Total-Count` header.

use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::ApiClient;
use crate::error::ApiError;

const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// REST resources served under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Source databases.
    Db,
    /// Source connection URLs.
    Url,
    /// Replicated tables.
    Tbl,
    /// Discovered source schema map.
    Map,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Db, Resource::Url, Resource::Tbl, Resource::Map];

    pub fn name(self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Url => "url",
            Self::Tbl => "tbl",
            Self::Map => "map",
        }
    }

    fn collection_path(self) -> String {
        format!("/api/{}", self.name())
    }

    fn item_path(self, id: i64) -> String {
        format!("/api/{}/{id}", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown resource `{s}` (expected db, url, tbl or map)"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sorting, paging and filtering for list requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub sort: Option<(String, SortOrder)>,
    /// Inclusive row range.
    pub range: Option<(u64, u64)>,
    pub filter: Map<String, Value>,
}

impl ListParams {
    /// One-based page of `per_page` rows.
    pub fn page(page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let start = page.max(1).saturating_sub(1).saturating_mul(per_page);
        Self {
            range: Some((start, start.saturating_add(per_page - 1))),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn filtered(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some((field, order)) = &self.sort {
            pairs.push(("sort", Value::from(vec![field.as_str(), order.as_str()]).to_string()));
        }
        if let Some((start, end)) = self.range {
            pairs.push(("range", Value::from(vec![start, end]).to_string()));
        }
        pairs.push(("filter", Value::Object(self.filter.clone()).to_string()));
        pairs
    }
}

/// One page of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub items: Vec<Value>,
    /// Total rows across all pages.
    pub total: u64,
}

impl ApiClient {
    pub async fn list(&self, resource: Resource, params: &ListParams) -> Result<ListPage, ApiError> {
        let request = self
            .request(Method::GET, &resource.collection_path())
            .query(&params.query_pairs());
        let response = self.send(request).await?;
        let total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!(
                    "the {TOTAL_COUNT_HEADER} header is missing in the HTTP response"
                ))
            })?;
        let items = match response.json::<Value>().await? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "expected a JSON array for {resource}, got {other}"
                )))
            }
        };
        Ok(ListPage { items, total })
    }

    pub async fn get_one(&self, resource: Resource, id: i64) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::GET, &resource.item_path(id)))
            .await
    }

    pub async fn create(&self, resource: Resource, record: &Value) -> Result<Value, ApiError> {
        self.send_json(
            self.request(Method::POST, &resource.collection_path())
                .json(record),
        )
        .await
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: i64,
        record: &Value,
    ) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::PUT, &resource.item_path(id)).json(record))
            .await
    }

    pub async fn delete(&self, resource: Resource, id: i64) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::DELETE, &resource.item_path(id)))
            .await
    }

    /// Create the destination table for a mapped source table.
    pub async fn create_table(&self, map_id: i64) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::POST, &format!("/api/map/{map_id}/create")))
            .await
    }

    /// Create the destination table and start replicating into it.
    pub async fn clone_table(&self, map_id: i64) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::POST, &format!("/api/map/{map_id}/clone")))
            .await
    }

    /// Re-read source schemas into the map.
    pub async fn refresh_maps(&self) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::POST, "/api/map/refresh"))
            .await
    }

    /// Restart replication for every source URL.
    pub async fn restart_all(&self) -> Result<Value, ApiError> {
        self.send_json(self.request(Method::POST, "/api/url/restart"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SharedStorage;
    use crate::session::{SessionManager, SessionSettings};
    use crate::testsupport::{http_response, serve_canned, ScriptedSource};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(addr: std::net::SocketAddr) -> ApiClient {
        let session = SessionManager::new(
            Arc::new(ScriptedSource::new(vec![])),
            Arc::new(SharedStorage::new().attach()),
            SessionSettings::default(),
        );
        session.set_token("abc", 600);
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(3), session)
    }

    #[test]
    fn resource_names_parse_case_insensitively() {
        assert_eq!("DB".parse::<Resource>(), Ok(Resource::Db));
        assert_eq!(" tbl ".parse::<Resource>(), Ok(Resource::Tbl));
        assert!("tables".parse::<Resource>().is_err());
        assert_eq!(Resource::Map.to_string(), "map");
    }

    #[test]
    fn page_maps_to_inclusive_range() {
        assert_eq!(ListParams::page(1, 10).range, Some((0, 9)));
        assert_eq!(ListParams::page(3, 25).range, Some((50, 74)));
        assert_eq!(ListParams::page(0, 0).range, Some((0, 0)));
    }

    #[test]
    fn query_pairs_are_json_encoded() {
        let params = ListParams::page(1, 10)
            .sorted_by("name", SortOrder::Desc)
            .filtered("db_id", 3);
        assert_eq!(
            params.query_pairs(),
            vec![
                ("sort", r#"["name","DESC"]"#.to_string()),
                ("range", "[0,9]".to_string()),
                ("filter", r#"{"db_id":3}"#.to_string()),
            ]
        );
        assert_eq!(
            ListParams::default().query_pairs(),
            vec![("filter", "{}".to_string())]
        );
    }

    #[tokio::test]
    async fn list_reads_items_and_total() {
        let (addr, server) = serve_canned(vec![http_response(
            200,
            &["X-Total-Count: 42"],
            r#"[{"id":1,"name":"src"},{"id":2,"name":"dst"}]"#,
        )])
        .await;
        let client = client(addr);

        let page = client
            .list(Resource::Db, &ListParams::page(1, 2).sorted_by("id", SortOrder::Asc))
            .await
            .expect("list");
        assert_eq!(page.total, 42);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1]["name"], "dst");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /api/db?"), "got: {}", requests[0]);
        assert!(requests[0].contains("range=%5B0%2C1%5D"), "got: {}", requests[0]);
        assert!(requests[0].contains("filter=%7B%7D"), "got: {}", requests[0]);
        client.session().shutdown();
    }

    #[tokio::test]
    async fn list_without_total_header_is_invalid() {
        let (addr, _server) = serve_canned(vec![http_response(200, &[], "[]")]).await;
        let client = client(addr);

        let err = client
            .list(Resource::Url, &ListParams::default())
            .await
            .expect_err("missing header");
        assert!(err.to_string().contains("X-Total-Count"), "got: {err}");
        client.session().shutdown();
    }

    #[tokio::test]
    async fn crud_and_actions_hit_expected_routes() {
        let (addr, server) = serve_canned(vec![
            http_response(201, &[], r#"{"id":7,"name":"new"}"#),
            http_response(200, &[], r#"{"id":7,"name":"renamed"}"#),
            http_response(200, &[], ""),
            http_response(200, &[], r#"{"id":3}"#),
            http_response(200, &[], r#"{"id":3}"#),
            http_response(200, &[], ""),
        ])
        .await;
        let client = client(addr);

        let created = client
            .create(Resource::Tbl, &json!({"name": "new"}))
            .await
            .expect("create");
        assert_eq!(created["id"], 7);
        let updated = client
            .update(Resource::Tbl, 7, &json!({"name": "renamed"}))
            .await
            .expect("update");
        assert_eq!(updated["name"], "renamed");
        assert_eq!(client.delete(Resource::Tbl, 7).await.expect("delete"), Value::Null);
        client.create_table(3).await.expect("create table");
        client.clone_table(3).await.expect("clone table");
        client.restart_all().await.expect("restart");

        let requests = server.await.unwrap();
        let lines: Vec<&str> = requests
            .iter()
            .map(|r| r.lines().next().unwrap_or_default())
            .collect();
        assert_eq!(
            lines,
            vec![
                "POST /api/tbl HTTP/1.1",
                "PUT /api/tbl/7 HTTP/1.1",
                "DELETE /api/tbl/7 HTTP/1.1",
                "POST /api/map/3/create HTTP/1.1",
                "POST /api/map/3/clone HTTP/1.1",
                "POST /api/url/restart HTTP/1.1",
            ]
        );
        assert!(requests[0].contains(r#"{"name":"new"}"#));
        client.session().shutdown();
    }
}
