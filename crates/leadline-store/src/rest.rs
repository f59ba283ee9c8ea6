//! Remote store backend speaking the PostgREST row dialect: tables
//! addressed by URL path, `column=eq.value` filters, `or=(...ilike...)`
//! search, `Range` headers for paging with `Prefer: count=exact` totals,
//! and `Prefer: return=representation` on writes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::backend::{Row, RowPage, SelectQuery, StoreBackend};
use crate::error::StoreError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RestConfig {
    /// Row API root, e.g. `https://project.example.co/rest/v1`.
    pub base_url: String,
    pub service_key: SecretString,
}

pub struct RestBackend {
    client: Client,
    base_url: String,
    service_key: SecretString,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", self.service_key.expose_secret())
            .header(
                "Authorization",
                format!("Bearer {}", self.service_key.expose_secret()),
            )
            .header("accept", "application/json")
    }
}

/// Render a select as PostgREST query parameters.
fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![(
        "select".to_string(),
        query.columns.clone().unwrap_or_else(|| "*".to_string()),
    )];
    for (column, value) in &query.filters {
        params.push((column.clone(), format!("eq.{value}")));
    }
    if let Some((columns, term)) = &query.search {
        // Quoted pattern values keep commas in the term from breaking the
        // or=() syntax; quotes and backslashes cannot be escaped portably,
        // so they are dropped from the term.
        let term = term.replace(['"', '\\'], "");
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("{c}.ilike.\"*{term}*\""))
            .collect();
        params.push(("or".to_string(), format!("({})", clauses.join(","))));
    }
    if !query.order.is_empty() {
        let keys: Vec<String> = query
            .order
            .iter()
            .map(|(column, descending)| {
                format!("{column}.{}", if *descending { "desc" } else { "asc" })
            })
            .collect();
        params.push(("order".to_string(), keys.join(",")));
    }
    params
}

fn range_header(offset: usize, limit: usize) -> String {
    format!("{}-{}", offset, offset + limit.max(1) - 1)
}

/// Total row count from a `Content-Range` header such as `0-9/57`.
fn content_range_total(header: &str) -> Option<usize> {
    header.rsplit('/').next()?.trim().parse().ok()
}

async fn failure(table: &str, op: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Backend(format!("{table} {op} failed: {status} {body}"))
}

#[async_trait]
impl StoreBackend for RestBackend {
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<RowPage, StoreError> {
        let mut req = self
            .request(Method::GET, table)
            .query(&select_params(query))
            .header("Prefer", "count=exact");
        if let Some(limit) = query.limit {
            req = req
                .header("Range-Unit", "items")
                .header("Range", range_header(query.offset, limit));
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(failure(table, "select", resp).await);
        }
        let total_header = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let rows: Vec<Row> = resp.json().await?;
        let total = total_header
            .as_deref()
            .and_then(content_range_total)
            .unwrap_or(rows.len());
        debug!(table, total, returned = rows.len(), "select");
        Ok(RowPage { rows, total })
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let resp = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(failure(table, "insert", resp).await);
        }
        let rows: Vec<Row> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("{table} insert returned no rows")))
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row, StoreError> {
        let resp = self
            .request(Method::PATCH, table)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&changes)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(failure(table, "update", resp).await);
        }
        let rows: Vec<Row> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("{table} row {id}")))
    }
}
