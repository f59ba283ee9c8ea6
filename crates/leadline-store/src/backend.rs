use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// A raw store row. Keys follow the backing store's own column convention;
/// the `rows` module translates to and from the application model.
pub type Row = serde_json::Map<String, Value>;

/// One page of rows plus the exact total count of rows matching the query
/// before paging.
#[derive(Clone, Debug)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub total: usize,
}

/// A select against one table, expressed in store-convention column names.
#[derive(Clone, Debug, Default)]
pub struct SelectQuery {
    /// Column projection; `None` selects every column.
    pub columns: Option<String>,
    /// Equality filters, ANDed together.
    pub filters: Vec<(String, String)>,
    /// Case-insensitive substring search ORed across these columns.
    pub search: Option<(Vec<String>, String)>,
    /// Sort keys applied in order; `true` = descending.
    pub order: Vec<(String, bool)>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SelectQuery {
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn search(mut self, columns: &[&str], term: impl Into<String>) -> Self {
        self.search = Some((columns.iter().map(|c| c.to_string()).collect(), term.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order.push((column.into(), descending));
        self
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Minimal row-level contract against the remote store. Implementations
/// must not assume anything about column meaning; single-row writes are
/// atomic at the store and that is the only atomicity offered.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<RowPage, StoreError>;

    /// Insert one row, returning it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Partially update the row with the given id, returning it as stored.
    /// Fails with `NotFound` when no row matches.
    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row, StoreError>;
}
