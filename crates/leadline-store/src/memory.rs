//! In-memory `StoreBackend` with the same filter, search, order, and range
//! semantics as the remote store. Backs tests, and local development when
//! no store URL is configured. Rows are kept as raw store-convention JSON
//! so the translation layer is exercised identically.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::backend::{Row, RowPage, SelectQuery, StoreBackend};
use crate::error::StoreError;

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    fail_inserts: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail, for exercising storage-failure
    /// paths in tests.
    pub fn fail_inserts(&self, failing: bool) {
        self.fail_inserts.store(failing, AtomicOrdering::SeqCst);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }
}

fn matches(row: &Row, query: &SelectQuery) -> bool {
    for (column, want) in &query.filters {
        match row.get(column) {
            Some(Value::String(s)) if s == want => {}
            _ => return false,
        }
    }
    if let Some((columns, term)) = &query.search {
        let needle = term.to_lowercase();
        let hit = columns.iter().any(|c| {
            matches!(row.get(c), Some(Value::String(s)) if s.to_lowercase().contains(&needle))
        });
        if !hit {
            return false;
        }
    }
    true
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<RowPage, StoreError> {
        let tables = self.tables.read();
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).cloned().collect())
            .unwrap_or_default();
        let total = rows.len();

        rows.sort_by(|a, b| {
            for (column, descending) in &query.order {
                let ord = compare_values(a.get(column), b.get(column));
                let ord = if *descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        let rows: Vec<Row> = match query.limit {
            Some(limit) => rows.into_iter().skip(query.offset).take(limit).collect(),
            None => rows.into_iter().skip(query.offset).collect(),
        };
        Ok(RowPage { rows, total })
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        if self.fail_inserts.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend("injected insert failure".into()));
        }
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(format!("{table} row {id}")))?;
        let row = rows
            .iter_mut()
            .find(|r| matches!(r.get("id"), Some(Value::String(s)) if s == id))
            .ok_or_else(|| StoreError::NotFound(format!("{table} row {id}")))?;
        for (key, value) in changes {
            row.insert(key, value);
        }
        Ok(row.clone())
    }
}
