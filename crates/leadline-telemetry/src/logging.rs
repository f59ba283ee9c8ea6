use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// A log record persisted to SQLite.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Option<String>,
}

/// Query parameters for searching persisted logs.
#[derive(Clone, Debug, Default)]
pub struct LogQuery {
    pub level: Option<String>,
    pub target: Option<String>,
    pub since: Option<String>,
    pub limit: Option<u32>,
}

/// SQLite sink that persists warn+ logs for post-hoc inspection.
pub struct SqliteLogSink {
    conn: Mutex<Connection>,
}

impl SqliteLogSink {
    pub fn new(db_path: &Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS logs (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp TEXT NOT NULL,
                 level TEXT NOT NULL,
                 target TEXT NOT NULL,
                 message TEXT NOT NULL,
                 fields TEXT
             );
             CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level);
             CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn insert(&self, timestamp: &str, level: &str, target: &str, message: &str, fields: Option<&str>) {
        let conn = self.conn.lock();
        let _ = conn.execute(
            "INSERT INTO logs (timestamp, level, target, message, fields)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![timestamp, level, target, message, fields],
        );
    }

    pub fn query(&self, q: &LogQuery) -> Result<Vec<LogRecord>, rusqlite::Error> {
        let conn = self.conn.lock();
        let mut sql = String::from(
            "SELECT id, timestamp, level, target, message, fields FROM logs WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(level) = &q.level {
            sql.push_str(&format!(" AND level = ?{}", params.len() + 1));
            params.push(Box::new(level.clone()));
        }
        if let Some(target) = &q.target {
            sql.push_str(&format!(" AND target LIKE ?{}", params.len() + 1));
            params.push(Box::new(format!("%{target}%")));
        }
        if let Some(since) = &q.since {
            sql.push_str(&format!(" AND timestamp >= ?{}", params.len() + 1));
            params.push(Box::new(since.clone()));
        }

        sql.push_str(" ORDER BY id DESC");
        let limit = q.limit.unwrap_or(100);
        sql.push_str(&format!(" LIMIT {limit}"));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(LogRecord {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                level: row.get(2)?,
                target: row.get(3)?,
                message: row.get(4)?,
                fields: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    pub fn count(&self) -> Result<i64, rusqlite::Error> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
    }

    /// Delete records older than the retention window. Returns the number
    /// of rows removed.
    pub fn prune_older_than(&self, days: u32) -> Result<usize, rusqlite::Error> {
        let cutoff = (Utc::now() - Duration::days(i64::from(days))).to_rfc3339();
        let conn = self.conn.lock();
        conn.execute("DELETE FROM logs WHERE timestamp < ?1", rusqlite::params![cutoff])
    }
}

/// Visitor that extracts the message plus structured fields from an event.
struct FieldVisitor {
    message: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self { message: None, fields: serde_json::Map::new() }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let val = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(val);
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(val));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }
}

/// tracing Layer that writes warn+ events to SQLite.
pub struct SqliteLogLayer {
    sink: Arc<SqliteLogSink>,
}

impl SqliteLogLayer {
    pub fn new(sink: Arc<SqliteLogSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for SqliteLogLayer
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > tracing::Level::WARN {
            return;
        }

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let fields_json = if visitor.fields.is_empty() {
            None
        } else {
            serde_json::to_string(&visitor.fields).ok()
        };

        self.sink.insert(
            &Utc::now().to_rfc3339(),
            &level.to_string().to_uppercase(),
            event.metadata().target(),
            visitor.message.as_deref().unwrap_or_default(),
            fields_json.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leadline-test-logs-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("test-logs.db")
    }

    #[test]
    fn create_and_insert() {
        let sink = SqliteLogSink::new(&temp_db()).unwrap();
        sink.insert(
            "2026-02-14T12:00:00Z",
            "WARN",
            "leadline_store::rest",
            "select failed",
            Some(r#"{"table":"buyers"}"#),
        );
        assert_eq!(sink.count().unwrap(), 1);
    }

    #[test]
    fn query_by_level_and_target() {
        let sink = SqliteLogSink::new(&temp_db()).unwrap();
        sink.insert("2026-02-14T12:00:00Z", "WARN", "leadline_ai::http", "retrying", None);
        sink.insert("2026-02-14T12:00:01Z", "ERROR", "leadline_store::rest", "insert failed", None);

        let errors = sink
            .query(&LogQuery { level: Some("ERROR".into()), ..Default::default() })
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "insert failed");

        let by_target = sink
            .query(&LogQuery { target: Some("leadline_ai".into()), ..Default::default() })
            .unwrap();
        assert_eq!(by_target.len(), 1);
        assert_eq!(by_target[0].message, "retrying");
    }

    #[test]
    fn query_newest_first_with_limit() {
        let sink = SqliteLogSink::new(&temp_db()).unwrap();
        for i in 0..10 {
            sink.insert(
                &format!("2026-02-14T12:00:{i:02}Z"),
                "WARN",
                "test",
                &format!("msg {i}"),
                None,
            );
        }
        let results = sink.query(&LogQuery { limit: Some(3), ..Default::default() }).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].message, "msg 9");
    }

    #[test]
    fn query_since_filters_old_records() {
        let sink = SqliteLogSink::new(&temp_db()).unwrap();
        sink.insert("2026-02-14T11:00:00Z", "WARN", "test", "old", None);
        sink.insert("2026-02-14T13:00:00Z", "WARN", "test", "new", None);

        let results = sink
            .query(&LogQuery { since: Some("2026-02-14T12:00:00Z".into()), ..Default::default() })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "new");
    }

    #[test]
    fn prune_drops_only_expired() {
        let sink = SqliteLogSink::new(&temp_db()).unwrap();
        sink.insert("2001-01-01T00:00:00Z", "WARN", "test", "ancient", None);
        sink.insert(&Utc::now().to_rfc3339(), "WARN", "test", "fresh", None);

        let pruned = sink.prune_older_than(7).unwrap();
        assert_eq!(pruned, 1);
        let remaining = sink.query(&LogQuery::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "fresh");
    }

    #[test]
    fn log_record_serde_roundtrip() {
        let record = LogRecord {
            id: 1,
            timestamp: "2026-02-14T12:00:00Z".into(),
            level: "ERROR".into(),
            target: "leadline_service::actions".into(),
            message: "store operation failed".into(),
            fields: Some(r#"{"lead_id":"lead_01"}"#.into()),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, 1);
        assert_eq!(parsed.level, "ERROR");
        assert_eq!(parsed.fields.as_deref(), Some(r#"{"lead_id":"lead_01"}"#));
    }
}
