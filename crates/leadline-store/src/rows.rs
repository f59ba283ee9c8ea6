//! Row translation between the application model and the store's own
//! column convention. The store names columns in all-lowercase
//! (`fullname`, `propertytype`, `updatedat`); the application speaks
//! camelCase. Reads tolerate either convention per field so rows written
//! by older clients stay readable; writes always use the store convention.

use std::str::FromStr;

use serde_json::{json, Value};

use leadline_core::history::{Diff, HistoryEntry};
use leadline_core::ids::{HistoryId, LeadId};
use leadline_core::lead::{Lead, LeadDraft, LeadPatch};
use leadline_core::time;

use crate::backend::Row;
use crate::error::StoreError;

pub const LEADS_TABLE: &str = "buyers";
pub const HISTORY_TABLE: &str = "buyer_history";

/// Look a field up under the application convention first, then the store
/// convention. JSON null reads as absent.
fn field<'a>(row: &'a Row, camel: &str, lower: &str) -> Option<&'a Value> {
    row.get(camel)
        .or_else(|| row.get(lower))
        .filter(|v| !v.is_null())
}

fn corrupt(table: &'static str, column: &'static str, detail: impl Into<String>) -> StoreError {
    StoreError::CorruptRow { table, column, detail: detail.into() }
}

fn req_str(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<String, StoreError> {
    match field(row, camel, lower) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(corrupt(table, lower, format!("expected string, got {other}"))),
        None => Err(corrupt(table, lower, "missing")),
    }
}

fn opt_str(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<Option<String>, StoreError> {
    match field(row, camel, lower) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(corrupt(table, lower, format!("expected string, got {other}"))),
    }
}

fn opt_i64(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<Option<i64>, StoreError> {
    match field(row, camel, lower) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| corrupt(table, lower, format!("expected integer, got {n}"))),
        Some(other) => Err(corrupt(table, lower, format!("expected integer, got {other}"))),
    }
}

fn req_enum<T: FromStr>(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<T, StoreError> {
    let raw = req_str(row, table, camel, lower)?;
    raw.parse()
        .map_err(|_| corrupt(table, lower, format!("unknown variant: {raw}")))
}

fn opt_enum<T: FromStr>(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<Option<T>, StoreError> {
    match opt_str(row, table, camel, lower)? {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| corrupt(table, lower, format!("unknown variant: {raw}"))),
    }
}

/// Read a timestamp column and re-render it canonically, so downstream
/// string comparisons are exact regardless of how the row was written.
fn req_timestamp(
    row: &Row,
    table: &'static str,
    camel: &str,
    lower: &'static str,
) -> Result<String, StoreError> {
    let raw = req_str(row, table, camel, lower)?;
    time::canonicalize(&raw).ok_or_else(|| corrupt(table, lower, format!("invalid timestamp: {raw}")))
}

fn tags_field(row: &Row, table: &'static str) -> Result<Vec<String>, StoreError> {
    match field(row, "tags", "tags") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| corrupt(table, "tags", format!("non-string tag: {v}")))
            })
            .collect(),
        Some(other) => Err(corrupt(table, "tags", format!("expected array, got {other}"))),
    }
}

pub fn lead_from_row(row: &Row) -> Result<Lead, StoreError> {
    let t = LEADS_TABLE;
    Ok(Lead {
        id: LeadId::from_raw(req_str(row, t, "id", "id")?),
        full_name: req_str(row, t, "fullName", "fullname")?,
        email: opt_str(row, t, "email", "email")?,
        phone: req_str(row, t, "phone", "phone")?,
        city: req_enum(row, t, "city", "city")?,
        property_type: req_enum(row, t, "propertyType", "propertytype")?,
        bhk: opt_enum(row, t, "bhk", "bhk")?,
        purpose: req_enum(row, t, "purpose", "purpose")?,
        budget_min: opt_i64(row, t, "budgetMin", "budgetmin")?,
        budget_max: opt_i64(row, t, "budgetMax", "budgetmax")?,
        timeline: req_enum(row, t, "timeline", "timeline")?,
        source: req_enum(row, t, "source", "source")?,
        status: req_enum(row, t, "status", "status")?,
        notes: opt_str(row, t, "notes", "notes")?,
        tags: tags_field(row, t)?,
        owner_id: req_str(row, t, "ownerId", "ownerid")?,
        updated_at: req_timestamp(row, t, "updatedAt", "updatedat")?,
    })
}

pub fn history_from_row(row: &Row) -> Result<HistoryEntry, StoreError> {
    let t = HISTORY_TABLE;
    let diff_value = field(row, "diff", "diff")
        .cloned()
        .ok_or_else(|| corrupt(t, "diff", "missing"))?;
    let diff: Diff = serde_json::from_value(diff_value)
        .map_err(|e| corrupt(t, "diff", format!("invalid diff: {e}")))?;
    Ok(HistoryEntry {
        id: HistoryId::from_raw(req_str(row, t, "id", "id")?),
        lead_id: LeadId::from_raw(req_str(row, t, "buyerId", "buyerid")?),
        changed_by: req_str(row, t, "changedBy", "changedby")?,
        changed_at: req_timestamp(row, t, "changedAt", "changedat")?,
        diff,
    })
}

/// Full insert row for a new lead. Every column is written explicitly,
/// optional fields as JSON null, status defaulting to `New`.
pub fn draft_to_row(draft: &LeadDraft, id: &LeadId, owner_id: &str, now: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".into(), json!(id));
    row.insert("fullname".into(), json!(draft.full_name));
    row.insert("email".into(), json!(draft.email));
    row.insert("phone".into(), json!(draft.phone));
    row.insert("city".into(), json!(draft.city));
    row.insert("propertytype".into(), json!(draft.property_type));
    row.insert("bhk".into(), json!(draft.bhk));
    row.insert("purpose".into(), json!(draft.purpose));
    row.insert("budgetmin".into(), json!(draft.budget_min));
    row.insert("budgetmax".into(), json!(draft.budget_max));
    row.insert("timeline".into(), json!(draft.timeline));
    row.insert("source".into(), json!(draft.source));
    row.insert("status".into(), json!(draft.status.unwrap_or_default()));
    row.insert("notes".into(), json!(draft.notes));
    row.insert("tags".into(), json!(draft.tags.clone().unwrap_or_default()));
    row.insert("ownerid".into(), json!(owner_id));
    row.insert("updatedat".into(), json!(now));
    row
}

/// Partial update row: only the fields present in the patch, plus the
/// refreshed modification timestamp.
pub fn patch_to_row(patch: &LeadPatch, now: &str) -> Row {
    let mut row = Row::new();
    if let Some(v) = &patch.full_name {
        row.insert("fullname".into(), json!(v));
    }
    if let Some(v) = &patch.email {
        row.insert("email".into(), json!(v));
    }
    if let Some(v) = &patch.phone {
        row.insert("phone".into(), json!(v));
    }
    if let Some(v) = patch.city {
        row.insert("city".into(), json!(v));
    }
    if let Some(v) = patch.property_type {
        row.insert("propertytype".into(), json!(v));
    }
    if let Some(v) = patch.bhk {
        row.insert("bhk".into(), json!(v));
    }
    if let Some(v) = patch.purpose {
        row.insert("purpose".into(), json!(v));
    }
    if let Some(v) = patch.budget_min {
        row.insert("budgetmin".into(), json!(v));
    }
    if let Some(v) = patch.budget_max {
        row.insert("budgetmax".into(), json!(v));
    }
    if let Some(v) = patch.timeline {
        row.insert("timeline".into(), json!(v));
    }
    if let Some(v) = patch.source {
        row.insert("source".into(), json!(v));
    }
    if let Some(v) = patch.status {
        row.insert("status".into(), json!(v));
    }
    if let Some(v) = &patch.notes {
        row.insert("notes".into(), json!(v));
    }
    if let Some(v) = &patch.tags {
        row.insert("tags".into(), json!(v));
    }
    row.insert("updatedat".into(), json!(now));
    row
}

pub fn history_to_row(
    id: &HistoryId,
    lead_id: &LeadId,
    changed_by: &str,
    changed_at: &str,
    diff: &Diff,
) -> Row {
    let mut row = Row::new();
    row.insert("id".into(), json!(id));
    row.insert("buyerid".into(), json!(lead_id));
    row.insert("changedby".into(), json!(changed_by));
    row.insert("changedat".into(), json!(changed_at));
    row.insert("diff".into(), json!(diff));
    row
}

/// Status column alone, for count projections.
pub fn status_from_row(row: &Row) -> Result<leadline_core::enums::Status, StoreError> {
    req_enum(row, LEADS_TABLE, "status", "status")
}

/// Translate an application-convention sort key to its store column.
/// Unknown keys get no column; callers fall back to the default sort.
pub fn sort_column(key: &str) -> Option<&'static str> {
    match key {
        "updatedAt" => Some("updatedat"),
        "fullName" => Some("fullname"),
        "email" => Some("email"),
        "phone" => Some("phone"),
        "city" => Some("city"),
        "propertyType" => Some("propertytype"),
        "bhk" => Some("bhk"),
        "purpose" => Some("purpose"),
        "budgetMin" => Some("budgetmin"),
        "budgetMax" => Some("budgetmax"),
        "timeline" => Some("timeline"),
        "source" => Some("source"),
        "status" => Some("status"),
        _ => None,
    }
}
