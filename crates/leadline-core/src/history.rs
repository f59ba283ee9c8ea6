use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{HistoryId, LeadId};

/// Pseudo-field recorded in the diff of a creation history entry.
pub const INITIAL_FIELD: &str = "_initial";

/// Before/after values for one changed field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Changed-field-name to before/after mapping. Possibly empty; an empty
/// diff is never persisted.
pub type Diff = BTreeMap<String, FieldChange>;

/// One immutable audit record. Entries are append-only and survive later
/// edits to the lead they describe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub lead_id: LeadId,
    pub changed_by: String,
    pub changed_at: String,
    pub diff: Diff,
}
