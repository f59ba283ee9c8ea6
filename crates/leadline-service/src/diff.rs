//! Field-level diffing for the audit trail. Only fields present in the
//! incoming patch are compared; an empty diff means a no-op update and
//! nothing gets appended.

use serde_json::{json, Value};

use leadline_core::history::{Diff, FieldChange, INITIAL_FIELD};
use leadline_core::lead::{Lead, LeadPatch, AUDITED_FIELDS};

/// Compare every audited field the patch supplies against the stored
/// lead, JSON structural equality, order-sensitive for `tags`.
pub fn compute_diff(existing: &Lead, patch: &LeadPatch) -> Diff {
    let mut diff = Diff::new();
    for field in AUDITED_FIELDS {
        if let Some(incoming) = patch.audited_value(field) {
            let current = existing.audited_value(field);
            if current != incoming {
                diff.insert(field.to_string(), FieldChange { old: current, new: incoming });
            }
        }
    }
    diff
}

/// The creation sentinel: a single `_initial` pseudo-field instead of a
/// per-field diff.
pub fn initial_diff() -> Diff {
    let mut diff = Diff::new();
    diff.insert(INITIAL_FIELD.to_string(), FieldChange { old: Value::Null, new: json!("Created") });
    diff
}
