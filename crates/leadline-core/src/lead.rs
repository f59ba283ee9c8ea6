use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::enums::{Bhk, City, PropertyType, Purpose, Source, Status, Timeline};
use crate::ids::LeadId;

/// Field names eligible for audit diffing, in canonical order. Everything on
/// a lead except identity, owner, and the modification timestamp.
pub const AUDITED_FIELDS: [&str; 14] = [
    "fullName",
    "email",
    "phone",
    "city",
    "propertyType",
    "bhk",
    "purpose",
    "budgetMin",
    "budgetMax",
    "timeline",
    "source",
    "status",
    "notes",
    "tags",
];

/// A buyer lead as stored. `updated_at` is the canonical ISO-8601
/// modification timestamp and doubles as the optimistic-concurrency token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: Source,
    pub status: Status,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub owner_id: String,
    pub updated_at: String,
}

impl Lead {
    /// JSON projection of one audited field, for diff comparison.
    pub fn audited_value(&self, field: &str) -> Value {
        match field {
            "fullName" => json!(self.full_name),
            "email" => json!(self.email),
            "phone" => json!(self.phone),
            "city" => json!(self.city),
            "propertyType" => json!(self.property_type),
            "bhk" => json!(self.bhk),
            "purpose" => json!(self.purpose),
            "budgetMin" => json!(self.budget_min),
            "budgetMax" => json!(self.budget_max),
            "timeline" => json!(self.timeline),
            "source" => json!(self.source),
            "status" => json!(self.status),
            "notes" => json!(self.notes),
            "tags" => json!(self.tags),
            _ => Value::Null,
        }
    }
}

/// A validated lead payload. Produced only by `validate_lead`; required
/// fields are guaranteed present, cross-field invariants already hold.
/// `status` and `tags` keep their supplied-or-absent distinction because
/// updates must not audit fields the client never sent.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadDraft {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: Source,
    pub status: Option<Status>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl LeadDraft {
    /// View the draft as a partial update. Required fields are always
    /// present in the patch; optional fields appear only if supplied.
    pub fn into_patch(self) -> LeadPatch {
        LeadPatch {
            full_name: Some(self.full_name),
            email: self.email,
            phone: Some(self.phone),
            city: Some(self.city),
            property_type: Some(self.property_type),
            bhk: self.bhk,
            purpose: Some(self.purpose),
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            timeline: Some(self.timeline),
            source: Some(self.source),
            status: self.status,
            notes: self.notes,
            tags: self.tags,
        }
    }
}

/// A partial update. `None` means the field was absent from the request:
/// it is neither compared for audit nor written to the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<City>,
    pub property_type: Option<PropertyType>,
    pub bhk: Option<Bhk>,
    pub purpose: Option<Purpose>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Option<Timeline>,
    pub source: Option<Source>,
    pub status: Option<Status>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl LeadPatch {
    pub fn status_only(status: Status) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    /// JSON projection of one audited field, or `None` if the field is
    /// absent from this patch.
    pub fn audited_value(&self, field: &str) -> Option<Value> {
        match field {
            "fullName" => self.full_name.as_ref().map(|v| json!(v)),
            "email" => self.email.as_ref().map(|v| json!(v)),
            "phone" => self.phone.as_ref().map(|v| json!(v)),
            "city" => self.city.map(|v| json!(v)),
            "propertyType" => self.property_type.map(|v| json!(v)),
            "bhk" => self.bhk.map(|v| json!(v)),
            "purpose" => self.purpose.map(|v| json!(v)),
            "budgetMin" => self.budget_min.map(|v| json!(v)),
            "budgetMax" => self.budget_max.map(|v| json!(v)),
            "timeline" => self.timeline.map(|v| json!(v)),
            "source" => self.source.map(|v| json!(v)),
            "status" => self.status.map(|v| json!(v)),
            "notes" => self.notes.as_ref().map(|v| json!(v)),
            "tags" => self.tags.as_ref().map(|v| json!(v)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        AUDITED_FIELDS.iter().all(|f| self.audited_value(f).is_none())
    }
}
