//! Lead payload validation. Collects every field issue instead of stopping
//! at the first, so form errors can map back to specific fields.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::enums::{Bhk, City, PropertyType, Purpose, Source, Status, Timeline};
use crate::lead::LeadDraft;

/// One field-level validation failure. `path` is the camelCase field name
/// as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Raw, unvalidated lead payload. Everything is optional at this layer;
/// `validate_lead` decides what is actually required. `updated_at` is the
/// client's concurrency token and passes through untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub bhk: Option<String>,
    pub purpose: Option<String>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub updated_at: Option<String>,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"))
}

fn required_enum<T: FromStr>(
    raw: Option<&str>,
    path: &str,
    invalid: &str,
    issues: &mut Vec<Issue>,
) -> Option<T> {
    match raw {
        None => {
            issues.push(Issue::new(path, "Required"));
            None
        }
        Some(s) => match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                issues.push(Issue::new(path, invalid));
                None
            }
        },
    }
}

fn optional_enum<T: FromStr>(
    raw: Option<&str>,
    path: &str,
    invalid: &str,
    issues: &mut Vec<Issue>,
) -> Option<T> {
    match raw {
        None => None,
        Some(s) => match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                issues.push(Issue::new(path, invalid));
                None
            }
        },
    }
}

/// Validate a raw payload into a `LeadDraft`, or report every violation.
pub fn validate_lead(input: LeadInput) -> Result<LeadDraft, Vec<Issue>> {
    let mut issues = Vec::new();

    let full_name = match input.full_name {
        None => {
            issues.push(Issue::new("fullName", "Required"));
            None
        }
        Some(name) => {
            let len = name.chars().count();
            if len < 2 {
                issues.push(Issue::new("fullName", "Full name must be at least 2 characters"));
                None
            } else if len > 80 {
                issues.push(Issue::new("fullName", "Full name cannot exceed 80 characters"));
                None
            } else {
                Some(name)
            }
        }
    };

    // Empty email means "no email", not an invalid one.
    let email = match input.email.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            if email_regex().is_match(raw) {
                Some(raw.to_string())
            } else {
                issues.push(Issue::new("email", "Invalid email address"));
                None
            }
        }
    };

    let phone = match input.phone {
        None => {
            issues.push(Issue::new("phone", "Required"));
            None
        }
        Some(phone) => {
            if phone.chars().any(|c| !c.is_ascii_digit()) {
                issues.push(Issue::new("phone", "Phone must contain only digits"));
                None
            } else if phone.len() < 10 {
                issues.push(Issue::new("phone", "Phone must be at least 10 digits"));
                None
            } else if phone.len() > 15 {
                issues.push(Issue::new("phone", "Phone cannot exceed 15 digits"));
                None
            } else {
                Some(phone)
            }
        }
    };

    let city: Option<City> =
        required_enum(input.city.as_deref(), "city", "Invalid city", &mut issues);
    let property_type: Option<PropertyType> = required_enum(
        input.property_type.as_deref(),
        "propertyType",
        "Invalid property type",
        &mut issues,
    );
    let bhk: Option<Bhk> = optional_enum(input.bhk.as_deref(), "bhk", "Invalid BHK", &mut issues);
    let purpose: Option<Purpose> =
        required_enum(input.purpose.as_deref(), "purpose", "Invalid purpose", &mut issues);
    let timeline: Option<Timeline> =
        required_enum(input.timeline.as_deref(), "timeline", "Invalid timeline", &mut issues);
    let source: Option<Source> =
        required_enum(input.source.as_deref(), "source", "Invalid source", &mut issues);
    let status: Option<Status> =
        optional_enum(input.status.as_deref(), "status", "Invalid status", &mut issues);

    if let Some(pt) = property_type {
        if pt.is_residential() && bhk.is_none() && input.bhk.is_none() {
            issues.push(Issue::new("bhk", "BHK is required for Apartments and Villas"));
        }
    }

    let budget_min = match input.budget_min {
        Some(v) if v <= 0 => {
            issues.push(Issue::new("budgetMin", "Budget must be a positive number"));
            None
        }
        other => other,
    };
    let budget_max = match input.budget_max {
        Some(v) if v <= 0 => {
            issues.push(Issue::new("budgetMax", "Budget must be a positive number"));
            None
        }
        other => other,
    };
    if let (Some(min), Some(max)) = (budget_min, budget_max) {
        if max < min {
            issues.push(Issue::new(
                "budgetMax",
                "Max budget must be greater than or equal to min budget",
            ));
        }
    }

    let notes = match input.notes {
        Some(notes) if notes.chars().count() > 1000 => {
            issues.push(Issue::new("notes", "Notes cannot exceed 1000 characters"));
            None
        }
        other => other,
    };

    let tags = input.tags.map(normalize_tags);

    match (full_name, phone, city, property_type, purpose, timeline, source) {
        (
            Some(full_name),
            Some(phone),
            Some(city),
            Some(property_type),
            Some(purpose),
            Some(timeline),
            Some(source),
        ) if issues.is_empty() => Ok(LeadDraft {
            full_name,
            email,
            phone,
            city,
            property_type,
            bhk,
            purpose,
            budget_min,
            budget_max,
            timeline,
            source,
            status,
            notes,
            tags,
        }),
        _ => Err(issues),
    }
}

/// Trim tags, drop empties, and de-duplicate keeping first occurrence.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> LeadInput {
        LeadInput {
            full_name: Some("Asha Verma".into()),
            phone: Some("9876543210".into()),
            city: Some("Mohali".into()),
            property_type: Some("Plot".into()),
            purpose: Some("Buy".into()),
            timeline: Some("Exploring".into()),
            source: Some("Website".into()),
            ..LeadInput::default()
        }
    }

    fn paths(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn minimal_valid_payload() {
        let draft = validate_lead(valid_input()).unwrap();
        assert_eq!(draft.full_name, "Asha Verma");
        assert_eq!(draft.city, City::Mohali);
        assert_eq!(draft.status, None);
        assert_eq!(draft.tags, None);
        assert_eq!(draft.email, None);
    }

    #[test]
    fn empty_payload_reports_every_required_field() {
        let issues = validate_lead(LeadInput::default()).unwrap_err();
        let mut got = paths(&issues);
        got.sort();
        assert_eq!(
            got,
            vec!["city", "fullName", "phone", "propertyType", "purpose", "source", "timeline"]
        );
        assert!(issues.iter().all(|i| i.message == "Required"));
    }

    #[test]
    fn full_name_length_bounds() {
        let mut input = valid_input();
        input.full_name = Some("A".into());
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues[0].message, "Full name must be at least 2 characters");

        let mut input = valid_input();
        input.full_name = Some("x".repeat(81));
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues[0].message, "Full name cannot exceed 80 characters");

        let mut input = valid_input();
        input.full_name = Some("x".repeat(80));
        assert!(validate_lead(input).is_ok());
    }

    #[test]
    fn empty_email_is_absent_not_invalid() {
        let mut input = valid_input();
        input.email = Some(String::new());
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.email, None);
    }

    #[test]
    fn malformed_email_rejected() {
        let mut input = valid_input();
        input.email = Some("not-an-email".into());
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues, vec![Issue::new("email", "Invalid email address")]);

        let mut input = valid_input();
        input.email = Some("asha@example.com".into());
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn phone_rules() {
        let mut input = valid_input();
        input.phone = Some("98765-4321".into());
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues[0].message, "Phone must contain only digits");

        let mut input = valid_input();
        input.phone = Some("987654321".into());
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues[0].message, "Phone must be at least 10 digits");

        let mut input = valid_input();
        input.phone = Some("9".repeat(16));
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues[0].message, "Phone cannot exceed 15 digits");

        let mut input = valid_input();
        input.phone = Some("9".repeat(15));
        assert!(validate_lead(input).is_ok());
    }

    #[test]
    fn bhk_required_for_residential_only() {
        for pt in ["Apartment", "Villa"] {
            let mut input = valid_input();
            input.property_type = Some(pt.into());
            let issues = validate_lead(input).unwrap_err();
            assert_eq!(
                issues,
                vec![Issue::new("bhk", "BHK is required for Apartments and Villas")],
                "property type {pt}"
            );
        }

        for pt in ["Plot", "Office", "Retail"] {
            let mut input = valid_input();
            input.property_type = Some(pt.into());
            assert!(validate_lead(input).is_ok(), "property type {pt}");
        }

        let mut input = valid_input();
        input.property_type = Some("Villa".into());
        input.bhk = Some("3".into());
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.bhk, Some(Bhk::Three));
    }

    #[test]
    fn budget_ordering() {
        let mut input = valid_input();
        input.budget_min = Some(5_000_000);
        input.budget_max = Some(4_000_000);
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(
            issues,
            vec![Issue::new("budgetMax", "Max budget must be greater than or equal to min budget")]
        );

        // Equal bounds and single bounds are accepted.
        let mut input = valid_input();
        input.budget_min = Some(5_000_000);
        input.budget_max = Some(5_000_000);
        assert!(validate_lead(input).is_ok());

        let mut input = valid_input();
        input.budget_min = Some(5_000_000);
        assert!(validate_lead(input).is_ok());

        let mut input = valid_input();
        input.budget_max = Some(5_000_000);
        assert!(validate_lead(input).is_ok());
    }

    #[test]
    fn budgets_must_be_positive() {
        let mut input = valid_input();
        input.budget_min = Some(0);
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues, vec![Issue::new("budgetMin", "Budget must be a positive number")]);

        let mut input = valid_input();
        input.budget_max = Some(-100);
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues, vec![Issue::new("budgetMax", "Budget must be a positive number")]);
    }

    #[test]
    fn notes_bounded() {
        let mut input = valid_input();
        input.notes = Some("x".repeat(1001));
        let issues = validate_lead(input).unwrap_err();
        assert_eq!(issues, vec![Issue::new("notes", "Notes cannot exceed 1000 characters")]);

        let mut input = valid_input();
        input.notes = Some("x".repeat(1000));
        assert!(validate_lead(input).is_ok());
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let mut input = valid_input();
        input.tags = Some(vec![
            " hot ".into(),
            "nri".into(),
            "hot".into(),
            "  ".into(),
            String::new(),
        ]);
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.tags, Some(vec!["hot".to_string(), "nri".to_string()]));
    }

    #[test]
    fn invalid_enum_values() {
        let mut input = valid_input();
        input.city = Some("Atlantis".into());
        input.status = Some("Stalled".into());
        let issues = validate_lead(input).unwrap_err();
        let mut got = paths(&issues);
        got.sort();
        assert_eq!(got, vec!["city", "status"]);
        assert!(issues.iter().any(|i| i.message == "Invalid city"));
        assert!(issues.iter().any(|i| i.message == "Invalid status"));
    }

    #[test]
    fn status_parsed_when_supplied() {
        let mut input = valid_input();
        input.status = Some("Converted".into());
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.status, Some(Status::Converted));
    }

    #[test]
    fn collects_issues_across_fields() {
        let mut input = valid_input();
        input.full_name = Some("A".into());
        input.phone = Some("12".into());
        input.email = Some("nope".into());
        let issues = validate_lead(input).unwrap_err();
        let mut got = paths(&issues);
        got.sort();
        assert_eq!(got, vec!["email", "fullName", "phone"]);
    }

    #[test]
    fn camel_case_wire_shape() {
        let input: LeadInput = serde_json::from_str(
            r#"{"fullName":"Asha Verma","phone":"9876543210","city":"Mohali",
                "propertyType":"Apartment","bhk":"2","purpose":"Buy",
                "timeline":"0-3m","source":"Walk-in","budgetMin":100,
                "updatedAt":"2025-03-14T09:26:53.589Z"}"#,
        )
        .unwrap();
        assert_eq!(input.property_type.as_deref(), Some("Apartment"));
        assert_eq!(input.budget_min, Some(100));
        assert_eq!(input.updated_at.as_deref(), Some("2025-03-14T09:26:53.589Z"));
        let draft = validate_lead(input).unwrap();
        assert_eq!(draft.source, Source::WalkIn);
        assert_eq!(draft.timeline, Timeline::ZeroToThreeMonths);
    }
}
