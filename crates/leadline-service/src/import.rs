//! Bulk CSV import. Validation is all-or-nothing: every row must pass
//! before anything is inserted. Row numbers in errors are CSV line
//! numbers (1-based, counting the header), so data row `i` reports as
//! `i + 2`; row 0 marks batch-level failures.

use futures::future::try_join_all;
use tracing::{error, instrument};

use leadline_core::errors::{ActionError, RowError};
use leadline_core::validate::{validate_lead, Issue, LeadInput};

use crate::actions::{actor_name, Actor, LeadActions, ANONYMOUS_OWNER};
use crate::diff::initial_diff;

/// Column headers the importer understands, matching the export template.
const KNOWN_COLUMNS: [&str; 14] = [
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

impl LeadActions {
    /// Parse, validate, and insert a CSV batch. Returns the number of
    /// leads imported.
    #[instrument(skip(self, csv_text), fields(client_key))]
    pub async fn import_leads(
        &self,
        csv_text: &str,
        actor: Option<&Actor>,
        client_key: &str,
    ) -> Result<usize, ActionError> {
        self.limiter().enforce("importLeads", client_key)?;
        if self.config.require_auth_on_create && actor.is_none() {
            return Err(ActionError::Unauthenticated);
        }

        let (inputs, mut errors) = parse_rows(csv_text, self.config.import_max_rows)?;
        let mut drafts = Vec::with_capacity(inputs.len());
        for (index, (input, coercion_issues)) in inputs.into_iter().enumerate() {
            let row = index + 2;
            let mut issues = coercion_issues;
            match validate_lead(input) {
                Ok(draft) if issues.is_empty() => drafts.push(draft),
                Ok(_) => errors.push(RowError::new(row, join_issues(&issues))),
                Err(mut validation) => {
                    issues.append(&mut validation);
                    errors.push(RowError::new(row, join_issues(&issues)));
                }
            }
        }
        if !errors.is_empty() {
            errors.sort_by_key(|e| e.row);
            return Err(ActionError::ImportBatch { errors });
        }

        let owner_id = actor.map(|a| a.id.as_str()).unwrap_or(ANONYMOUS_OWNER);
        let changed_by = actor_name(actor);
        let count = drafts.len();

        // Rows insert concurrently; a failure here may leave the batch
        // partially applied because the store has no multi-row atomicity.
        let inserts = drafts.iter().map(|draft| async move {
            let lead = self.leads.insert(draft, owner_id).await?;
            self.history.append(&lead.id, changed_by, &initial_diff()).await?;
            Ok::<_, leadline_store::StoreError>(())
        });
        try_join_all(inserts).await.map_err(|e| {
            error!(error = %e, "import insert phase failed");
            ActionError::ImportBatch {
                errors: vec![RowError::new(0, "Database error during import.")],
            }
        })?;

        Ok(count)
    }
}

type ParsedRow = (LeadInput, Vec<Issue>);

/// Parse CSV text into per-row inputs, enforcing the batch size cap.
/// Malformed rows become row-numbered errors rather than aborting the
/// parse, so the caller can report every bad row at once.
fn parse_rows(
    csv_text: &str,
    max_rows: usize,
) -> Result<(Vec<ParsedRow>, Vec<RowError>), ActionError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|_| batch_error("Could not parse the CSV header row."))?
        .iter()
        .map(str::to_string)
        .collect();
    if !headers.iter().any(|h| KNOWN_COLUMNS.contains(&h.as_str())) {
        return Err(batch_error("CSV header row has no recognized columns."));
    }

    let records: Vec<Result<csv::StringRecord, csv::Error>> = reader.records().collect();
    if records.len() > max_rows {
        return Err(batch_error(format!(
            "CSV file cannot have more than {max_rows} rows."
        )));
    }

    let mut inputs = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match record {
            Ok(record) => inputs.push(row_to_input(&headers, &record)),
            Err(_) => errors.push(RowError::new(index + 2, "Malformed CSV row.")),
        }
    }
    Ok((inputs, errors))
}

/// Map one CSV record onto a raw lead payload. Empty cells are absent;
/// budget cells coerce to integers; the tags cell splits on commas.
fn row_to_input(headers: &[String], record: &csv::StringRecord) -> ParsedRow {
    let mut input = LeadInput::default();
    let mut issues = Vec::new();

    let cell = |name: &str| -> Option<String> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let budget = |name: &str, issues: &mut Vec<Issue>| -> Option<i64> {
        cell(name).and_then(|raw| match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                issues.push(Issue::new(name, "Budget must be a number"));
                None
            }
        })
    };

    input.full_name = cell("fullName");
    input.email = cell("email");
    input.phone = cell("phone");
    input.city = cell("city");
    input.property_type = cell("propertyType");
    input.bhk = cell("bhk");
    input.purpose = cell("purpose");
    input.budget_min = budget("budgetMin", &mut issues);
    input.budget_max = budget("budgetMax", &mut issues);
    input.timeline = cell("timeline");
    input.source = cell("source");
    input.status = cell("status");
    input.notes = cell("notes");
    input.tags = cell("tags").map(|raw| raw.split(',').map(|t| t.trim().to_string()).collect());

    (input, issues)
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.path, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn batch_error(message: impl Into<String>) -> ActionError {
    ActionError::ImportBatch { errors: vec![RowError::new(0, message)] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::{actions, actor};
    use leadline_core::enums::Status;

    const HEADER: &str =
        "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";

    fn valid_row(name: &str) -> String {
        format!("{name},,9876543210,Mohali,Apartment,2,Buy,4000000,6500000,0-3m,Website,,\"hot, nri\",")
    }

    fn csv_of(rows: &[String]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[tokio::test]
    async fn valid_batch_imports_every_row_with_history() {
        let actions = actions();
        let rows: Vec<String> = (0..3).map(|i| valid_row(&format!("Buyer Number {i}"))).collect();

        let count = actions.import_leads(&csv_of(&rows), Some(&actor()), "k").await.unwrap();
        assert_eq!(count, 3);

        let page = actions.list_leads(&Default::default()).await.unwrap();
        assert_eq!(page.total, 3);
        let lead = &page.leads[0];
        assert_eq!(lead.status, Status::New);
        assert_eq!(lead.tags, vec!["hot", "nri"]);
        assert_eq!(lead.budget_min, Some(4_000_000));

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].diff.contains_key("_initial"));
    }

    #[tokio::test]
    async fn oversized_batch_rejected_wholesale() {
        let actions = actions();
        let rows: Vec<String> = (0..201).map(|i| valid_row(&format!("Buyer Number {i}"))).collect();

        let err = actions.import_leads(&csv_of(&rows), Some(&actor()), "k").await.unwrap_err();
        match err {
            ActionError::ImportBatch { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].row, 0);
                assert_eq!(errors[0].message, "CSV file cannot have more than 200 rows.");
            }
            other => panic!("expected import batch error, got: {other}"),
        }
        assert_eq!(actions.list_leads(&Default::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn one_bad_row_rejects_the_whole_batch() {
        let actions = actions();
        let mut rows: Vec<String> = (0..5).map(|i| valid_row(&format!("Buyer Number {i}"))).collect();
        // Data row 3 (CSV line 5): residential without BHK.
        rows[2] = "Bad Row,,9876543210,Mohali,Apartment,,Buy,,,0-3m,Website,,,".to_string();

        let err = actions.import_leads(&csv_of(&rows), Some(&actor()), "k").await.unwrap_err();
        match err {
            ActionError::ImportBatch { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].row, 5);
                assert!(errors[0].message.contains("bhk"), "got: {}", errors[0].message);
            }
            other => panic!("expected import batch error, got: {other}"),
        }
        assert_eq!(
            actions.list_leads(&Default::default()).await.unwrap().total,
            0,
            "nothing imported"
        );
    }

    #[tokio::test]
    async fn every_bad_row_is_reported() {
        let actions = actions();
        let rows = vec![
            "A,,12,Mohali,Plot,,Buy,,,0-3m,Website,,,".to_string(),
            valid_row("Good Buyer"),
            "Bad Budget,,9876543210,Mohali,Plot,,Buy,abc,,0-3m,Website,,,".to_string(),
        ];
        let err = actions.import_leads(&csv_of(&rows), Some(&actor()), "k").await.unwrap_err();
        match err {
            ActionError::ImportBatch { errors } => {
                let row_numbers: Vec<usize> = errors.iter().map(|e| e.row).collect();
                assert_eq!(row_numbers, vec![2, 4]);
                assert!(errors[1].message.contains("budgetMin: Budget must be a number"));
            }
            other => panic!("expected import batch error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn unrecognized_header_is_a_batch_error() {
        let actions = actions();
        let err = actions
            .import_leads("name,telephone\nAsha,123", Some(&actor()), "k")
            .await
            .unwrap_err();
        match err {
            ActionError::ImportBatch { errors } => {
                assert_eq!(errors[0].row, 0);
                assert!(errors[0].message.contains("no recognized columns"));
            }
            other => panic!("expected import batch error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_file_imports_nothing() {
        let actions = actions();
        let count = actions.import_leads(HEADER, Some(&actor()), "k").await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn row_to_input_coerces_cells() {
        let headers: Vec<String> = HEADER.split(',').map(str::to_string).collect();
        let body =
            format!("{HEADER}\nAsha Verma,,9876543210,Mohali,Villa,3,Buy,100,200,>6m,Referral,likes greenery,\"hot , nri\",Qualified");
        let mut reader =
            csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(body.as_bytes());
        let record = reader.records().next().unwrap().unwrap();

        let (input, issues) = row_to_input(&headers, &record);
        assert!(issues.is_empty());
        assert_eq!(input.full_name.as_deref(), Some("Asha Verma"));
        assert_eq!(input.email, None);
        assert_eq!(input.budget_min, Some(100));
        assert_eq!(input.budget_max, Some(200));
        assert_eq!(input.tags, Some(vec!["hot".to_string(), "nri".to_string()]));
        assert_eq!(input.status.as_deref(), Some("Qualified"));
    }
}
