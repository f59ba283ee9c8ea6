//! CSV export of the lead book. The caller picks the columns; cells are
//! projected from the canonical lead model, with tags flattened to a
//! comma-joined list.

use serde_json::Value;
use tracing::instrument;

use leadline_core::errors::ActionError;
use leadline_core::lead::Lead;
use leadline_core::validate::Issue;
use leadline_store::ListParams;

use crate::actions::{storage, LeadActions};

impl LeadActions {
    /// Render the requested columns for up to `export_limit` leads, newest
    /// first, as CSV text with a header row.
    #[instrument(skip(self), fields(fields = fields.len()))]
    pub async fn export_leads(&self, fields: &[String]) -> Result<String, ActionError> {
        if fields.is_empty() {
            return Err(ActionError::validation(vec![Issue::new(
                "fields",
                "Select at least one column to export",
            )]));
        }

        let params = ListParams {
            limit: self.config.export_limit,
            ..ListParams::default()
        };
        let page = self.leads.list(&params).await.map_err(storage)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(fields).map_err(csv_failure)?;
        for lead in &page.leads {
            let cells: Vec<String> = fields.iter().map(|f| export_cell(lead, f)).collect();
            writer.write_record(&cells).map_err(csv_failure)?;
        }
        let bytes = writer.into_inner().map_err(|e| csv_failure(e.into_error().into()))?;
        String::from_utf8(bytes).map_err(|_| ActionError::Storage("export produced invalid UTF-8".into()))
    }
}

/// One cell of the export. Unknown column names render empty rather than
/// failing the whole export.
fn export_cell(lead: &Lead, field: &str) -> String {
    match field {
        "id" => lead.id.to_string(),
        "ownerId" => lead.owner_id.clone(),
        "updatedAt" => lead.updated_at.clone(),
        "tags" => lead.tags.join(", "),
        other => match lead.audited_value(other) {
            Value::String(s) => s,
            Value::Null => String::new(),
            v => v.to_string(),
        },
    }
}

fn csv_failure(e: csv::Error) -> ActionError {
    ActionError::Storage(format!("CSV write failed: {e}"))
}
