use std::sync::Arc;

use tracing::instrument;

use leadline_core::history::{Diff, HistoryEntry};
use leadline_core::ids::{HistoryId, LeadId};
use leadline_core::time;

use crate::backend::{SelectQuery, StoreBackend};
use crate::error::StoreError;
use crate::rows::{self, HISTORY_TABLE};

/// How many entries the read path returns per lead.
pub const RECENT_LIMIT: usize = 5;

/// Append-only audit trail per lead.
#[derive(Clone)]
pub struct HistoryRepo {
    backend: Arc<dyn StoreBackend>,
}

impl HistoryRepo {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, diff), fields(lead_id = %lead_id, changed_by))]
    pub async fn append(
        &self,
        lead_id: &LeadId,
        changed_by: &str,
        diff: &Diff,
    ) -> Result<HistoryEntry, StoreError> {
        let id = HistoryId::new();
        let now = time::now_iso8601();
        let row = rows::history_to_row(&id, lead_id, changed_by, &now, diff);
        let stored = self.backend.insert(HISTORY_TABLE, row).await?;
        rows::history_from_row(&stored)
    }

    /// The most recent entries for a lead, newest first, capped at
    /// `RECENT_LIMIT`.
    #[instrument(skip(self), fields(lead_id = %lead_id))]
    pub async fn recent(&self, lead_id: &LeadId) -> Result<Vec<HistoryEntry>, StoreError> {
        let query = SelectQuery::default()
            .filter("buyerid", lead_id.as_str())
            .order_by("changedat", true)
            .order_by("id", true)
            .limit(RECENT_LIMIT);
        let page = self.backend.select(HISTORY_TABLE, &query).await?;
        page.rows.iter().map(rows::history_from_row).collect()
    }
}
