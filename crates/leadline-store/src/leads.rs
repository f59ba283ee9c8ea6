use std::sync::Arc;

use tracing::instrument;

use leadline_core::enums::{City, PropertyType, Status, Timeline};
use leadline_core::ids::LeadId;
use leadline_core::lead::{Lead, LeadDraft, LeadPatch};
use leadline_core::time;

use crate::backend::{SelectQuery, StoreBackend};
use crate::error::StoreError;
use crate::rows::{self, LEADS_TABLE};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort key in application convention plus direction.
#[derive(Clone, Debug)]
pub struct SortSpec {
    pub key: String,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { key: "updatedAt".to_string(), descending: true }
    }
}

#[derive(Clone, Debug)]
pub struct ListParams {
    /// Case-insensitive substring search across name, email, phone, notes.
    pub query: Option<String>,
    pub city: Option<City>,
    pub property_type: Option<PropertyType>,
    pub status: Option<Status>,
    pub timeline: Option<Timeline>,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub sort: SortSpec,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            query: None,
            city: None,
            property_type: None,
            status: None,
            timeline: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: SortSpec::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    /// Exact count of matching leads before paging.
    pub total: usize,
}

/// Lead CRUD over the row backend. All reads return the canonical
/// application model regardless of how rows were written.
#[derive(Clone)]
pub struct LeadRepo {
    backend: Arc<dyn StoreBackend>,
}

impl LeadRepo {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self), fields(lead_id = %id))]
    pub async fn get(&self, id: &LeadId) -> Result<Lead, StoreError> {
        let query = SelectQuery::default().filter("id", id.as_str()).limit(1);
        let page = self.backend.select(LEADS_TABLE, &query).await?;
        match page.rows.first() {
            Some(row) => rows::lead_from_row(row),
            None => Err(StoreError::NotFound(format!("lead {id}"))),
        }
    }

    #[instrument(skip(self, params), fields(page = params.page, limit = params.limit))]
    pub async fn list(&self, params: &ListParams) -> Result<LeadPage, StoreError> {
        let page_no = params.page.max(1);
        let limit = if params.limit == 0 { DEFAULT_PAGE_SIZE } else { params.limit };
        let sort_col = rows::sort_column(&params.sort.key).unwrap_or("updatedat");

        let mut query = SelectQuery::default()
            .order_by(sort_col, params.sort.descending)
            .order_by("id", true)
            .range((page_no - 1) * limit, limit);
        if let Some(city) = params.city {
            query = query.filter("city", city.to_string());
        }
        if let Some(property_type) = params.property_type {
            query = query.filter("propertytype", property_type.to_string());
        }
        if let Some(status) = params.status {
            query = query.filter("status", status.to_string());
        }
        if let Some(timeline) = params.timeline {
            query = query.filter("timeline", timeline.to_string());
        }
        if let Some(q) = params.query.as_deref() {
            let q = q.trim();
            if !q.is_empty() {
                query = query.search(&["fullname", "email", "phone", "notes"], q);
            }
        }

        let page = self.backend.select(LEADS_TABLE, &query).await?;
        let leads = page
            .rows
            .iter()
            .map(rows::lead_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LeadPage { leads, total: page.total })
    }

    /// Insert a new lead. The repo assigns the id and modification
    /// timestamp; status defaults to `New` when the draft has none.
    #[instrument(skip(self, draft), fields(owner_id))]
    pub async fn insert(&self, draft: &LeadDraft, owner_id: &str) -> Result<Lead, StoreError> {
        let id = LeadId::new();
        let now = time::now_iso8601();
        let row = rows::draft_to_row(draft, &id, owner_id, &now);
        let stored = self.backend.insert(LEADS_TABLE, row).await?;
        rows::lead_from_row(&stored)
    }

    /// Write the fields present in the patch, always refreshing the
    /// modification timestamp.
    #[instrument(skip(self, patch), fields(lead_id = %id))]
    pub async fn update(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead, StoreError> {
        let now = time::now_iso8601();
        let row = rows::patch_to_row(patch, &now);
        let stored = self.backend.update(LEADS_TABLE, id.as_str(), row).await?;
        rows::lead_from_row(&stored)
    }

    /// Status column of every lead, for per-status counts.
    #[instrument(skip(self))]
    pub async fn status_values(&self) -> Result<Vec<Status>, StoreError> {
        let query = SelectQuery::default().columns("status");
        let page = self.backend.select(LEADS_TABLE, &query).await?;
        page.rows.iter().map(rows::status_from_row).collect()
    }
}
