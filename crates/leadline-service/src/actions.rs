//! The operation set exposed to the transport layer. Every mutation runs
//! the same pipeline: rate limit, authenticate where required, validate,
//! guard, persist, audit.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, instrument, warn};

use leadline_ai::TagSuggester;
use leadline_core::enums::Status;
use leadline_core::errors::ActionError;
use leadline_core::history::HistoryEntry;
use leadline_core::ids::LeadId;
use leadline_core::lead::{Lead, LeadPatch};
use leadline_core::validate::{validate_lead, LeadInput};
use leadline_store::{HistoryRepo, LeadPage, LeadRepo, ListParams, StoreBackend, StoreError};

use crate::config::ServiceConfig;
use crate::diff::{compute_diff, initial_diff};
use crate::guard::check_concurrency;
use crate::rate_limit::RateLimiter;

/// Owner id recorded when a lead is created without an authenticated user.
pub const ANONYMOUS_OWNER: &str = "anonymous";
/// Actor name recorded on history entries when no user is present.
pub const FALLBACK_ACTOR: &str = "Demo User";

/// The authenticated user behind a request, as resolved by the identity
/// boundary. `name` is what history entries display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

/// One row of the per-status dashboard summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

pub struct LeadActions {
    pub(crate) leads: LeadRepo,
    pub(crate) history: HistoryRepo,
    suggester: Arc<dyn TagSuggester>,
    limiter: Arc<RateLimiter>,
    pub(crate) config: ServiceConfig,
}

impl LeadActions {
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        suggester: Arc<dyn TagSuggester>,
        config: ServiceConfig,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_window, config.rate_capacity));
        Self {
            leads: LeadRepo::new(backend.clone()),
            history: HistoryRepo::new(backend),
            suggester,
            limiter,
            config,
        }
    }

    /// The rate limiter, for wiring the sweep task at server start.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    #[instrument(skip(self, input), fields(client_key))]
    pub async fn create_lead(
        &self,
        input: LeadInput,
        actor: Option<&Actor>,
        client_key: &str,
    ) -> Result<Lead, ActionError> {
        self.limiter.enforce("createLead", client_key)?;
        if self.config.require_auth_on_create && actor.is_none() {
            return Err(ActionError::Unauthenticated);
        }
        let draft = validate_lead(input).map_err(ActionError::validation)?;

        let owner_id = actor.map(|a| a.id.as_str()).unwrap_or(ANONYMOUS_OWNER);
        let lead = self.leads.insert(&draft, owner_id).await.map_err(storage)?;
        self.history
            .append(&lead.id, actor_name(actor), &initial_diff())
            .await
            .map_err(storage)?;
        Ok(lead)
    }

    #[instrument(skip(self, input), fields(lead_id = %id, client_key))]
    pub async fn update_lead(
        &self,
        id: &LeadId,
        input: LeadInput,
        actor: Option<&Actor>,
        client_key: &str,
    ) -> Result<Lead, ActionError> {
        self.limiter.enforce("updateLead", client_key)?;
        let actor = actor.ok_or(ActionError::Unauthenticated)?;

        let expected = input.updated_at.clone();
        let draft = validate_lead(input).map_err(ActionError::validation)?;

        let existing = self.leads.get(id).await.map_err(storage)?;
        check_concurrency(&existing.updated_at, expected.as_deref())?;

        let patch = draft.into_patch();
        let diff = compute_diff(&existing, &patch);
        let updated = self.leads.update(id, &patch).await.map_err(storage)?;
        if !diff.is_empty() {
            self.history.append(id, &actor.name, &diff).await.map_err(storage)?;
        }
        Ok(updated)
    }

    /// Single-field funnel transition. Unlike `update_lead`, the
    /// concurrency token is a required argument here.
    #[instrument(skip(self), fields(lead_id = %id, status = %status, client_key))]
    pub async fn update_status(
        &self,
        id: &LeadId,
        expected_updated_at: &str,
        status: Status,
        actor: Option<&Actor>,
        client_key: &str,
    ) -> Result<Lead, ActionError> {
        self.limiter.enforce("updateStatus", client_key)?;
        let actor = actor.ok_or(ActionError::Unauthenticated)?;

        let existing = self.leads.get(id).await.map_err(storage)?;
        check_concurrency(&existing.updated_at, Some(expected_updated_at))?;

        let patch = LeadPatch::status_only(status);
        let diff = compute_diff(&existing, &patch);
        let updated = self.leads.update(id, &patch).await.map_err(storage)?;
        if !diff.is_empty() {
            self.history.append(id, &actor.name, &diff).await.map_err(storage)?;
        }
        Ok(updated)
    }

    pub async fn get_lead(&self, id: &LeadId) -> Result<Lead, ActionError> {
        self.leads.get(id).await.map_err(storage)
    }

    pub async fn list_leads(&self, params: &ListParams) -> Result<LeadPage, ActionError> {
        self.leads.list(params).await.map_err(storage)
    }

    /// The most recent 5 history entries, newest first.
    pub async fn lead_history(&self, id: &LeadId) -> Result<Vec<HistoryEntry>, ActionError> {
        self.history.recent(id).await.map_err(storage)
    }

    /// Every status in canonical order, zero-filled.
    pub async fn status_counts(&self) -> Result<Vec<StatusCount>, ActionError> {
        let values = self.leads.status_values().await.map_err(storage)?;
        Ok(Status::ALL
            .iter()
            .map(|s| StatusCount {
                status: *s,
                count: values.iter().filter(|v| *v == s).count(),
            })
            .collect())
    }

    /// Best-effort tag suggestions. Blank notes never reach the provider;
    /// provider failures collapse to one generic error so a surrounding
    /// save is never dragged down.
    #[instrument(skip(self, notes))]
    pub async fn suggest_tags(&self, notes: &str) -> Result<Vec<String>, ActionError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Ok(Vec::new());
        }
        self.suggester.suggest(notes).await.map_err(|e| {
            warn!(error = %e, "tag suggestion failed");
            ActionError::Suggestion
        })
    }
}

pub(crate) fn actor_name(actor: Option<&Actor>) -> &str {
    actor.map(|a| a.name.as_str()).unwrap_or(FALLBACK_ACTOR)
}

/// Store failures surface as `NotFound` where that is what they mean,
/// otherwise as an opaque storage error. Detail stays in the log.
pub(crate) fn storage(err: StoreError) -> ActionError {
    match err {
        StoreError::NotFound(_) => ActionError::NotFound,
        other => {
            error!(error = %other, "store operation failed");
            ActionError::Storage(other.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use leadline_ai::{MockSuggester, SuggestError};
    use leadline_core::history::INITIAL_FIELD;
    use leadline_store::MemoryBackend;
    use serde_json::json;

    pub(crate) fn actions() -> LeadActions {
        actions_with(ServiceConfig::default(), MockSuggester::empty())
    }

    pub(crate) fn actions_with(config: ServiceConfig, suggester: MockSuggester) -> LeadActions {
        LeadActions::new(Arc::new(MemoryBackend::new()), Arc::new(suggester), config)
    }

    pub(crate) fn actor() -> Actor {
        Actor { id: "user_7".into(), name: "Asha Staff".into() }
    }

    pub(crate) fn create_input() -> LeadInput {
        LeadInput {
            full_name: Some("Ravi Kumar".into()),
            phone: Some("9876543210".into()),
            city: Some("Mohali".into()),
            property_type: Some("Apartment".into()),
            bhk: Some("2".into()),
            purpose: Some("Buy".into()),
            timeline: Some("0-3m".into()),
            source: Some("Website".into()),
            ..LeadInput::default()
        }
    }

    /// Full-form update payload mirroring an existing lead, ready to tweak.
    fn update_input(lead: &Lead) -> LeadInput {
        LeadInput {
            full_name: Some(lead.full_name.clone()),
            email: lead.email.clone(),
            phone: Some(lead.phone.clone()),
            city: Some(lead.city.to_string()),
            property_type: Some(lead.property_type.to_string()),
            bhk: lead.bhk.map(|b| b.to_string()),
            purpose: Some(lead.purpose.to_string()),
            budget_min: lead.budget_min,
            budget_max: lead.budget_max,
            timeline: Some(lead.timeline.to_string()),
            source: Some(lead.source.to_string()),
            status: Some(lead.status.to_string()),
            notes: lead.notes.clone(),
            tags: Some(lead.tags.clone()),
            updated_at: Some(lead.updated_at.clone()),
        }
    }

    #[tokio::test]
    async fn create_defaults_status_and_appends_initial_history() {
        let actions = actions();
        let lead = actions.create_lead(create_input(), None, "1.2.3.4").await.unwrap();

        assert_eq!(lead.status, Status::New);
        assert_eq!(lead.owner_id, ANONYMOUS_OWNER);

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by, FALLBACK_ACTOR);
        assert!(history[0].diff.contains_key(INITIAL_FIELD));
        assert_eq!(history[0].diff[INITIAL_FIELD].new, json!("Created"));
    }

    #[tokio::test]
    async fn create_records_actor_when_present() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "1.2.3.4").await.unwrap();
        assert_eq!(lead.owner_id, "user_7");
        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history[0].changed_by, "Asha Staff");
    }

    #[tokio::test]
    async fn create_auth_is_a_configuration_choice() {
        // Default: anonymous create allowed.
        let actions = actions();
        assert!(actions.create_lead(create_input(), None, "k").await.is_ok());

        // Flipped: create demands an identity like update does.
        let strict = actions_with(
            ServiceConfig { require_auth_on_create: true, ..ServiceConfig::default() },
            MockSuggester::empty(),
        );
        let err = strict.create_lead(create_input(), None, "k").await.unwrap_err();
        assert_eq!(err, ActionError::Unauthenticated);
        assert!(strict.create_lead(create_input(), Some(&actor()), "k").await.is_ok());
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload_with_issues() {
        let actions = actions();
        let mut input = create_input();
        input.bhk = None; // residential without BHK
        let err = actions.create_lead(input, None, "k").await.unwrap_err();
        match err {
            ActionError::Validation { issues } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "bhk");
            }
            other => panic!("expected validation error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn update_requires_authentication() {
        let actions = actions();
        let lead = actions.create_lead(create_input(), None, "k").await.unwrap();
        let err = actions
            .update_lead(&lead.id, update_input(&lead), None, "k")
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Unauthenticated);
    }

    #[tokio::test]
    async fn update_audits_only_changed_fields() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let mut input = update_input(&lead);
        input.notes = Some("prefers a corner unit".into());
        input.budget_max = Some(8_000_000);
        let updated = actions.update_lead(&lead.id, input, Some(&actor), "k").await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("prefers a corner unit"));
        assert!(updated.updated_at > lead.updated_at);

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 2);
        let diff = &history[0].diff;
        assert_eq!(diff.len(), 2);
        assert_eq!(diff["notes"].old, serde_json::Value::Null);
        assert_eq!(diff["notes"].new, json!("prefers a corner unit"));
        assert_eq!(diff["budgetMax"].new, json!(8_000_000));
    }

    #[tokio::test]
    async fn noop_update_leaves_no_audit_trace() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();

        actions
            .update_lead(&lead.id, update_input(&lead), Some(&actor), "k")
            .await
            .unwrap();

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 1, "only the creation entry");
    }

    #[tokio::test]
    async fn stale_token_conflicts_even_with_identical_values() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();

        let mut input = update_input(&lead);
        input.updated_at = Some("2020-01-01T00:00:00.000Z".into());
        let err = actions
            .update_lead(&lead.id, input, Some(&actor), "k")
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Conflict);
    }

    #[tokio::test]
    async fn absent_token_writes_unconditionally() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();

        let mut input = update_input(&lead);
        input.updated_at = None;
        input.notes = Some("walked in today".into());
        assert!(actions.update_lead(&lead.id, input, Some(&actor), "k").await.is_ok());
    }

    #[tokio::test]
    async fn status_transition_end_to_end() {
        // Create with status omitted, then move the funnel: the _initial
        // entry must survive unchanged alongside the status entry.
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();
        assert_eq!(lead.status, Status::New);

        let updated = actions
            .update_status(&lead.id, &lead.updated_at, Status::Converted, Some(&actor), "k")
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Converted);

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].diff["status"].old, json!("New"));
        assert_eq!(history[0].diff["status"].new, json!("Converted"));
        assert!(history[1].diff.contains_key(INITIAL_FIELD));
        assert_eq!(history[1].diff[INITIAL_FIELD].new, json!("Created"));
    }

    #[tokio::test]
    async fn status_transition_with_stale_token_fails() {
        let actions = actions();
        let actor = actor();
        let lead = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();

        let err = actions
            .update_status(&lead.id, "2020-01-01T00:00:00.000Z", Status::Dropped, Some(&actor), "k")
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Conflict);

        let history = actions.lead_history(&lead.id).await.unwrap();
        assert_eq!(history.len(), 1, "conflict must not append history");
    }

    #[tokio::test]
    async fn unknown_lead_is_not_found() {
        let actions = actions();
        let missing = LeadId::from_raw("lead_missing");
        assert_eq!(actions.get_lead(&missing).await.unwrap_err(), ActionError::NotFound);
        let err = actions
            .update_status(&missing, "2020-01-01T00:00:00.000Z", Status::Dropped, Some(&actor()), "k")
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::NotFound);
    }

    #[tokio::test]
    async fn mutations_are_rate_limited_per_action() {
        let actions = actions();
        for _ in 0..10 {
            actions.create_lead(create_input(), None, "9.9.9.9").await.unwrap();
        }
        let err = actions.create_lead(create_input(), None, "9.9.9.9").await.unwrap_err();
        assert!(matches!(err, ActionError::RateLimited { .. }), "got: {err}");

        // A different client identity is unaffected.
        assert!(actions.create_lead(create_input(), None, "8.8.8.8").await.is_ok());
    }

    #[tokio::test]
    async fn status_counts_are_zero_filled_in_canonical_order() {
        let actions = actions();
        let actor = actor();
        let a = actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();
        actions.create_lead(create_input(), Some(&actor), "k").await.unwrap();
        actions
            .update_status(&a.id, &a.updated_at, Status::Converted, Some(&actor), "k")
            .await
            .unwrap();

        let counts = actions.status_counts().await.unwrap();
        assert_eq!(counts.len(), Status::ALL.len());
        assert_eq!(counts[0], StatusCount { status: Status::New, count: 1 });
        assert_eq!(
            counts.iter().find(|c| c.status == Status::Converted).unwrap().count,
            1
        );
        assert_eq!(counts.iter().find(|c| c.status == Status::Dropped).unwrap().count, 0);
    }

    #[tokio::test]
    async fn blank_notes_skip_the_suggestion_provider() {
        let suggester = MockSuggester::with_tags(&["hot"]);
        let actions =
            LeadActions::new(Arc::new(MemoryBackend::new()), Arc::new(suggester), ServiceConfig::default());
        assert_eq!(actions.suggest_tags("   ").await.unwrap(), Vec::<String>::new());
        // Queue untouched: a real request still gets the canned response.
        assert_eq!(actions.suggest_tags("wants sea view").await.unwrap(), vec!["hot"]);
    }

    #[tokio::test]
    async fn suggestion_failure_is_generic() {
        let actions = actions_with(
            ServiceConfig::default(),
            MockSuggester::new(vec![Err(SuggestError::Api { status: 503 })]),
        );
        let err = actions.suggest_tags("long notes here").await.unwrap_err();
        assert_eq!(err, ActionError::Suggestion);
    }
}
