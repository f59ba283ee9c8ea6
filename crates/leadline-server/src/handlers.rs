//! RPC method handlers. Each handler parses its params, calls the action
//! layer, and maps the result onto the wire.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use leadline_core::enums::{City, PropertyType, Status, Timeline};
use leadline_core::ids::LeadId;
use leadline_core::validate::LeadInput;
use leadline_service::{Actor, LeadActions};
use leadline_store::{ListParams, SortSpec};

use crate::identity::IdentityProvider;
use crate::rpc::{self, RpcResponse};

/// Shared state available to all RPC handlers.
pub struct HandlerState {
    pub actions: LeadActions,
    pub identity: Arc<dyn IdentityProvider>,
}

impl HandlerState {
    pub fn new(actions: LeadActions, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { actions, identity }
    }
}

/// Everything about the caller a handler might need: the resolved user
/// (if any) and the rate-limit identity.
pub struct RequestContext {
    pub actor: Option<Actor>,
    pub client_key: String,
}

/// Dispatch an RPC method to the appropriate handler.
pub async fn dispatch(
    state: &Arc<HandlerState>,
    method: &str,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    ctx: &RequestContext,
) -> RpcResponse {
    match method {
        "lead.create" => lead_create(state, params, id, ctx).await,
        "lead.update" => lead_update(state, params, id, ctx).await,
        "lead.updateStatus" => lead_update_status(state, params, id, ctx).await,
        "lead.get" => lead_get(state, params, id).await,
        "lead.list" => lead_list(state, params, id).await,
        "lead.history" => lead_history(state, params, id).await,
        "lead.import" => lead_import(state, params, id, ctx).await,
        "lead.export" => lead_export(state, params, id).await,
        "lead.statusCounts" => lead_status_counts(state, id).await,
        "tags.suggest" => tags_suggest(state, params, id).await,
        "health" => health(state, id).await,
        _ => RpcResponse::method_not_found(id, method),
    }
}

fn parse_input(params: &serde_json::Value) -> Result<LeadInput, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("Invalid lead payload: {e}"))
}

async fn lead_create(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    ctx: &RequestContext,
) -> RpcResponse {
    let input = match parse_input(params) {
        Ok(input) => input,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state.actions.create_lead(input, ctx.actor.as_ref(), &ctx.client_key).await {
        Ok(lead) => RpcResponse::success(id, json!(lead)),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_update(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    ctx: &RequestContext,
) -> RpcResponse {
    let lead_id = match rpc::require_str(params, "id") {
        Ok(s) => LeadId::from_raw(s),
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    let input = match parse_input(params) {
        Ok(input) => input,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state
        .actions
        .update_lead(&lead_id, input, ctx.actor.as_ref(), &ctx.client_key)
        .await
    {
        Ok(lead) => RpcResponse::success(id, json!(lead)),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_update_status(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    ctx: &RequestContext,
) -> RpcResponse {
    let lead_id = match rpc::require_str(params, "id") {
        Ok(s) => LeadId::from_raw(s),
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    let status = match rpc::require_str(params, "status").map(|s| s.parse::<Status>()) {
        Ok(Ok(status)) => status,
        Ok(Err(_)) => return RpcResponse::invalid_params(id, "Invalid status"),
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    let updated_at = match rpc::require_str(params, "updatedAt") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state
        .actions
        .update_status(&lead_id, updated_at, status, ctx.actor.as_ref(), &ctx.client_key)
        .await
    {
        Ok(lead) => RpcResponse::success(id, json!(lead)),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_get(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let lead_id = match rpc::require_str(params, "id") {
        Ok(s) => LeadId::from_raw(s),
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state.actions.get_lead(&lead_id).await {
        Ok(lead) => RpcResponse::success(id, json!(lead)),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

/// Parse an optional enum-valued filter, distinguishing "absent" from
/// "present but not a legal value".
fn optional_filter<T: FromStr>(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<T>, String> {
    match rpc::optional_str(params, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| format!("Invalid {key}: {raw}")),
    }
}

fn parse_list_params(params: &serde_json::Value) -> Result<ListParams, String> {
    let mut list = ListParams::default();
    list.query = rpc::optional_str(params, "query").map(str::to_string);
    list.city = optional_filter::<City>(params, "city")?;
    list.property_type = optional_filter::<PropertyType>(params, "propertyType")?;
    list.status = optional_filter::<Status>(params, "status")?;
    list.timeline = optional_filter::<Timeline>(params, "timeline")?;
    if let Some(page) = rpc::optional_u64(params, "page") {
        list.page = page.max(1) as usize;
    }
    if let Some(limit) = rpc::optional_u64(params, "limit") {
        list.limit = limit as usize;
    }
    if let Some(key) = rpc::optional_str(params, "sortKey") {
        let descending = params.get("sortDesc").and_then(|v| v.as_bool()).unwrap_or(true);
        list.sort = SortSpec { key: key.to_string(), descending };
    }
    Ok(list)
}

async fn lead_list(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let list = match parse_list_params(params) {
        Ok(list) => list,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state.actions.list_leads(&list).await {
        Ok(page) => RpcResponse::success(id, json!({ "leads": page.leads, "total": page.total })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_history(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let lead_id = match rpc::require_str(params, "id") {
        Ok(s) => LeadId::from_raw(s),
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state.actions.lead_history(&lead_id).await {
        Ok(entries) => RpcResponse::success(id, json!({ "entries": entries })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_import(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    ctx: &RequestContext,
) -> RpcResponse {
    let csv_text = match rpc::require_str(params, "csv") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state
        .actions
        .import_leads(csv_text, ctx.actor.as_ref(), &ctx.client_key)
        .await
    {
        Ok(count) => RpcResponse::success(id, json!({ "imported": count })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_export(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let fields: Vec<String> = match params.get("fields") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(fields) => fields,
            Err(_) => return RpcResponse::invalid_params(id, "fields must be an array of strings"),
        },
        None => Vec::new(),
    };
    match state.actions.export_leads(&fields).await {
        Ok(csv_text) => RpcResponse::success(id, json!({ "csv": csv_text })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn lead_status_counts(
    state: &Arc<HandlerState>,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    match state.actions.status_counts().await {
        Ok(counts) => RpcResponse::success(id, json!({ "counts": counts })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

async fn tags_suggest(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let notes = match rpc::require_str(params, "notes") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    match state.actions.suggest_tags(notes).await {
        Ok(tags) => RpcResponse::success(id, json!({ "tags": tags })),
        Err(e) => RpcResponse::from_action_error(id, &e),
    }
}

/// Liveness probe: a cheap store read decides healthy vs degraded.
async fn health(state: &Arc<HandlerState>, id: Option<serde_json::Value>) -> RpcResponse {
    let status = match state.actions.status_counts().await {
        Ok(_) => "healthy",
        Err(_) => "degraded",
    };
    RpcResponse::success(id, json!({ "status": status }))
}
