use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use leadline_service::{client_key, start_sweep_task, LeadActions};

use crate::handlers::{self, HandlerState, RequestContext};
use crate::identity::{bearer_token, IdentityProvider};
use crate::rpc::{RpcRequest, RpcResponse};

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
    /// How often expired rate-limit windows are swept.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 9400, sweep_interval: Duration::from_secs(60) }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler_state: Arc<HandlerState>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Create and start the server. Returns a handle that keeps background
/// tasks alive.
pub async fn start(
    config: ServerConfig,
    actions: LeadActions,
    identity: Arc<dyn IdentityProvider>,
) -> Result<ServerHandle, std::io::Error> {
    let sweep = start_sweep_task(actions.limiter(), config.sweep_interval);
    let handler_state = Arc::new(HandlerState::new(actions, identity));
    let router = build_router(AppState { handler_state });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "Leadline server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle { port: local_addr.port(), _server: server, _sweep: sweep })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _sweep: tokio::task::JoinHandle<()>,
}

/// POST /rpc entry point. The body is parsed here rather than with an
/// extractor so malformed JSON yields a wire-shaped parse error instead
/// of a bare 400.
async fn rpc_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(_) => return axum::Json(RpcResponse::parse_error()),
    };

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let ctx = RequestContext {
        actor: state
            .handler_state
            .identity
            .resolve(bearer_token(&headers))
            .await
            .map(|u| u.into_actor()),
        client_key: client_key(forwarded),
    };

    let params = request.params.unwrap_or(serde_json::json!({}));
    let response =
        handlers::dispatch(&state.handler_state, &request.method, &params, request.id, &ctx).await;
    axum::Json(response)
}

/// Health check HTTP endpoint, mirroring the `health` RPC method.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ctx = RequestContext { actor: None, client_key: "health".to_string() };
    let resp =
        handlers::dispatch(&state.handler_state, "health", &serde_json::json!({}), None, &ctx)
            .await;

    let status = resp
        .data
        .as_ref()
        .and_then(|d| d.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown");

    let http_status = if status == "healthy" {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, axum::Json(resp.data.unwrap_or_default()))
}
