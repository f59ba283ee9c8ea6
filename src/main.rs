use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use leadline_ai::{HttpTagSuggester, MockSuggester, SuggesterConfig, TagSuggester};
use leadline_server::{
    IdentityProvider, OpenAccessProvider, ServerConfig, StaticTokenProvider, UserIdentity,
};
use leadline_service::{LeadActions, ServiceConfig};
use leadline_store::{MemoryBackend, RestBackend, RestConfig, StoreBackend};
use leadline_telemetry::{init_telemetry, TelemetryConfig};

/// Lead management server for property buyers.
#[derive(Parser)]
#[command(name = "leadline", version)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 9400)]
    port: u16,

    /// Row API root URL. Falls back to LEADLINE_STORE_URL; without
    /// either, leads live in process memory only.
    #[arg(long)]
    store_url: Option<String>,

    /// Path to the persisted log database.
    #[arg(long)]
    log_db: Option<PathBuf>,

    /// Require a logged-in user for lead creation.
    #[arg(long, default_value_t = false)]
    require_auth_on_create: bool,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut telemetry_config = TelemetryConfig::default();
    if let Some(path) = cli.log_db {
        telemetry_config.log_db_path = path;
    }
    let _telemetry = init_telemetry(telemetry_config);

    tracing::info!("Starting Leadline server");

    let backend: Arc<dyn StoreBackend> =
        match cli.store_url.or_else(|| env_var("LEADLINE_STORE_URL")) {
            Some(base_url) => {
                let service_key = env_var("LEADLINE_STORE_KEY").ok_or_else(|| {
                    anyhow::anyhow!("LEADLINE_STORE_KEY is required with a store URL")
                })?;
                tracing::info!(url = %base_url, "Using REST row store");
                Arc::new(RestBackend::new(RestConfig { base_url, service_key: service_key.into() }))
            }
            None => {
                tracing::warn!("No store URL configured; leads will not survive a restart");
                Arc::new(MemoryBackend::new())
            }
        };

    let suggester: Arc<dyn TagSuggester> = match env_var("LEADLINE_SUGGEST_URL") {
        Some(url) => {
            let api_key = env_var("LEADLINE_SUGGEST_KEY").ok_or_else(|| {
                anyhow::anyhow!("LEADLINE_SUGGEST_KEY is required with a suggest URL")
            })?;
            tracing::info!(url = %url, "Using HTTP tag suggester");
            Arc::new(HttpTagSuggester::new(SuggesterConfig { url, api_key: api_key.into() }))
        }
        None => {
            tracing::warn!("No suggestion endpoint configured; tag suggestions disabled");
            Arc::new(MockSuggester::empty())
        }
    };

    let demo_user = UserIdentity {
        id: env_var("LEADLINE_AUTH_USER").unwrap_or_else(|| "user_demo".to_string()),
        name: "Demo User".to_string(),
    };
    let identity: Arc<dyn IdentityProvider> = match env_var("LEADLINE_AUTH_TOKEN") {
        Some(token) => Arc::new(StaticTokenProvider::new(token.into(), demo_user)),
        None => {
            tracing::warn!("No auth token configured; every request runs as the demo user");
            Arc::new(OpenAccessProvider::new(demo_user))
        }
    };

    let service_config = ServiceConfig {
        require_auth_on_create: cli.require_auth_on_create,
        ..ServiceConfig::default()
    };
    let actions = LeadActions::new(backend, suggester, service_config);

    let config = ServerConfig { port: cli.port, ..ServerConfig::default() };
    let handle = leadline_server::start(config, actions, identity).await?;
    tracing::info!(port = handle.port, "Leadline server ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
