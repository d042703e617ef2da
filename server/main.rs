/// Familiar Workshop server
///
/// JSON API behind the workshop front end: photo analysis, familiar image
/// generation, white-background removal, and the familiar collection.
/// Served by a synchronous tiny_http server, one thread per request.
///
/// Run with:
///   cargo run --bin workshop --release -- --api-key "$API_KEY"
/// Then point the front end at http://127.0.0.1:5000
mod handlers;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tiny_http::Server;
use tracing_subscriber::EnvFilter;

use familiar_workshop::{
    AiGateway, FamiliarStore, GatewayConfig, MatteEngine, Settings, UreqClient,
};

use state::ServerState;

#[derive(Debug, Parser)]
#[command(name = "workshop", version, about = "Familiar Workshop API server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "WORKSHOP_ADDR", default_value = "127.0.0.1:5000")]
    addr: String,

    /// JSON document holding the familiar collection.
    #[arg(long, env = "WORKSHOP_DATA", default_value = "data/familiars.json")]
    data: PathBuf,

    /// Key for the multimodal model API. Without it every AI call falls back.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// User this deployment acts for.
    #[arg(long, env = "WORKSHOP_OWNER", default_value = "local_user")]
    owner: String,

    /// Override for the model API base URL.
    #[arg(long, env = "WORKSHOP_API_BASE")]
    api_base: Option<String>,

    /// Seconds allowed for downloading a source image.
    #[arg(long, env = "WORKSHOP_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings {
        data_file: cli.data,
        owner_id: cli.owner,
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        ..Default::default()
    };
    let mut gateway_config = GatewayConfig::with_api_key(cli.api_key);
    if let Some(base) = cli.api_base {
        gateway_config.api_base = base;
    }
    if gateway_config.credentials().is_none() {
        tracing::warn!("no API key configured; analysis and generation will use fallbacks");
    }

    let store = FamiliarStore::open(&settings.data_file)
        .with_context(|| format!("opening {}", settings.data_file.display()))?;
    tracing::info!(path = %settings.data_file.display(), familiars = store.len(), "store ready");

    let client = UreqClient::from_settings(&settings);
    let shared_state = Arc::new(ServerState::new(
        store,
        AiGateway::new(client.clone(), gateway_config),
        MatteEngine::new(client),
        settings.owner_id,
    ));

    let server = Server::http(&cli.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", cli.addr, e))?;
    tracing::info!(addr = %cli.addr, "familiar workshop listening");

    // Gateway and matte calls block for up to a minute and a half, so each
    // request gets its own thread.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
