//! FX1 ledger service

use std::path::{Path, PathBuf};

use anyhow::Context;
use fx1_api::{start_server, AppState, LedgerVenue, RouterClient};
use fx1_core::ServiceConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "FX1_CONFIG";

/// Config file used when neither an argument nor `FX1_CONFIG` is given
pub const DEFAULT_CONFIG_FILE: &str = "fx1-ledger.config.json";

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fx1=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();
}

/// Pick the config path: explicit argument, then `FX1_CONFIG`, then the default file
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config, falling back to defaults when the default file is absent
pub fn load_config(path: &Path) -> anyhow::Result<ServiceConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        tracing::warn!("{} not found, using built-in defaults", path.display());
        return Ok(ServiceConfig::default());
    }
    ServiceConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

/// Open the ledger and serve the API until the listener fails
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    tracing::info!("Starting FX1 ledger service");

    let venue: LedgerVenue =
        Box::new(RouterClient::new(&config.venue).context("creating router client")?);
    tracing::info!("Exchange router at {}", config.venue.url);

    let state = tokio::task::spawn_blocking(move || AppState::open(config, venue))
        .await
        .context("ledger startup worker")?
        .context("opening ledger")?;

    start_server(state).await.context("serving API")?;
    Ok(())
}
