use fx1_ledger::{config_path, init_tracing, load_config, run, CONFIG_ENV};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok());
    let config = load_config(&path)?;

    run(config).await
}
