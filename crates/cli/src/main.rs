use clap::Parser;

use stockroom_infra::{AnyStore, AppConfig, Inventory, StoreBackend};
use stockroom_observability::LogFormat;

mod shell;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Interactive inventory of items, materials, tools and their users")]
struct Cli {
    /// Storage backend (memory or postgres); overrides STOCKROOM_STORE
    #[arg(long)]
    store: Option<StoreBackend>,

    /// Postgres connection string; overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Log output format (json or pretty)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    stockroom_observability::init_with(cli.log_format, "info");

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.store.database_url = Some(url);
        if cli.store.is_none() {
            config.store.backend = StoreBackend::Postgres;
        }
    }
    if let Some(backend) = cli.store {
        config.store.backend = backend;
    }

    let store = AnyStore::open(&config.store).await?;
    tracing::info!(backend = ?config.store.backend, "store opened");

    let inventory = Inventory::with_config(store, config.operations);
    let mut shell = shell::Shell::new(
        &inventory,
        tokio::io::BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
    );
    let outcome = shell.run().await;

    inventory.store().close().await;
    tracing::info!("store closed");
    Ok(outcome?)
}
