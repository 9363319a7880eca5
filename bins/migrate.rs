use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use migration::{MigrationStatus, Migrator};
use models::OpenSearchClient;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "catalog-migrate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create missing search indices from JSON schema files")]
struct Cli {
    /// Directory of `<index>.json` schema files
    #[arg(long, default_value = "migrations")]
    schema_dir: PathBuf,
}

async fn run(cli: Cli, cfg: configs::AppConfig) -> anyhow::Result<()> {
    let client = Arc::new(OpenSearchClient::new(&cfg.opensearch)?);
    let outcomes = Migrator::new(client).run(&cli.schema_dir).await?;
    let created = outcomes.iter().filter(|o| o.status == MigrationStatus::Created).count();
    info!(
        service = "catalog-migrate",
        event = "done",
        created,
        skipped = outcomes.len() - created,
        "migrations complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "catalog-migrate", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.logging.level, &cfg.logging.format);
    info!(service = "catalog-migrate", event = "start", schema_dir = %cli.schema_dir.display(), "migrations starting");

    match run(cli, cfg).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "catalog-migrate", event = "run_failed", error = %e, "migrations failed");
            std::process::ExitCode::FAILURE
        }
    }
}
