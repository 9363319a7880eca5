use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use models::OpenSearchClient;
use service::ingest::ingest_file;
use service::OpenSearchServiceRepository;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "catalog-ingest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk-load newline-delimited JSON services into the catalog index")]
struct Cli {
    /// NDJSON file, one service per line
    #[arg(long, default_value = "data.jsonl")]
    data_file: PathBuf,

    /// Deadline for the whole run, in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

async fn run(cli: Cli, cfg: configs::AppConfig) -> anyhow::Result<()> {
    let client = Arc::new(OpenSearchClient::new(&cfg.opensearch)?);
    let repo = OpenSearchServiceRepository::new(client);

    let report = tokio::time::timeout(Duration::from_secs(cli.timeout_secs), ingest_file(&repo, &cli.data_file))
        .await
        .map_err(|_| anyhow::anyhow!("ingestion timed out after {}s", cli.timeout_secs))??;

    info!(
        service = "catalog-ingest",
        event = "done",
        indexed = report.indexed,
        failed = report.failed,
        "ingestion complete"
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
            error!(service = "catalog-ingest", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.logging.level, &cfg.logging.format);
    info!(service = "catalog-ingest", event = "start", file = %cli.data_file.display(), timeout_secs = cli.timeout_secs, "ingestion starting");

    match run(cli, cfg).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "catalog-ingest", event = "run_failed", error = %e, "ingestion failed");
            std::process::ExitCode::FAILURE
        }
    }
}
