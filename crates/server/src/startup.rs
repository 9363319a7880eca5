use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ALLOWED_ENVS};
use models::OpenSearchClient;
use service::{CatalogService, OpenSearchServiceRepository};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Wire the OpenSearch-backed catalog into a router.
pub fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    if !ALLOWED_ENVS.contains(&cfg.app.env.as_str()) {
        return Err(StartupError::InvalidConfig(format!("unknown APP_ENV {}", cfg.app.env)));
    }
    let client = Arc::new(OpenSearchClient::new(&cfg.opensearch)?);
    let repo = Arc::new(OpenSearchServiceRepository::new(client));
    let state = AppState::new(CatalogService::new(repo));
    Ok(routes::build_router(state, build_cors()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// Public entry: build the app and serve until Ctrl+C / SIGTERM.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;
    let addr = bind_addr(&cfg)?;
    info!(%addr, app = %cfg.app.name, env = %cfg.app.env, hosts = ?cfg.opensearch.hosts, "starting catalog api");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("catalog api stopped");
    Ok(())
}
