mod api;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use file_session::ServerConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::AppState;

const DEFAULT_CONFIG_PATH: &str = "sharework.toml";
const CONFIG_PATH_ENV: &str = "SHAREWORK_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    info!("starting share-work server");
    let config_path = config_path();
    let config = load_config(&config_path)?;

    let root = config
        .acquire_root()
        .context("failed to acquire files base path")?;
    info!(root = %root.display(), "files base path acquired");

    let state = Arc::new(AppState::new(config.clone(), root));

    let mut event_stream = state.sessions.subscribe_events();
    let event_task = tokio::spawn(async move {
        loop {
            match event_stream.recv().await {
                Ok(event) => info!(?event, "session event"),
                Err(err) => {
                    warn!(error = %err, "failed to receive session event");
                    break;
                }
            }
        }
    });

    let router = api::create_router(state);
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    info!(
        address = %config.bind_address,
        files = %config.files_connect_path,
        echo = %config.echo_connect_path,
        "server is ready, press Ctrl+C to shut down"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    event_task.abort();
    info!("server shutdown complete");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "config file not found, serving the current directory with defaults"
        );
        return Ok(ServerConfig::with_base_path("."));
    }

    info!(path = %path.display(), "loading server config");
    ServerConfig::from_file(path)
        .with_context(|| format!("failed to load server config from {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, stopping server");
}
