use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transcode_backend::app;
use transcode_backend::cli::{self, Cli, Command};
use transcode_backend::config::env::{self, EnvKey};
use transcode_backend::config::settings::AppConfig;
use transcode_backend::infrastructure::store::{self, Store};
use transcode_backend::migrations::Migrator;
use transcode_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transcode_backend=debug,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = AppConfig::new().context("Failed to load configuration")?;
            let store = store::connect(config.database_url.as_deref())
                .await
                .context("Failed to open store")?;
            serve(config, store).await
        }
        Command::Migrate { action } => {
            // only the database is needed to migrate
            let store = store::connect(env::get_opt(EnvKey::DatabaseUrl).as_deref())
                .await
                .context("Failed to open store")?;
            cli::run_migrate(store, &action).await?;
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, store: Arc<dyn Store>) -> Result<()> {
    if config.auto_migrate {
        let applied = Migrator::new(store.clone()).up().await?;
        if !applied.is_empty() {
            info!("Applied {} migration(s) on startup", applied.len());
        }
    } else {
        warn!("AUTO_MIGRATE disabled, schema may be behind");
    }

    let port = config.server_port;
    let app = app::create_app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
