use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use todo_server::config::StoreBackend;
use todo_server::{Config, MemoryStore, PgStore, SharedStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;
    todo_server::telemetry::init(config.run_mode);

    let store = open_store(&config).await?;
    let app = todo_server::app_with_layers(store, &config.cors_origins);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, mode = ?config.run_mode, "server listening");

    todo_server::run(listener, app, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<SharedStore> {
    match config.store {
        StoreBackend::Memory => {
            info!(seed = config.seed, "using in-memory store");
            let store = if config.seed {
                MemoryStore::with_samples().await?
            } else {
                MemoryStore::new()
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let db = &config.database;
            info!(host = %db.host, port = db.port, database = %db.name, "connecting to postgres");
            let pool = db
                .connect(config.run_mode)
                .await
                .context("failed to connect to database")?;
            let store = PgStore::new(pool);
            store.migrate().await.context("failed to migrate database")?;
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
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
