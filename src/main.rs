//! catalog-api binary: serve the HTTP API or run migrations.

use catalog_api::{
    app, apply_migrations, connect, ensure_database_exists, logging, revert_latest, AppConfig, AppError,
    AppState, MemoryProductStore, PgProductStore, ProductStore,
};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "catalog-api", version, about = "Product catalog API with keyset pagination")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (applies pending migrations first).
    Serve {
        #[arg(long, env = "HOST")]
        host: Option<String>,
        #[arg(long, env = "PORT")]
        port: Option<u16>,
        /// Keep products in process memory instead of PostgreSQL.
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply or revert schema migrations.
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations.
    Up,
    /// Revert the latest applied migration.
    Down,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    logging::init(&config.log_level, config.log_format);

    match cli.command {
        Command::Migrate { action } => {
            let pool = open_pool(&config).await?;
            match action {
                MigrateAction::Up => apply_migrations(&pool).await?,
                MigrateAction::Down => {
                    revert_latest(&pool).await?;
                }
            }
            pool.close().await;
        }
        Command::Serve { host, port, in_memory } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let (store, pool): (Arc<dyn ProductStore>, Option<PgPool>) = if in_memory {
                tracing::warn!("serving from the in-memory store; data is lost on exit");
                (Arc::new(MemoryProductStore::new()), None)
            } else {
                let pool = open_pool(&config).await?;
                apply_migrations(&pool).await?;
                (Arc::new(PgProductStore::new(pool.clone())), Some(pool))
            };
            serve(store, &config).await?;
            if let Some(pool) = pool {
                pool.close().await;
            }
        }
    }
    Ok(())
}

async fn open_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    let database_url = config.database_url()?;
    ensure_database_exists(database_url).await?;
    connect(database_url, config.max_connections).await
}

async fn serve(store: Arc<dyn ProductStore>, config: &AppConfig) -> Result<(), AppError> {
    let state = AppState::new(store, config.page_limits);
    let router = app(state, config);
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Unavailable(format!("bind {}: {}", addr, e)))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Unavailable(format!("server: {}", e)))?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
