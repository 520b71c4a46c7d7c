use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use formhook::config::Config;
use formhook::state::AppState;
use formhook::store::{MemoryStore, PgStore, Store};
use formhook::{retention, worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting formhook");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let (state, jobs) = AppState::new(store, config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = worker::run_pool(
        state.clone(),
        jobs,
        shutdown_rx.clone(),
        state.config.worker_count,
    );
    let sweeper = retention::spawn_sweeper(
        state.store.clone(),
        state.config.retention.max_age,
        state.config.retention.sweep_interval,
        shutdown_rx.clone(),
    );

    // Recover before accepting intake so no submission is queued by both paths.
    if let Err(e) = worker::requeue_unprocessed(&state).await {
        tracing::error!("{e}");
    }
    let requeuer = worker::spawn_requeuer(
        state.clone(),
        state.config.requeue_interval,
        shutdown_rx.clone(),
    );

    let app = formhook::build_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    for handle in workers {
        let _ = handle.await;
    }
    let _ = sweeper.await;
    let _ = requeuer.await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
