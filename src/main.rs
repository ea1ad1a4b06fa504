//! peak-flowmeter server entry point.
//!
//! Starts the Axum HTTP server over the configured record repository.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use peak_flowmeter::api;
use peak_flowmeter::app_state::AppState;
use peak_flowmeter::config::{AppConfig, LogFormat, StorageBackend};
use peak_flowmeter::repository::postgres::PostgresOptions;
use peak_flowmeter::repository::{
    MemoryRecordRepository, PostgresRecordRepository, RecordRepository,
};
use peak_flowmeter::service::RecordService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also picks up RUST_LOG from .env)
    let config = AppConfig::from_env().context("invalid configuration")?;

    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        authorized_ip = config.authorized_ip.as_deref().unwrap_or("<any>"),
        "starting peak-flowmeter"
    );

    // Build persistence layer
    let mut postgres = None;
    let repository: Arc<dyn RecordRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            tracing::info!("connecting to PostgreSQL");
            let repo = PostgresRecordRepository::connect(&PostgresOptions {
                url: &config.database_url,
                max_connections: config.database_max_connections,
                min_connections: config.database_min_connections,
                acquire_timeout: Duration::from_secs(config.database_connect_timeout_secs),
            })
            .await
            .context("failed to open the records collection")?;
            postgres = Some(repo.clone());
            Arc::new(repo)
        }
        StorageBackend::Memory if config.memory_seed_fixtures => {
            Arc::new(MemoryRecordRepository::with_fixtures())
        }
        StorageBackend::Memory => Arc::new(MemoryRecordRepository::new()),
    };

    // Build application
    let state = AppState::new(RecordService::new(repository), config.authorized_ip.clone());
    let app = api::build_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let mut graceful_rx = stop_rx.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = graceful_rx.wait_for(|stop| *stop).await;
    })
    .into_future();

    let mut deadline_rx = stop_rx;
    let shutdown_timeout = config.shutdown_timeout;
    let deadline = async move {
        let _ = deadline_rx.wait_for(|stop| *stop).await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => result.context("server error")?,
        () = deadline => {
            tracing::warn!(timeout = ?shutdown_timeout, "shutdown deadline elapsed, dropping open connections");
        }
    }

    if let Some(repo) = postgres {
        repo.close().await;
    }
    tracing::info!("server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
