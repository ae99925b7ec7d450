//! speedtest exporter
//!
//! - Scrape endpoint: /metrics (runs the Ookla CLI when the cache is stale)
//! - Config from SPEEDTEST_* env vars (optional YAML via SPEEDTEST_CONFIG)
//! - Graceful shutdown on SIGINT / SIGTERM

use std::process::ExitCode;
use std::sync::Arc;

use speedtest_core::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speedtest_exporter::{app_state::AppState, config, probe, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let binary = probe::verify_binary(&cfg.binary).await?;
    let listen = cfg.listen_addr()?;

    tracing::info!(
        %listen,
        cache_for_secs = cfg.cache_for_secs,
        timeout_secs = cfg.timeout_secs,
        server_id = ?cfg.server_id,
        "speedtest-exporter starting"
    );

    let shutdown = CancellationToken::new();
    let state = AppState::new(&cfg, Arc::new(probe::SpeedtestCli::new(binary)), shutdown.clone());
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tokio::spawn(shutdown_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("speedtest-exporter stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
    shutdown.cancel();
}
