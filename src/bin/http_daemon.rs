//! HTTP CLI daemon entry point.
//!
//! Serves the execution engine over HTTP on the configured address
//! (`127.0.0.1:4321` unless overridden). Settings are read from the JSON file
//! named by the first argument, when given. Logging goes to stderr through
//! `env_logger`; set `RUST_LOG` to change the level.

use http_cli::config::{load_config, EngineConfig};
use http_cli::daemon::{serve, Daemon};
use http_cli::executor::ExecutionEngine;
use http_cli::session::MemorySessionStore;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting http-daemon {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(path),
        None => load_config(None),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(&config.daemon_address).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", config.daemon_address, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Profiles directory: {}", config.resolved_profiles_dir().display());

    let daemon = Daemon::new(ExecutionEngine::new(
        config,
        Arc::new(MemorySessionStore::new()),
    ));

    match serve(listener, daemon.clone(), shutdown_signal(daemon)).await {
        Ok(()) => {
            log::info!("Daemon stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Daemon error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Waits for SIGINT or SIGTERM, then cancels in-flight executions.
async fn shutdown_signal(daemon: Daemon) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received SIGINT"),
        _ = terminate => log::info!("Received SIGTERM"),
    }

    let cancelled = daemon.shutdown();
    log::info!("Shutting down, cancelled {} execution(s)", cancelled);
}
