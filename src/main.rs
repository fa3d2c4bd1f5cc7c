//! livoltek-bridge - Publishes Livoltek solar and battery telemetry to Home Assistant.
//! The application is small enough to run on a single worker thread,
//! making it suitable for low-resource environments.
use envconfig::Envconfig;
use livoltek_bridge::core::config::{Config, configure_logger};
use livoltek_bridge::server::server;
use tokio::signal;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

enum ExitCode {
    Success = 0,
    RuntimeError = 1,
    ConfigError = 2,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 1)]
async fn main() {
    dotenvy::dotenv().ok();
    configure_logger();

    let config = match Config::init_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(ExitCode::ConfigError as i32);
        }
    };

    let shutdown_token = CancellationToken::new();
    let server_shutdown_token = shutdown_token.clone();

    let mut app = tokio::spawn(async move { server(config, server_shutdown_token).await });

    // Wait for Ctrl+C, SIGTERM or the server stopping on its own
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate() => {
            log::info!("Received SIGTERM, initiating graceful shutdown...");
        }
        result = &mut app => exit(result),
    }
    shutdown_token.cancel();

    exit(app.await);
}

async fn terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

fn exit(result: Result<Result<(), anyhow::Error>, JoinError>) -> ! {
    match result {
        Ok(Ok(())) => {
            log::info!("Graceful shutdown completed");
            std::process::exit(ExitCode::Success as i32);
        }
        Ok(Err(e)) => {
            log::error!("Application failed: {e:#}");
            std::process::exit(ExitCode::RuntimeError as i32);
        }
        Err(e) => {
            log::error!("Application crashed: {e}");
            std::process::exit(ExitCode::RuntimeError as i32);
        }
    }
}
