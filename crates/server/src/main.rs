use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing::{info, warn};

use ephemera_relay::{ContentRelay, ExpirySweeper};
use ephemera_server::api::AppState;
use ephemera_server::config::EphemeraConfig;

/// Ephemera local content sharing server.
#[derive(Parser, Debug)]
#[command(
    name = "ephemera-server",
    about = "Share files and text with devices on the local network"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ephemera.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config = EphemeraConfig::load(&cli.config)?;

    ephemera_server::telemetry::init(&config.logging);

    let limits = config.content.limits();
    info!(
        ttl_seconds = limits.ttl.num_seconds(),
        max_file_size = limits.max_file_size,
        max_text_length = limits.max_text_length,
        "content limits loaded"
    );

    let relay = Arc::new(ContentRelay::builder().limits(limits).build());

    let (sweeper, sweeper_shutdown) =
        ExpirySweeper::new(Arc::clone(&relay), config.content.sweep_interval());
    let sweeper_handle = sweeper.spawn();
    info!(
        interval_secs = config.content.sweep_interval_seconds,
        "expiry sweeper started"
    );

    let mut state = AppState::new(Arc::clone(&relay), config.stream.clone());
    if config.ui.enabled {
        state = state.with_ui(config.ui.dist_path.clone());
    }
    let app = ephemera_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "ephemera-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. Event streams never
    // finish on their own, so stop waiting for them after the timeout.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        notify.notify_one();
    });

    tokio::select! {
        result = server.into_future() => result?,
        () = async {
            signalled.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                observers = relay.observer_count(),
                "connections still open after shutdown timeout, closing them"
            );
        }
    }

    // Stop the sweeper. Shared content lives only in memory and is dropped
    // with the process.
    let _ = sweeper_shutdown.send(()).await;
    if tokio::time::timeout(shutdown_timeout, sweeper_handle)
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded while stopping the expiry sweeper"
        );
    }

    info!(
        discarded_entries = relay.store_len(),
        "ephemera-server shut down"
    );
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
