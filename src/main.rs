//! squat-counter: background daemon counting squats from pose keypoints
//!
//! A pose source (camera + estimator) connects over a Unix socket and
//! submits keypoints for each frame. The daemon provides:
//! - A single squat session owned by a worker task
//! - Per-frame outcomes: rep count, phase, feedback, skeleton lines
//! - Pushed feedback and rep notifications for subscribed UI clients
//!
//! Camera capture, pose estimation, rendering and audio stay with the
//! clients.

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use squat_counter::config::Config;
use squat_counter::events::SessionEvent;
use squat_counter::ipc::Server;
use squat_counter::lifecycle::ShutdownSignal;
use squat_counter::service::SessionHandle;
use squat_counter::session::SquatSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "squat-counter starting");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.tuning, "configuration loaded");

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Session worker -> subscribed IPC clients
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(64);

    // The session is owned by its worker; everything else holds a handle
    let session = SquatSession::new(config.tuning);
    let (session_handle, worker) = SessionHandle::spawn(session, event_tx.clone());

    let server = Server::new(&config.socket_path, session_handle, event_tx)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to install signal handlers"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;
    worker.abort();

    info!("squat-counter stopped");

    Ok(())
}
