//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM
//! - Translate the first one into a graceful shutdown
//!
//! # Design Decisions
//! - The server itself is thread-based; Tokio's signal handling runs on a
//!   dedicated thread with a current-thread runtime
//! - SIGPIPE needs no handler: the Rust runtime ignores it, so a client
//!   hanging up mid-write surfaces as a `BrokenPipe` error instead

use std::io;
use std::thread;

use crate::lifecycle::Shutdown;

/// Spawn a thread that triggers `shutdown` on the first termination signal.
pub fn spawn_signal_listener(shutdown: Shutdown) -> io::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            match runtime.block_on(wait_for_signal()) {
                Ok(signal) => tracing::info!(signal, "Shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers");
                    return;
                }
            }
            shutdown.trigger();
        })
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}
