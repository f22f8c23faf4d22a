//! `httpserver`: multi-threaded GET/PUT file server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ acceptor ──push──▶ ┌──────────────┐ ──pop──▶ worker 0 ─┐
//!                (blocking accept)  │ bounded queue│ ──pop──▶ worker 1 ─┤
//!                                   │  (capacity C)│ ──pop──▶   ...     ├─▶ GET / PUT / 501
//!                                   └──────────────┘ ──pop──▶ worker N ─┘        │
//!                                                                               ▼
//!                                        file access table (open + flock) · audit log (stderr)
//! ```
//!
//! Usage: `httpserver [-t threads] [-c config.toml] [--root dir] <port>`

use std::path::PathBuf;

use clap::Parser;

use file_server::config::{read_config, validate_config, ConfigError, ServerConfig};
use file_server::lifecycle::spawn_signal_listener;
use file_server::net::Listener;
use file_server::observability::{logging, metrics};
use file_server::HttpServer;

#[derive(Parser)]
#[command(name = "httpserver")]
#[command(about = "Multi-threaded GET/PUT file server", long_about = None)]
struct Cli {
    /// TCP port to listen on.
    port: u16,

    /// Number of worker threads.
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// TOML configuration file; command-line values override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory request URIs resolve against.
    #[arg(long)]
    root: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServerConfig::default(),
        };

        config.listener.port = self.port;
        if let Some(threads) = self.threads {
            config.workers.threads = threads;
        }
        if let Some(root) = self.root {
            config.storage.root = root;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!("httpserver v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        port = config.listener.port,
        workers = config.workers.threads,
        read_timeout_secs = config.timeouts.read_secs,
        write_timeout_secs = config.timeouts.write_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = Listener::bind(&config.listener)?;
    let server = HttpServer::new(config);
    spawn_signal_listener(server.shutdown_handle())?;

    server.run(listener)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
