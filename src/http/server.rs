//! HTTP server setup and the accept loop.
//!
//! # Responsibilities
//! - Build the process-wide shared state (file access table, audit log)
//! - Start the worker pool over a bounded queue
//! - Run the acceptor: accept, push, repeat
//! - Stop accepting on shutdown, drain the queue, join the workers

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::files::FileAccess;
use crate::http::handlers::Dispatcher;
use crate::lifecycle::Shutdown;
use crate::net::{Connection, Listener, ListenerError};
use crate::observability::{metrics, AuditLog};
use crate::pool::{BoundedQueue, WorkerPool};

/// Pause after a failed accept (e.g. descriptor exhaustion) before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("failed to spawn worker threads: {0}")]
    Spawn(#[source] std::io::Error),
}

/// File server: one acceptor feeding a fixed pool of workers.
pub struct HttpServer {
    config: ServerConfig,
    dispatcher: Dispatcher,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a server that audits to standard error.
    pub fn new(config: ServerConfig) -> Self {
        let audit = AuditLog::stderr(config.audit.put_status);
        Self::with_audit(config, audit)
    }

    /// Create a server with a caller-supplied audit log.
    pub fn with_audit(config: ServerConfig, audit: AuditLog) -> Self {
        let access = Arc::new(FileAccess::new(config.storage.root.clone()));
        let dispatcher = Dispatcher::new(access, Arc::new(audit));
        Self {
            config,
            dispatcher,
            shutdown: Shutdown::new(),
        }
    }

    /// Handle that stops [`run`](Self::run) when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve until shutdown is triggered.
    pub fn run(self, listener: Listener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Listener(ListenerError::Bind(e)))?;
        self.shutdown.register_wake_addr(local_addr);

        let threads = self.config.workers.threads.max(1);
        let queue: Arc<BoundedQueue<TcpStream>> =
            Arc::new(BoundedQueue::new(self.config.workers.effective_queue_capacity()));

        let pool = {
            let dispatcher = self.dispatcher.clone();
            let limits = self.config.limits.clone();
            let timeouts = self.config.timeouts.clone();
            let depth = Arc::clone(&queue);
            WorkerPool::spawn(threads, Arc::clone(&queue), move |worker, stream: TcpStream| {
                metrics::record_queue_depth(depth.len());
                let mut conn = match Connection::new(stream, &limits, &timeouts) {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(worker, error = %e, "Failed to set up connection");
                        return;
                    }
                };
                tracing::trace!(worker, connection_id = %conn.id(), peer = ?conn.peer(), "Handling connection");
                dispatcher.handle(&mut conn);
                conn.close();
            })
            .map_err(ServerError::Spawn)?
        };

        tracing::info!(
            address = %local_addr,
            workers = threads,
            queue_capacity = queue.capacity(),
            root = %self.dispatcher.access().root().display(),
            "File server started"
        );

        self.accept_loop(&listener, &queue);

        queue.close();
        pool.join();
        tracing::info!("File server stopped");
        Ok(())
    }

    fn accept_loop(&self, listener: &Listener, queue: &BoundedQueue<TcpStream>) {
        while !self.shutdown.is_triggered() {
            let (stream, peer) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    std::thread::sleep(ACCEPT_ERROR_BACKOFF);
                    continue;
                }
            };
            if self.shutdown.is_triggered() {
                // Most likely the wake-up connection itself.
                break;
            }

            metrics::record_accept();
            tracing::trace!(peer = %peer, "Queueing connection");
            if queue.push(stream).is_err() {
                break;
            }
            metrics::record_queue_depth(queue.len());
        }
    }
}
