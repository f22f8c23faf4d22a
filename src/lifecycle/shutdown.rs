//! Shutdown coordination for the server.

use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Coordinator for graceful shutdown.
///
/// Cloneable cancellation token shared by the acceptor, the signal handler
/// and tests. Because the acceptor is parked inside a blocking `accept`,
/// triggering also opens a throwaway connection to the registered wake
/// address so the acceptor observes the flag promptly.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    wake_addr: Mutex<Option<SocketAddr>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the address a blocked acceptor listens on.
    pub fn register_wake_addr(&self, addr: SocketAddr) {
        *self
            .inner
            .wake_addr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(addr);
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Shutdown triggered");

        let addr = *self
            .inner
            .wake_addr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(addr) = addr {
            // Unspecified bind addresses are not connectable everywhere.
            let target = if addr.ip().is_unspecified() {
                let loopback = match addr {
                    SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                    SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
                };
                SocketAddr::new(loopback, addr.port())
            } else {
                addr
            };
            if let Err(e) = TcpStream::connect_timeout(&target, Duration::from_secs(1)) {
                tracing::debug!(error = %e, "Wake-up connection failed");
            }
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn trigger_is_visible_to_clones() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        assert!(!observer.is_triggered());

        shutdown.trigger();
        shutdown.trigger();
        assert!(observer.is_triggered());
    }

    #[test]
    fn trigger_wakes_blocked_accept() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let shutdown = Shutdown::new();
        shutdown.register_wake_addr(listener.local_addr().unwrap());

        let acceptor = std::thread::spawn(move || listener.accept().is_ok());
        std::thread::sleep(Duration::from_millis(50));
        shutdown.trigger();

        assert!(acceptor.join().unwrap());
    }
}
