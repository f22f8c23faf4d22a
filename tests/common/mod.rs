//! Shared utilities for integration tests.

use std::io::{Read, Write};
use std::net::{Shutdown as SocketShutdown, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use file_server::config::{ListenerConfig, ServerConfig};
use file_server::net::Listener;
use file_server::observability::{AuditLog, MemorySink};
use file_server::{HttpServer, Shutdown};
use tempfile::TempDir;

/// A server running on an ephemeral port over a temporary directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub audit: MemorySink,
    shutdown: Shutdown,
    thread: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    #[allow(dead_code)]
    pub fn start(threads: usize) -> Self {
        Self::start_with(|config| config.workers.threads = threads)
    }

    pub fn start_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut config = ServerConfig::default();
        config.listener = ListenerConfig {
            bind_address: "127.0.0.1".into(),
            port: 0,
        };
        config.storage.root = dir.path().to_path_buf();
        configure(&mut config);

        let audit = MemorySink::new();
        let listener = Listener::bind(&config.listener).expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = HttpServer::with_audit(
            config.clone(),
            AuditLog::new(audit.clone(), config.audit.put_status),
        );
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || {
            server.run(listener).expect("server run");
        });

        Self {
            addr,
            dir,
            audit,
            shutdown,
            thread: Some(thread),
        }
    }

    #[allow(dead_code)]
    pub fn url(&self, name: &str) -> String {
        format!("http://{}/{}", self.addr, name)
    }

    #[allow(dead_code)]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Poll the audit sink until it holds at least `count` lines.
    #[allow(dead_code)]
    pub fn audit_lines(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let lines = self.audit.lines();
            if lines.len() >= count || Instant::now() > deadline {
                return lines;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Trigger shutdown and wait for the server thread to finish.
    #[allow(dead_code)]
    pub fn stop(mut self) -> bool {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> bool {
        self.shutdown.trigger();
        match self.thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop_inner();
    }
}

/// HTTP client that never reuses connections; the server closes every
/// connection after one response.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Send raw bytes and return everything the server answers.
#[allow(dead_code)]
pub fn raw_request(addr: SocketAddr, bytes: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(bytes).unwrap();
    let _ = stream.shutdown(SocketShutdown::Write);

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response);
    String::from_utf8_lossy(&response).into_owned()
}
