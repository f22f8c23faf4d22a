//! Multi-threaded file server library.
//!
//! GET reads a named file, PUT creates or replaces one. A single acceptor
//! pushes connections into a bounded queue drained by a fixed pool of
//! worker threads; per-file advisory locks keep readers from observing a
//! half-written file.

pub mod config;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pool;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
