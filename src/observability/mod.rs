//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → audit.rs (one CSV line per completed request, stderr)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Everything else produces:
//!     → logging.rs (structured tracing events, stdout)
//! ```
//!
//! # Design Decisions
//! - The audit line format is a contract, so it bypasses tracing entirely
//! - Metrics are cheap no-ops unless an exporter is installed

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditLog, AuditRecord, MemorySink, PutAuditStatus};
