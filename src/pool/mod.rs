//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! acceptor ──push──▶ queue.rs (bounded, blocking) ──pop──▶ worker.rs (N threads)
//! ```
//!
//! # Design Decisions
//! - A single shared FIFO queue; no per-worker queues or work stealing
//! - A full queue blocks the acceptor, so excess clients wait in the
//!   kernel accept backlog
//! - Closing the queue is the shutdown signal for workers

pub mod queue;
pub mod worker;

pub use queue::{BoundedQueue, PushError};
pub use worker::WorkerPool;
