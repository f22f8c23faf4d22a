//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (blocking accept)
//!     → [bounded work queue] (pool)
//!     → connection.rs (parse one request, respond, close)
//! ```
//!
//! # Design Decisions
//! - One request per connection; the socket is closed after the response
//! - Read/write timeouts bound how long a slow client can hold a worker

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionId};
pub use listener::{Listener, ListenerError};
