//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Worker pops a connection
//!     → request.rs (parse request line and headers)
//!     → handlers.rs (GET / PUT / unsupported)
//!     → response.rs (status from a fixed catalog)
//!     → Send to client, close
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::Dispatcher;
pub use request::{Method, Request};
pub use response::Response;
pub use server::{HttpServer, ServerError};
