//! Response catalog.
//!
//! # Responsibilities
//! - Enumerate every status this server can produce
//! - Provide the numeric code, reason phrase and canned body for each
//!
//! # Design Decisions
//! - Responses are plain `Copy` values, never shared mutable state
//! - The canned body is the reason phrase followed by a newline

use std::fmt;

/// A status the server can send, from a fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Response {
    Ok,
    Created,
    BadRequest,
    Forbidden,
    NotFound,
    InternalServerError,
    NotImplemented,
    VersionNotSupported,
}

impl Response {
    /// Numeric HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            Response::Ok => 200,
            Response::Created => 201,
            Response::BadRequest => 400,
            Response::Forbidden => 403,
            Response::NotFound => 404,
            Response::InternalServerError => 500,
            Response::NotImplemented => 501,
            Response::VersionNotSupported => 505,
        }
    }

    /// Reason phrase for the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Response::Ok => "OK",
            Response::Created => "Created",
            Response::BadRequest => "Bad Request",
            Response::Forbidden => "Forbidden",
            Response::NotFound => "Not Found",
            Response::InternalServerError => "Internal Server Error",
            Response::NotImplemented => "Not Implemented",
            Response::VersionNotSupported => "Version Not Supported",
        }
    }

    /// Body sent when the response carries no file content.
    pub fn body(self) -> String {
        format!("{}\n", self.reason())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
