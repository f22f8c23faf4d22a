//! Request audit log.
//!
//! One `METHOD,URI,STATUS,REQUEST_ID` line per completed request, written
//! to a shared sink (stderr in production). Each line is formatted up front
//! and written with a single `write_all` while holding the sink lock, so
//! lines from concurrent workers never interleave.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::http::Response;

/// Request id logged when the client sent no `Request-Id` header.
pub const DEFAULT_REQUEST_ID: &str = "0";

/// Which status a PUT records in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PutAuditStatus {
    /// The status actually sent to the client.
    #[default]
    Actual,
    /// Always 200, whatever the outcome. Kept for log consumers that
    /// depend on the historical format.
    AlwaysOk,
}

/// One audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditRecord<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub status: u16,
    pub request_id: Option<&'a str>,
}

impl fmt::Display for AuditRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{},{},{},{}",
            self.method,
            self.uri,
            self.status,
            self.request_id.unwrap_or(DEFAULT_REQUEST_ID)
        )
    }
}

/// Serialized writer for audit records.
pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
    put_status: PutAuditStatus,
}

impl AuditLog {
    /// Audit log writing to an arbitrary sink.
    pub fn new(sink: impl Write + Send + 'static, put_status: PutAuditStatus) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            put_status,
        }
    }

    /// Audit log writing to standard error.
    pub fn stderr(put_status: PutAuditStatus) -> Self {
        Self::new(io::stderr(), put_status)
    }

    /// Status a PUT should record given the response it produced.
    pub fn put_status(&self, actual: Response) -> Response {
        match self.put_status {
            PutAuditStatus::Actual => actual,
            PutAuditStatus::AlwaysOk => Response::Ok,
        }
    }

    /// Append one record.
    pub fn record(&self, record: &AuditRecord<'_>) {
        let line = record.to_string();
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|()| sink.flush()) {
            tracing::warn!(error = %e, "Failed to write audit record");
        }
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("put_status", &self.put_status)
            .finish_non_exhaustive()
    }
}

/// In-memory audit sink, cloneable so a test can keep a handle to read from.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        let buffer = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Written lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
