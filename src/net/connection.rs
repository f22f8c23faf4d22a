//! Per-connection protocol handling.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Read and parse one request head, keeping any body bytes that arrived
//!   with it
//! - Write catalog responses and stream file bodies in either direction
//! - Close the socket so the client sees the full response
//!
//! # Design Decisions
//! - One request per connection; no keep-alive
//! - Protocol failures come back as the `Response` to send
//! - The read timeout is a deadline for the whole request, not a bound on
//!   each `read`, so a client trickling bytes cannot keep a worker
//! - Closing half-closes the write side and drains briefly so unread
//!   request bytes do not turn the close into a reset

use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::http::request::{parse_head, Request};
use crate::http::Response;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const READ_CHUNK: usize = 4096;
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const LINGER_TIMEOUT: Duration = Duration::from_millis(500);
const LINGER_MAX_BYTES: usize = 1 << 20;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One accepted client connection, alive for a single request/response.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    stream: TcpStream,
    peer: Option<SocketAddr>,
    /// Bytes read past the end of the request head.
    pending: Vec<u8>,
    limits: LimitsConfig,
    /// When reading the request (head and body) must be finished.
    read_deadline: Option<Instant>,
}

impl Connection {
    /// Wrap an accepted stream, applying socket timeouts. The read timeout
    /// starts counting now.
    pub fn new(stream: TcpStream, limits: &LimitsConfig, timeouts: &TimeoutConfig) -> io::Result<Self> {
        let read_timeout = timeouts.read();
        stream.set_read_timeout(read_timeout)?;
        stream.set_write_timeout(timeouts.write())?;
        let peer = stream.peer_addr().ok();
        Ok(Self {
            id: ConnectionId::new(),
            stream,
            peer,
            pending: Vec::new(),
            limits: limits.clone(),
            read_deadline: read_timeout.map(|timeout| Instant::now() + timeout),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Read and parse the request head.
    ///
    /// On failure the returned `Response` is ready to send as-is.
    pub fn parse(&mut self) -> Result<Request, Response> {
        let limit = self.limits.max_header_bytes;
        let mut buffer = Vec::with_capacity(READ_CHUNK.min(limit + HEAD_TERMINATOR.len()));
        let mut chunk = [0u8; READ_CHUNK];
        let mut scanned: usize = 0;

        let head_end = loop {
            // Only rescan the tail that could complete a terminator.
            let from = scanned.saturating_sub(HEAD_TERMINATOR.len() - 1);
            if let Some(pos) = find(&buffer[from..], HEAD_TERMINATOR) {
                break from + pos;
            }
            scanned = buffer.len();
            if buffer.len() >= limit + HEAD_TERMINATOR.len() {
                tracing::debug!(connection_id = %self.id, "Request head too large");
                return Err(Response::BadRequest);
            }

            match self.read_before_deadline(&mut chunk) {
                Ok(0) => {
                    tracing::debug!(connection_id = %self.id, "Connection closed before request head");
                    return Err(Response::BadRequest);
                }
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(connection_id = %self.id, error = %e, "Failed to read request head");
                    return Err(Response::BadRequest);
                }
            }
        };

        if head_end > limit {
            return Err(Response::BadRequest);
        }

        self.pending = buffer.split_off(head_end + HEAD_TERMINATOR.len());
        buffer.truncate(head_end);
        parse_head(&buffer, &self.limits)
    }

    /// Send a catalog response with its canned body.
    pub fn send_response(&mut self, response: Response) {
        let body = response.body();
        let message = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response.code(),
            response.reason(),
            body.len(),
            body
        );
        if let Err(e) = self.stream.write_all(message.as_bytes()) {
            tracing::debug!(connection_id = %self.id, error = %e, "Failed to send response");
        }
    }

    /// Send `200 OK` followed by exactly `size` bytes of `file`.
    ///
    /// Returns `None` on success. Once the status line is out nothing else
    /// can be sent, so a returned error is for the audit log only.
    pub fn send_file(&mut self, file: &mut File, size: u64) -> Option<Response> {
        let header = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            Response::Ok.code(),
            Response::Ok.reason(),
            size
        );

        let result = self
            .stream
            .write_all(header.as_bytes())
            .and_then(|()| io::copy(&mut file.take(size), &mut self.stream));

        match result {
            Ok(sent) if sent == size => None,
            Ok(sent) => {
                tracing::warn!(connection_id = %self.id, sent, size, "File shorter than its reported size");
                Some(Response::InternalServerError)
            }
            Err(e) => {
                tracing::debug!(connection_id = %self.id, error = %e, "Failed to send file");
                Some(Response::InternalServerError)
            }
        }
    }

    /// Receive exactly `length` body bytes into `file`.
    ///
    /// Returns `None` on success, `BadRequest` if the client sends fewer
    /// bytes than declared, `InternalServerError` if the file write fails.
    pub fn recv_file(&mut self, file: &mut File, length: u64) -> Option<Response> {
        let mut remaining = length;

        let buffered = self.pending.len().min(usize::try_from(length).unwrap_or(usize::MAX));
        if buffered > 0 {
            if let Err(e) = file.write_all(&self.pending[..buffered]) {
                tracing::warn!(connection_id = %self.id, error = %e, "Failed to write request body");
                return Some(Response::InternalServerError);
            }
            self.pending.drain(..buffered);
            remaining -= buffered as u64;
        }

        let mut chunk = [0u8; READ_CHUNK];
        while remaining > 0 {
            let want = chunk.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let n = match self.read_before_deadline(&mut chunk[..want]) {
                Ok(0) => {
                    tracing::debug!(connection_id = %self.id, remaining, "Request body ended early");
                    return Some(Response::BadRequest);
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(connection_id = %self.id, error = %e, "Failed to read request body");
                    return Some(Response::BadRequest);
                }
            };
            if let Err(e) = file.write_all(&chunk[..n]) {
                tracing::warn!(connection_id = %self.id, error = %e, "Failed to write request body");
                return Some(Response::InternalServerError);
            }
            remaining -= n as u64;
        }

        None
    }

    /// Read into `buf`, failing with `TimedOut` once the request read
    /// deadline has passed.
    fn read_before_deadline(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(deadline) = self.read_deadline {
            let left = remaining(deadline).ok_or(io::ErrorKind::TimedOut)?;
            self.stream.set_read_timeout(Some(left))?;
        }
        self.stream.read(buf)
    }

    /// Finish the exchange and release the socket.
    pub fn close(mut self) {
        if self.stream.shutdown(Shutdown::Write).is_err() {
            return;
        }

        let deadline = Instant::now() + LINGER_TIMEOUT;
        let mut chunk = [0u8; READ_CHUNK];
        let mut drained = 0;
        while drained < LINGER_MAX_BYTES {
            let Some(left) = remaining(deadline) else { break };
            if self.stream.set_read_timeout(Some(left)).is_err() {
                break;
            }
            match self.stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
        tracing::trace!(connection_id = %self.id, drained, "Connection closed");
    }
}

/// Time left until `deadline`, or `None` once it has passed.
fn remaining(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
