//! Request dispatch and method handlers.
//!
//! Every handler produces exactly one response and exactly one audit
//! record, and releases its file lease on every path before returning.

use std::sync::Arc;
use std::time::Instant;

use crate::files::FileAccess;
use crate::http::{Method, Request, Response};
use crate::net::Connection;
use crate::observability::{metrics, AuditLog, AuditRecord};

/// Shared, read-only state the handlers need.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    access: Arc<FileAccess>,
    audit: Arc<AuditLog>,
}

impl Dispatcher {
    pub fn new(access: Arc<FileAccess>, audit: Arc<AuditLog>) -> Self {
        Self { access, audit }
    }

    pub fn access(&self) -> &FileAccess {
        &self.access
    }

    /// Serve one connection: parse, dispatch by method, respond.
    ///
    /// Returns the response sent, or `None` when the request head could not
    /// be parsed (the error response is still sent, but nothing is audited).
    pub fn handle(&self, conn: &mut Connection) -> Option<Response> {
        let start = Instant::now();

        let request = match conn.parse() {
            Ok(request) => request,
            Err(response) => {
                tracing::debug!(connection_id = %conn.id(), status = response.code(), "Malformed request");
                conn.send_response(response);
                return None;
            }
        };

        let response = match request.method() {
            Method::Get => self.handle_get(conn, &request),
            Method::Put => self.handle_put(conn, &request),
            Method::Other(_) => self.handle_unsupported(conn, &request),
        };

        tracing::debug!(
            connection_id = %conn.id(),
            method = %request.method(),
            uri = %request.uri(),
            status = response.code(),
            "Request completed"
        );
        metrics::record_request(request.method().as_str(), response.code(), start);
        Some(response)
    }

    fn handle_get(&self, conn: &mut Connection, request: &Request) -> Response {
        let mut lease = match self.access.open_read(request.uri()) {
            Ok(lease) => lease,
            Err(e) => {
                tracing::debug!(uri = %request.uri(), error = %e, "GET rejected");
                let response = e.get_response();
                self.audit(request, response);
                conn.send_response(response);
                return response;
            }
        };

        let size = match lease.size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(uri = %request.uri(), error = %e, "GET stat failed");
                let response = e.get_response();
                self.audit(request, response);
                conn.send_response(response);
                return response;
            }
        };

        // The status line goes out with the body, so a transfer failure can
        // only be recorded, not reported to the client.
        let response = conn.send_file(lease.file(), size).unwrap_or(Response::Ok);
        drop(lease);
        self.audit(request, response);
        response
    }

    fn handle_put(&self, conn: &mut Connection, request: &Request) -> Response {
        let response = match self.access.open_write(request.uri()) {
            Ok(mut lease) => {
                let length = request.content_length().unwrap_or(0);
                match conn.recv_file(lease.file(), length) {
                    Some(error) => error,
                    None if lease.existed() => Response::Ok,
                    None => Response::Created,
                }
            }
            Err(e) => {
                tracing::debug!(uri = %request.uri(), error = %e, "PUT rejected");
                e.put_response()
            }
        };

        self.audit(request, self.audit.put_status(response));
        conn.send_response(response);
        response
    }

    fn handle_unsupported(&self, conn: &mut Connection, request: &Request) -> Response {
        let response = Response::NotImplemented;
        conn.send_response(response);
        self.audit(request, response);
        response
    }

    fn audit(&self, request: &Request, response: Response) {
        self.audit.record(&AuditRecord {
            method: request.method().as_str(),
            uri: request.uri(),
            status: response.code(),
            request_id: request.request_id(),
        });
    }
}
