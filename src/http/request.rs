//! Request parsing.
//!
//! # Responsibilities
//! - Parse the request line and header block of an HTTP/1.1 request
//! - Enforce token shape and length limits
//! - Expose method, URI and case-insensitive header lookup to handlers
//!
//! # Design Decisions
//! - Parsing failures are expressed as the `Response` to send, so the
//!   connection can answer without involving a handler
//! - URIs are restricted to a single path segment of `[A-Za-z0-9._-]`,
//!   which keeps them inside the storage root

use std::fmt;

use crate::config::LimitsConfig;
use crate::http::Response;

/// Request method. Only GET and PUT are served; anything else is kept
/// verbatim so it can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Other(String),
}

impl Method {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "PUT" => Method::Put,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Other(token) => token.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    content_length: Option<u64>,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target, including its leading `/`.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length. Always present for a parsed PUT.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The `Request-Id` header, if the client sent one.
    pub fn request_id(&self) -> Option<&str> {
        self.header("Request-Id")
    }
}

/// Parse a request head: everything before the blank line, without the
/// terminating `\r\n\r\n`.
pub fn parse_head(head: &[u8], limits: &LimitsConfig) -> Result<Request, Response> {
    let head = std::str::from_utf8(head).map_err(|_| Response::BadRequest)?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().ok_or(Response::BadRequest)?;
    let mut parts = request_line.split(' ');
    let (method, uri, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(uri), Some(version), None) => (method, uri, version),
        _ => return Err(Response::BadRequest),
    };

    if !valid_method(method, limits.max_method_len)
        || !valid_uri(uri, limits.max_uri_len)
        || !valid_version(version)
    {
        return Err(Response::BadRequest);
    }
    if version != "HTTP/1.1" {
        return Err(Response::VersionNotSupported);
    }

    let mut headers = Vec::new();
    for line in lines {
        let (key, value) = line.split_once(": ").ok_or(Response::BadRequest)?;
        if !valid_header_key(key, limits.max_header_key_len)
            || !valid_header_value(value, limits.max_header_value_len)
        {
            return Err(Response::BadRequest);
        }
        headers.push((key.to_string(), value.to_string()));
    }

    let mut request = Request {
        method: Method::from_token(method),
        uri: uri.to_string(),
        headers,
        content_length: None,
    };

    request.content_length = match request.header("Content-Length") {
        Some(value) => Some(value.parse().map_err(|_| Response::BadRequest)?),
        None => None,
    };
    if request.method == Method::Put && request.content_length.is_none() {
        return Err(Response::BadRequest);
    }

    Ok(request)
}

fn valid_method(token: &str, max_len: usize) -> bool {
    (1..=max_len).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_alphabetic())
}

fn valid_uri(uri: &str, max_len: usize) -> bool {
    match uri.strip_prefix('/') {
        Some(path) => {
            (1..=max_len).contains(&path.len())
                && path
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        }
        None => false,
    }
}

fn valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    version.starts_with("HTTP/")
        && bytes.len() == 8
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'.'
        && bytes[7].is_ascii_digit()
}

fn valid_header_key(key: &str, max_len: usize) -> bool {
    (1..=max_len).contains(&key.len())
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-'))
}

fn valid_header_value(value: &str, max_len: usize) -> bool {
    value.len() <= max_len && value.bytes().all(|b| (b' '..=b'~').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(head: &str) -> Result<Request, Response> {
        parse_head(head.as_bytes(), &LimitsConfig::default())
    }

    #[test]
    fn parses_get_with_headers() {
        let request = parse("GET /foo.txt HTTP/1.1\r\nHost: localhost\r\nrequest-id: 7").unwrap();
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.uri(), "/foo.txt");
        assert_eq!(request.header("HOST"), Some("localhost"));
        assert_eq!(request.request_id(), Some("7"));
        assert_eq!(request.content_length(), None);
    }

    #[test]
    fn put_requires_content_length() {
        assert_eq!(parse("PUT /a HTTP/1.1").unwrap_err(), Response::BadRequest);
        assert_eq!(
            parse("PUT /a HTTP/1.1\r\nContent-Length: ten").unwrap_err(),
            Response::BadRequest
        );

        let request = parse("PUT /a HTTP/1.1\r\nContent-Length: 10").unwrap();
        assert_eq!(request.method(), &Method::Put);
        assert_eq!(request.content_length(), Some(10));
    }

    #[test]
    fn unknown_methods_are_kept_verbatim() {
        let request = parse("DELETE /a HTTP/1.1").unwrap();
        assert_eq!(request.method(), &Method::Other("DELETE".into()));
        assert_eq!(request.method().as_str(), "DELETE");

        // Case matters: only the exact tokens are GET and PUT.
        let lower = parse("get /a HTTP/1.1").unwrap();
        assert_eq!(lower.method().as_str(), "get");
        assert_ne!(lower.method(), &Method::Get);
    }

    #[test]
    fn rejects_malformed_request_lines() {
        for head in [
            "",
            "GET",
            "GET /a",
            "GET /a HTTP/1.1 extra",
            "GET a HTTP/1.1",
            "GET / HTTP/1.1",
            "GET /a/b HTTP/1.1",
            "GET /../etc HTTP/1.1x",
            "GE7 /a HTTP/1.1",
            "TOOLONGMETHOD /a HTTP/1.1",
            "GET /a HTTPS/1.1",
            "GET /a HTTP/11",
        ] {
            assert_eq!(parse(head).unwrap_err(), Response::BadRequest, "{head:?}");
        }

        let long_uri = format!("GET /{} HTTP/1.1", "a".repeat(64));
        assert_eq!(parse(&long_uri).unwrap_err(), Response::BadRequest);
    }

    #[test]
    fn rejects_other_versions() {
        assert_eq!(parse("GET /a HTTP/1.0").unwrap_err(), Response::VersionNotSupported);
        assert_eq!(parse("GET /a HTTP/2.0").unwrap_err(), Response::VersionNotSupported);
    }

    #[test]
    fn rejects_malformed_headers() {
        for head in [
            "GET /a HTTP/1.1\r\nNoSeparator",
            "GET /a HTTP/1.1\r\nBad Key: v",
            "GET /a HTTP/1.1\r\n: empty-key",
            "GET /a HTTP/1.1\r\nKey: tab\tinside",
        ] {
            assert_eq!(parse(head).unwrap_err(), Response::BadRequest, "{head:?}");
        }

        let long_value = format!("GET /a HTTP/1.1\r\nKey: {}", "v".repeat(129));
        assert_eq!(parse(&long_value).unwrap_err(), Response::BadRequest);
    }
}
