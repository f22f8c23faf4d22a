//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::PutAuditStatus;

/// Root configuration for the file server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Worker pool and queue sizing.
    pub workers: WorkerConfig,

    /// Where request URIs resolve on disk.
    pub storage: StorageConfig,

    /// Per-connection socket timeouts.
    pub timeouts: TimeoutConfig,

    /// Request parsing limits.
    pub limits: LimitsConfig,

    /// Audit log behavior.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port. 0 picks an ephemeral port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads.
    pub threads: usize,

    /// Queue capacity. 0 means "same as `threads`".
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            queue_capacity: 0,
        }
    }
}

impl WorkerConfig {
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            self.threads.max(1)
        } else {
            self.queue_capacity
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory request URIs are resolved against.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Timeout configuration. A value of 0 disables the timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Socket read timeout in seconds.
    pub read_secs: u64,

    /// Socket write timeout in seconds.
    pub write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn read(&self) -> Option<Duration> {
        (self.read_secs > 0).then(|| Duration::from_secs(self.read_secs))
    }

    pub fn write(&self) -> Option<Duration> {
        (self.write_secs > 0).then(|| Duration::from_secs(self.write_secs))
    }
}

/// Request parsing limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of request line plus headers, in bytes.
    pub max_header_bytes: usize,

    /// Maximum URI length, excluding the leading slash.
    pub max_uri_len: usize,

    /// Maximum method token length.
    pub max_method_len: usize,

    /// Maximum header name length.
    pub max_header_key_len: usize,

    /// Maximum header value length.
    pub max_header_value_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: 2048,
            max_uri_len: 63,
            max_method_len: 8,
            max_header_key_len: 128,
            max_header_value_len: 128,
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    /// Status recorded for PUT requests.
    pub put_status: PutAuditStatus,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
