//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threads > 0, limits > 0)
//! - Check the storage root is a usable directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("workers.threads must be at least 1")]
    NoWorkers,
    #[error("limits.{0} must be at least 1")]
    ZeroLimit(&'static str),
    #[error("listener.bind_address {0:?} is not an IP address")]
    BadBindAddress(String),
    #[error("storage.root {0:?} is not a directory")]
    BadRoot(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    BadMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers.threads == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    let limits = &config.limits;
    for (name, value) in [
        ("max_header_bytes", limits.max_header_bytes),
        ("max_uri_len", limits.max_uri_len),
        ("max_method_len", limits.max_method_len),
        ("max_header_key_len", limits.max_header_key_len),
        ("max_header_value_len", limits.max_header_value_len),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit(name));
        }
    }

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(config.listener.bind_address.clone()));
    }

    if !config.storage.root.is_dir() {
        errors.push(ValidationError::BadRoot(config.storage.root.display().to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
