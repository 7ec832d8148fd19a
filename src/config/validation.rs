//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0, workers > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MembraneConfig → Result<(), Vec<ValidationError>>
//! - Runs after every override has been applied

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;

use crate::config::schema::MembraneConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("gateway.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("child.address `{0}` is not a host:port authority")]
    ChildAddress(String),
    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &MembraneConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gateway.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.gateway.bind_address.clone()));
    }

    let child_ok = Authority::from_str(&config.child.address)
        .map(|authority| authority.port_u16().is_some())
        .unwrap_or(false);
    if !child_ok {
        errors.push(ValidationError::ChildAddress(config.child.address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let positive = [
        ("gateway.max_workers", config.gateway.max_workers as u64),
        ("gateway.max_body_bytes", config.gateway.max_body_bytes as u64),
        ("child.startup_timeout_secs", config.child.startup_timeout_secs),
        ("proxy.connect_timeout_secs", config.proxy.connect_timeout_secs),
        ("proxy.forward_timeout_secs", config.proxy.forward_timeout_secs),
        ("proxy.max_response_bytes", config.proxy.max_response_bytes as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&MembraneConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = MembraneConfig::default();
        config.gateway.bind_address = ":9001".into();
        config.child.address = "localhost".into();
        config.gateway.max_workers = 0;
        config.proxy.forward_timeout_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress(":9001".into()),
                ValidationError::ChildAddress("localhost".into()),
                ValidationError::MetricsAddress("nope".into()),
                ValidationError::Zero("gateway.max_workers"),
                ValidationError::Zero("proxy.forward_timeout_secs"),
            ]
        );
    }
}
