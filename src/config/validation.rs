//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, interval > 0)
//! - Check that addresses parse, and that the listener is IPv4
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SinkConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::SinkConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.bind_address '{0}' must be an IPv4 address")]
    NotIpv4(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &SinkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.bind_address.parse::<SocketAddr>() {
        Ok(SocketAddr::V4(_)) => {}
        Ok(SocketAddr::V6(_)) => errors.push(ValidationError::NotIpv4(
            config.listener.bind_address.clone(),
        )),
        Err(_) => errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        )),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("timeouts.read_ms", config.timeouts.read_ms),
        ("timeouts.write_ms", config.timeouts.write_ms),
        ("timeouts.idle_ms", config.timeouts.idle_ms),
        ("stats.interval_ms", config.stats.interval_ms),
        ("shutdown.grace_period_ms", config.shutdown.grace_period_ms),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
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
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&SinkConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SinkConfig::default();
        config.listener.bind_address = "[::1]:8080".to_string();
        config.stats.interval_ms = 0;
        config.timeouts.idle_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::NotIpv4("[::1]:8080".to_string()),
                ValidationError::Zero("timeouts.idle_ms"),
                ValidationError::Zero("stats.interval_ms"),
            ]
        );
    }

    #[test]
    fn test_rejects_garbage_addresses() {
        let mut config = SinkConfig::default();
        config.listener.bind_address = "localhost".to_string();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidBindAddress(_)));
        assert!(matches!(errors[1], ValidationError::InvalidMetricsAddress(_)));
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = SinkConfig::default();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
