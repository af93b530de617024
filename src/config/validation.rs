//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, session cap within semaphore range)
//! - Check the gateway URL and auth header are usable by the HTTP client
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use reqwest::header::HeaderName;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("gateway.url '{url}' is invalid: {reason}")]
    GatewayUrl { url: String, reason: String },

    #[error("gateway.auth_header_name '{0}' is not a valid header name")]
    AuthHeaderName(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("card.local_reader_name must be set when local_reader_override is enabled")]
    MissingLocalReader,

    #[error("card.remote_reader_marker must not be empty")]
    EmptyReaderMarker,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.gateway.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::GatewayUrl {
            url: config.gateway.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::GatewayUrl {
            url: config.gateway.url.clone(),
            reason: e.to_string(),
        }),
    }

    if HeaderName::from_bytes(config.gateway.auth_header_name.as_bytes()).is_err() {
        errors.push(ValidationError::AuthHeaderName(
            config.gateway.auth_header_name.clone(),
        ));
    }

    let positive = [
        ("gateway.timeout_secs", config.gateway.timeout_secs as usize),
        ("gateway.connect_timeout_secs", config.gateway.connect_timeout_secs as usize),
        ("listener.backlog", config.listener.backlog as usize),
        ("listener.max_sessions", config.listener.max_sessions),
        ("listener.read_buffer_bytes", config.listener.read_buffer_bytes),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.listener.max_sessions > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooLarge {
            field: "listener.max_sessions",
            max: Semaphore::MAX_PERMITS,
        });
    }

    if config.card.local_reader_override && config.card.local_reader_name.trim().is_empty() {
        errors.push(ValidationError::MissingLocalReader);
    }
    if config.card.remote_reader_marker.is_empty() {
        errors.push(ValidationError::EmptyReaderMarker);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
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
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.gateway.url = "ftp://reader-gateway/api".into();
        config.gateway.auth_header_name = "X Auth".into();
        config.gateway.timeout_secs = 0;
        config.listener.max_sessions = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::GatewayUrl { .. }));
        assert_eq!(errors[1], ValidationError::AuthHeaderName("X Auth".into()));
        assert!(errors.contains(&ValidationError::Zero { field: "gateway.timeout_secs" }));
        assert!(errors.contains(&ValidationError::Zero { field: "listener.max_sessions" }));
    }

    #[test]
    fn session_cap_must_fit_the_semaphore() {
        let mut config = ProxyConfig::default();
        config.listener.max_sessions = Semaphore::MAX_PERMITS;
        assert!(validate_config(&config).is_ok());

        config.listener.max_sessions = usize::MAX;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::TooLarge {
                field: "listener.max_sessions",
                max: Semaphore::MAX_PERMITS,
            }])
        );
    }

    #[test]
    fn override_requires_local_reader() {
        let mut config = ProxyConfig::default();
        config.card.local_reader_override = true;
        config.card.local_reader_name = "  ".into();

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MissingLocalReader])
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }
}
