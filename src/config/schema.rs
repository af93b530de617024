//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the reader proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Line-protocol listener (bind address, backlog, session limit).
    pub listener: ListenerConfig,

    /// Remote reader gateway reached over HTTP.
    pub gateway: GatewayConfig,

    /// Card simulation and local reader substitution.
    pub card: CardConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind. `0.0.0.0` means all interfaces.
    pub bind_host: String,

    /// TCP port for the line protocol.
    pub bind_port: u16,

    /// Listen backlog passed to the kernel.
    pub backlog: u32,

    /// Maximum concurrent client sessions (backpressure).
    pub max_sessions: usize,

    /// Size of a single socket read.
    pub read_buffer_bytes: usize,
}

impl ListenerConfig {
    /// `host:port` string used for address resolution.
    pub fn bind_address(&self) -> String {
        if self.bind_host.contains(':') && !self.bind_host.starts_with('[') {
            // Bare IPv6 literal
            format!("[{}]:{}", self.bind_host, self.bind_port)
        } else {
            format!("{}:{}", self.bind_host, self.bind_port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 4001,
            backlog: 10,
            max_sessions: 256,
            read_buffer_bytes: 4096,
        }
    }
}

/// Reader gateway (REST backend) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL every command is sent to as a GET with query parameters.
    pub url: String,

    /// Name of the authentication header.
    pub auth_header_name: String,

    /// Value of the authentication header, attached to every call.
    pub auth_header_value: String,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8081/api/v1/basic".to_string(),
            auth_header_name: "X-Auth-Token".to_string(),
            auth_header_value: String::new(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Card behaviour configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CardConfig {
    /// Answer APDU/RESET with fixed responses instead of calling the gateway.
    pub simulate: bool,

    /// Replace remote reader names with `local_reader_name`.
    pub local_reader_override: bool,

    /// Reader used for gateway calls when the override applies.
    pub local_reader_name: String,

    /// Substring (case-sensitive) identifying remote readers subject to the override.
    pub remote_reader_marker: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            local_reader_override: false,
            local_reader_name: "OMNIKEY CardMan 6121 0".to_string(),
            remote_reader_marker: "Simona".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
