//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the membrane.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the membrane.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MembraneConfig {
    /// Which gateway plugin is registered at startup.
    pub mode: Mode,

    /// Ingress listener settings shared by all gateway plugins.
    pub gateway: GatewayConfig,

    /// Function process settings.
    pub child: ChildConfig,

    /// Forwarding client settings.
    pub proxy: ProxyConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Operating mode: the ingress strategy active in this process.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plain HTTP listener; events arrive as annotated HTTP calls.
    #[default]
    Http,
    /// Provider event envelopes delivered as JSON documents.
    Envelope,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Http => f.write_str("http"),
            Mode::Envelope => f.write_str("envelope"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Mode::Http),
            "envelope" => Ok(Mode::Envelope),
            other => Err(format!("unknown membrane mode `{}`", other)),
        }
    }
}

/// Gateway listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address (e.g., "0.0.0.0:9001").
    pub bind_address: String,

    /// Maximum triggers handled concurrently.
    pub max_workers: usize,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Emit a completion line (status, latency) per trigger.
    pub log_result: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9001".to_string(),
            max_workers: 256,
            max_body_bytes: 6 * 1024 * 1024,
            log_result: true,
        }
    }
}

/// Function process configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ChildConfig {
    /// Address the function listens on (e.g., "127.0.0.1:8080").
    pub address: String,

    /// Command used to start the function; empty when it is managed elsewhere.
    pub command: Vec<String>,

    /// Seconds to wait for the function to accept connections.
    pub startup_timeout_secs: u64,
}

impl Default for ChildConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            command: Vec::new(),
            startup_timeout_secs: 5,
        }
    }
}

/// Forwarding client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Upper bound for a single forward call in seconds.
    pub forward_timeout_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Largest function response body accepted, in bytes.
    pub max_response_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            forward_timeout_secs: 30,
            idle_timeout_secs: 60,
            max_response_bytes: 6 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Serve Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
