//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the cookie proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// `Set-Cookie` rewrite rules applied to upstream responses.
    pub proxy_cookie: ProxyCookieConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream authority (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Cookie rewrite configuration.
///
/// Mirrors the `path` / `domain` sections of the config file:
///
/// ```toml
/// [proxy_cookie.path]
/// prefix = "foo"
/// rewrites = [{ regex = "^/bar/(.*)$", replacement = "/$1" }]
///
/// [proxy_cookie.domain]
/// rewrites = [{ regex = "^internal\\.(.+)$", replacement = "$1" }]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyCookieConfig {
    /// Instance name used in logs.
    pub name: String,

    /// Rewrites applied to the cookie `Path` attribute.
    pub path: PathConfig,

    /// Rewrites applied to the cookie `Domain` attribute.
    pub domain: DomainConfig,
}

impl Default for ProxyCookieConfig {
    fn default() -> Self {
        Self {
            name: "proxyCookie".to_string(),
            path: PathConfig::default(),
            domain: DomainConfig::default(),
        }
    }
}

/// Path rewrite settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PathConfig {
    /// Segment prepended to every cookie path (without slashes, e.g. "foo").
    pub prefix: String,

    /// Regex rewrites, applied in order after the prefix.
    pub rewrites: Vec<Rewrite>,
}

/// Domain rewrite settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DomainConfig {
    /// Regex rewrites, applied in order.
    pub rewrites: Vec<Rewrite>,
}

/// A single regex replacement.
///
/// `replacement` may reference capture groups as `$1`, `${1}` or `${name}`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Rewrite {
    pub regex: String,
    pub replacement: String,
}

impl Rewrite {
    pub fn new(regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            replacement: replacement.into(),
        }
    }
}
