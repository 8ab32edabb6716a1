//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0)
//! - Compile every rewrite regex once so bad patterns fail at load time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, Rewrite};
use crate::rewrite::rules::{CompiledRule, RuleError};

/// A single semantic problem with the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    BindAddress(String),

    #[error("upstream.address must not be empty")]
    EmptyUpstream,

    #[error("upstream.address {0:?} is not a valid host:port authority")]
    UpstreamAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("{field}[{index}]: {source}")]
    Rewrite {
        field: &'static str,
        index: usize,
        #[source]
        source: RuleError,
    },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = config.upstream.address.trim();
    if upstream.is_empty() {
        errors.push(ValidationError::EmptyUpstream);
    } else if Authority::from_str(upstream).is_err() {
        errors.push(ValidationError::UpstreamAddress(config.upstream.address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    check_rewrites("proxy_cookie.path.rewrites", &config.proxy_cookie.path.rewrites, &mut errors);
    check_rewrites("proxy_cookie.domain.rewrites", &config.proxy_cookie.domain.rewrites, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rewrites(field: &'static str, rewrites: &[Rewrite], errors: &mut Vec<ValidationError>) {
    for (index, rewrite) in rewrites.iter().enumerate() {
        if let Err(source) = CompiledRule::compile(rewrite) {
            errors.push(ValidationError::Rewrite { field, index, source });
        }
    }
}
