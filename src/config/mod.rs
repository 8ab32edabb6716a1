//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, regex compilation)
//!     → ProxyConfig (validated, immutable)
//!     → proxy_cookie section compiled into the cookie rewriter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{DomainConfig, ListenerConfig, PathConfig, ProxyConfig, ProxyCookieConfig, Rewrite};
pub use validation::{validate_config, ValidationError};
