//! Reverse proxy cookie rewriting.
//!
//! Rewrites the `Path` and `Domain` attributes of outgoing `Set-Cookie`
//! headers, so an upstream mounted under a path prefix or behind another
//! domain can still issue cookies that reach the client where it expects.
//!
//! The core lives in [`rewrite`]: it can wrap an imperative [`rewrite::Handler`]
//! (rewriting when the status is committed) or any tower service via
//! [`rewrite::ProxyCookieLayer`]. The `cookie-proxy` binary puts the layer in
//! front of a single upstream.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::{ProxyCookie, ProxyCookieLayer};
