//! Observability subsystem.
//!
//! Structured logging via `tracing`. The cookie rewriter logs dropped
//! `Set-Cookie` lines at debug and individual rewrites at trace.

pub mod logging;

pub use logging::init_logging;
