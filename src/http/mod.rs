//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → proxy handler forwards to the upstream
//!     → ProxyCookieLayer rewrites Set-Cookie on the way back
//!     → Send to client
//! ```

pub mod server;

pub use server::{HttpServer, ServerError};
