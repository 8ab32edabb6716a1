//! `Set-Cookie` rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Setup:
//!     ProxyCookieConfig (path.prefix, path.rewrites, domain.rewrites)
//!     → rules.rs (compile regexes into ordered RuleSets)
//!     → cookies.rs (CookieRewriter, shared via Arc)
//!
//! Per response:
//!     inner handler / service writes headers
//!     → status commit (writer.rs) or response ready (layer.rs)
//!     → parse Set-Cookie lines, drop them from the header map
//!     → prefix path, run path rules, run domain rules
//!     → re-serialize and append in original order
//!     → response continues to the client
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Only `Set-Cookie` is read or modified; all other headers pass through
//! - Unparsable `Set-Cookie` lines are dropped, never fail the response
//! - A missing `Path`/`Domain` is rewritten as the empty string; an empty
//!   result leaves the attribute absent

pub mod cookies;
pub mod handler;
pub mod layer;
pub mod rules;
pub mod writer;

pub use cookies::CookieRewriter;
pub use handler::{Handler, ProxyCookie};
pub use layer::ProxyCookieLayer;
pub use rules::{RuleError, RuleSet};
pub use writer::{InterceptingWriter, ResponseRecorder, ResponseWriter};
