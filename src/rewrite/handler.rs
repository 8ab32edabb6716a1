//! Handler composition for the cookie rewriter.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Request;

use crate::config::schema::ProxyCookieConfig;
use crate::rewrite::cookies::CookieRewriter;
use crate::rewrite::rules::RuleError;
use crate::rewrite::writer::{InterceptingWriter, ResponseWriter};

/// Something that answers a request by writing to a [`ResponseWriter`].
pub trait Handler {
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &Request<Bytes>);
}

impl<F> Handler for F
where
    F: Fn(&mut dyn ResponseWriter, &Request<Bytes>),
{
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &Request<Bytes>) {
        self(writer, request)
    }
}

/// Wraps an inner handler (or tower service) and rewrites the `Path` and
/// `Domain` of every `Set-Cookie` header it produces.
///
/// As a [`Handler`] the rewrite happens when the inner handler commits its
/// status. As a [`tower::Service`] it happens when the inner service's
/// response is ready, before it is handed back up the stack.
#[derive(Debug, Clone)]
pub struct ProxyCookie<S> {
    pub(super) inner: S,
    pub(super) rewriter: Arc<CookieRewriter>,
    pub(super) name: Arc<str>,
}

impl<S> ProxyCookie<S> {
    /// Compile `config` and wrap `inner`.
    ///
    /// Fails if any configured regex does not compile; no instance is built
    /// in that case.
    pub fn new(inner: S, config: &ProxyCookieConfig, name: impl Into<String>) -> Result<Self, RuleError> {
        let name: Arc<str> = Arc::from(name.into());
        let rewriter = CookieRewriter::new(config)?;

        tracing::info!(
            instance = %name,
            path_prefix = %config.path.prefix,
            path_rewrites = rewriter.path_rules().len(),
            domain_rewrites = rewriter.domain_rules().len(),
            "Cookie rewriting enabled"
        );

        Ok(Self {
            inner,
            rewriter: Arc::new(rewriter),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<H: Handler> Handler for ProxyCookie<H> {
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &Request<Bytes>) {
        let mut writer = InterceptingWriter::new(writer, &self.rewriter);
        self.inner.serve(&mut writer, request);
        writer.finish();
    }
}
