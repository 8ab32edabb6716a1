//! Response writers.
//!
//! [`ResponseWriter`] is the imperative response sink a [`Handler`] writes
//! to: live header access, body writes, and a one-shot status commit.
//! [`InterceptingWriter`] decorates any writer so that `Set-Cookie` headers
//! are rewritten at the moment the status is committed.
//!
//! [`Handler`]: crate::rewrite::Handler

use std::io;

use axum::body::Bytes;
use axum::http::{HeaderMap, Response, StatusCode};

use crate::rewrite::cookies::CookieRewriter;

/// An imperative HTTP response sink.
pub trait ResponseWriter {
    /// The live header map. Changes made after [`write_head`] are not sent.
    ///
    /// [`write_head`]: ResponseWriter::write_head
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Write body bytes. Commits `200 OK` first if no status was written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Commit the status code and freeze the headers.
    fn write_head(&mut self, status: StatusCode);
}

/// Decorator that rewrites `Set-Cookie` headers when the status is committed.
pub struct InterceptingWriter<'w, W: ResponseWriter + ?Sized> {
    inner: &'w mut W,
    rewriter: &'w CookieRewriter,
    committed: bool,
}

impl<'w, W: ResponseWriter + ?Sized> InterceptingWriter<'w, W> {
    pub fn new(inner: &'w mut W, rewriter: &'w CookieRewriter) -> Self {
        Self {
            inner,
            rewriter,
            committed: false,
        }
    }

    /// Whether the status (and with it the rewrite) has gone through this writer.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Commit `200 OK` if the handler returned without writing anything.
    pub fn finish(mut self) {
        if !self.committed {
            self.write_head(StatusCode::OK);
        }
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for InterceptingWriter<'_, W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The implicit commit must run through us, not through the sink.
        if !self.committed {
            self.write_head(StatusCode::OK);
        }
        self.inner.write(buf)
    }

    fn write_head(&mut self, status: StatusCode) {
        if !self.committed {
            self.committed = true;
            self.rewriter.rewrite_headers(self.inner.headers_mut());
        }
        self.inner.write_head(status);
    }
}

/// In-memory [`ResponseWriter`] that records what a handler produced.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    status: Option<StatusCode>,
    sent_headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Headers as they were at commit time, or the live map before commit.
    pub fn headers(&self) -> &HeaderMap {
        if self.status.is_some() {
            &self.sent_headers
        } else {
            &self.headers
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Build the final response. An uncommitted recorder commits `200 OK`.
    pub fn into_response(mut self) -> Response<Bytes> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }

        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status.unwrap_or_default();
        *response.headers_mut() = self.sent_headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_head(&mut self, status: StatusCode) {
        if let Some(current) = self.status {
            tracing::warn!(current = %current, ignored = %status, "Superfluous write_head call");
            return;
        }
        self.status = Some(status);
        self.sent_headers = self.headers.clone();
    }
}
