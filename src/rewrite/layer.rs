//! Tower integration for [`ProxyCookie`].

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::config::schema::ProxyCookieConfig;
use crate::rewrite::cookies::CookieRewriter;
use crate::rewrite::handler::ProxyCookie;
use crate::rewrite::rules::RuleError;

/// Layer that applies [`ProxyCookie`] to a service.
///
/// The rules are compiled once in [`ProxyCookieLayer::new`]; every wrapped
/// service shares them.
#[derive(Debug, Clone)]
pub struct ProxyCookieLayer {
    rewriter: Arc<CookieRewriter>,
    name: Arc<str>,
}

impl ProxyCookieLayer {
    pub fn new(config: &ProxyCookieConfig, name: impl Into<String>) -> Result<Self, RuleError> {
        let ProxyCookie { rewriter, name, .. } = ProxyCookie::new((), config, name)?;
        Ok(Self { rewriter, name })
    }
}

impl<S> Layer<S> for ProxyCookieLayer {
    type Service = ProxyCookie<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProxyCookie {
            inner,
            rewriter: self.rewriter.clone(),
            name: self.name.clone(),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ProxyCookie<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let rewriter = self.rewriter.clone();
        let name = self.name.clone();
        let response = self.inner.call(request);

        Box::pin(async move {
            let mut response = response.await?;
            let rewritten = rewriter.rewrite_headers(response.headers_mut());
            if rewritten > 0 {
                tracing::debug!(instance = %name, cookies = rewritten, "Rewrote Set-Cookie headers");
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Rewrite;
    use axum::body::Body;
    use axum::http::header::SET_COOKIE;
    use axum::http::{HeaderValue, StatusCode};
    use std::convert::Infallible;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    fn upstream(
        set_cookies: &'static [&'static str],
    ) -> impl Service<Request<Body>, Response = Response<Body>, Error = Infallible, Future: Send + 'static> + Clone {
        service_fn(move |_req: Request<Body>| async move {
            let mut response = Response::builder()
                .status(StatusCode::OK)
                .header("x-custom", "Path=/; Domain=foo.com")
                .body(Body::from("upstream body"))
                .unwrap();
            for line in set_cookies {
                response
                    .headers_mut()
                    .append(SET_COOKIE, HeaderValue::from_static(*line));
            }
            Ok::<_, Infallible>(response)
        })
    }

    fn config() -> ProxyCookieConfig {
        let mut config = ProxyCookieConfig::default();
        config.path.prefix = "foo".to_string();
        config.domain.rewrites = vec![Rewrite::new("^subdomain.foo.(.+)$", "foo.$1")];
        config
    }

    #[tokio::test]
    async fn test_layer_rewrites_response_cookies() {
        let layer = ProxyCookieLayer::new(&config(), "proxyCookie").unwrap();
        let service = ServiceBuilder::new()
            .layer(layer)
            .service(upstream(&[
                "a=1; Path=/; Domain=subdomain.foo.bar",
                "b=2; Path=/bar",
            ]));

        let response = service
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cookies,
            vec!["a=1; Path=/foo; Domain=foo.bar", "b=2; Path=/foo/bar"]
        );
        assert_eq!(
            response.headers().get("x-custom").unwrap(),
            "Path=/; Domain=foo.com"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"upstream body");
    }

    #[tokio::test]
    async fn test_layer_without_cookies() {
        let layer = ProxyCookieLayer::new(&config(), "proxyCookie").unwrap();
        let response = layer
            .layer(upstream(&[]))
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(response.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_service_new_matches_layer() {
        let direct = ProxyCookie::new(upstream(&["a=1"]), &config(), "direct").unwrap();
        assert_eq!(direct.name(), "direct");

        let response = direct
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.headers().get(SET_COOKIE).unwrap(), "a=1; Path=/foo");
    }

    #[test]
    fn test_layer_rejects_invalid_regex() {
        let mut config = config();
        config.path.rewrites = vec![Rewrite::new("(", "x")];

        let err = ProxyCookieLayer::new(&config, "proxyCookie").unwrap_err();
        assert!(matches!(err, RuleError::InvalidRegex { ref pattern, .. } if pattern == "("));
    }
}
