//! `Set-Cookie` extraction and path/domain rewriting.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use cookie::Cookie;

use crate::config::schema::ProxyCookieConfig;
use crate::rewrite::rules::{RuleError, RuleSet};

/// Compiled cookie rewrite configuration.
///
/// Built once from [`ProxyCookieConfig`] and shared read-only by every request.
#[derive(Debug, Clone, Default)]
pub struct CookieRewriter {
    path_prefix: String,
    path_rules: RuleSet,
    domain_rules: RuleSet,
}

impl CookieRewriter {
    /// Compile the path and domain rule lists.
    pub fn new(config: &ProxyCookieConfig) -> Result<Self, RuleError> {
        let domain_rules = RuleSet::compile(&config.domain.rewrites)?;
        let path_rules = RuleSet::compile(&config.path.rewrites)?;

        Ok(Self {
            path_prefix: config.path.prefix.clone(),
            path_rules,
            domain_rules,
        })
    }

    /// True when neither the path nor the domain would ever change.
    pub fn is_noop(&self) -> bool {
        !self.rewrites_path() && self.domain_rules.is_empty()
    }

    fn rewrites_path(&self) -> bool {
        !self.path_prefix.is_empty() || !self.path_rules.is_empty()
    }

    pub fn path_rules(&self) -> &RuleSet {
        &self.path_rules
    }

    pub fn domain_rules(&self) -> &RuleSet {
        &self.domain_rules
    }

    /// Rewrite a path value: prefix first, then the path rule chain.
    ///
    /// An absent path is passed in as `""`.
    pub fn rewrite_path(&self, path: &str) -> String {
        let mut path = if self.path_prefix.is_empty() {
            path.to_owned()
        } else {
            prefix_path(path, &self.path_prefix)
        };

        if !self.path_rules.is_empty() {
            path = self.path_rules.apply(&path);
        }
        path
    }

    /// Rewrite a domain value through the domain rule chain.
    pub fn rewrite_domain(&self, domain: &str) -> String {
        self.domain_rules.apply(domain)
    }

    /// Rewrite the `Path` and `Domain` attributes of one cookie in place.
    ///
    /// A missing attribute is rewritten as the empty string. An empty result
    /// leaves (or makes) the attribute absent.
    pub fn rewrite_cookie(&self, cookie: &mut Cookie<'_>) {
        if self.rewrites_path() {
            let path = self.rewrite_path(cookie.path().unwrap_or_default());
            if path.is_empty() {
                cookie.unset_path();
            } else {
                cookie.set_path(path);
            }
        }

        if !self.domain_rules.is_empty() {
            let domain = self.rewrite_domain(cookie.domain().unwrap_or_default());
            if domain.is_empty() {
                cookie.unset_domain();
            } else {
                cookie.set_domain(domain);
            }
        }
    }

    /// Replace every `Set-Cookie` line in `headers` with its rewritten form.
    ///
    /// Lines that do not parse as cookies are dropped. Other headers are not
    /// touched. Returns the number of cookies written back.
    pub fn rewrite_headers(&self, headers: &mut HeaderMap) -> usize {
        if self.is_noop() || !headers.contains_key(SET_COOKIE) {
            return 0;
        }

        let cookies = parse_set_cookies(headers);
        headers.remove(SET_COOKIE);

        let mut written = 0;
        for mut cookie in cookies {
            let (old_path, old_domain) = (
                cookie.path().map(str::to_owned),
                cookie.domain().map(str::to_owned),
            );
            self.rewrite_cookie(&mut cookie);

            tracing::trace!(
                cookie = %cookie.name(),
                old_path = ?old_path,
                new_path = ?cookie.path(),
                old_domain = ?old_domain,
                new_domain = ?cookie.domain(),
                "Rewrote cookie"
            );

            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                    written += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        cookie = %cookie.name(),
                        error = %e,
                        "Rewritten cookie is not a valid header value, dropping it"
                    );
                }
            }
        }
        written
    }
}

/// Prepend `/prefix` to a cookie path. A root path becomes `/prefix` rather
/// than `/prefix/`.
pub fn prefix_path(path: &str, prefix: &str) -> String {
    if path == "/" {
        return format!("/{}", prefix);
    }
    format!("/{}{}", prefix, path)
}

/// Parse every `Set-Cookie` line, in order, skipping lines that fail to parse.
///
/// A cookie without `Secure` is pinned to `secure = false` so that
/// serializing it never adds the flag (the `cookie` crate appends `Secure`
/// to `SameSite=None` and `Partitioned` cookies when the flag is unset).
pub fn parse_set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let line = match value.to_str() {
                Ok(line) => line,
                Err(_) => {
                    tracing::debug!("Dropping non-UTF-8 Set-Cookie line");
                    return None;
                }
            };
            match Cookie::parse(line.to_owned()) {
                Ok(mut cookie) => {
                    if cookie.secure().is_none() {
                        cookie.set_secure(false);
                    }
                    Some(cookie)
                }
                Err(e) => {
                    tracing::debug!(line = %line, error = %e, "Dropping unparsable Set-Cookie line");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Rewrite;

    fn rewriter(prefix: &str, path: Vec<Rewrite>, domain: Vec<Rewrite>) -> CookieRewriter {
        let mut config = ProxyCookieConfig::default();
        config.path.prefix = prefix.to_string();
        config.path.rewrites = path;
        config.domain.rewrites = domain;
        CookieRewriter::new(&config).unwrap()
    }

    fn headers(set_cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for line in set_cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(line).unwrap());
        }
        headers.insert("x-upstream", HeaderValue::from_static("Path=/"));
        headers
    }

    fn set_cookies(headers: &HeaderMap) -> Vec<&str> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[test]
    fn test_prefix_path() {
        assert_eq!(prefix_path("/", "foo"), "/foo");
        assert_eq!(prefix_path("/bar", "foo"), "/foo/bar");
        assert_eq!(prefix_path("", "foo"), "/foo");
    }

    #[test]
    fn test_prefix_then_rules() {
        let rewriter = rewriter("foo", vec![Rewrite::new("^/foo/bar", "/foo/baz")], vec![]);
        assert_eq!(rewriter.rewrite_path("/bar/x"), "/foo/baz/x");
    }

    #[test]
    fn test_noop_leaves_headers_untouched() {
        let rewriter = rewriter("", vec![], vec![]);
        assert!(rewriter.is_noop());

        let mut map = headers(&["a=1; Path=/", "not a cookie"]);
        let before = map.clone();
        assert_eq!(rewriter.rewrite_headers(&mut map), 0);
        assert_eq!(map, before);
    }

    #[test]
    fn test_no_set_cookie_header() {
        let rewriter = rewriter("foo", vec![], vec![]);
        let mut map = headers(&[]);
        let before = map.clone();

        assert_eq!(rewriter.rewrite_headers(&mut map), 0);
        assert_eq!(map, before);
        assert!(!map.contains_key(SET_COOKIE));
    }

    #[test]
    fn test_unparsable_lines_are_dropped() {
        let rewriter = rewriter("foo", vec![], vec![]);
        let mut map = headers(&["garbage-without-equals", "a=1; Path=/"]);

        assert_eq!(rewriter.rewrite_headers(&mut map), 1);
        assert_eq!(set_cookies(&map), vec!["a=1; Path=/foo"]);
        assert_eq!(map.get("x-upstream").unwrap(), "Path=/");
    }

    #[test]
    fn test_untouched_attributes_survive() {
        let rewriter = rewriter("app", vec![], vec![Rewrite::new("internal", "public")]);
        let mut map = headers(&[
            "sid=abc123; Path=/login; Domain=internal.example.com; Max-Age=3600; Secure; HttpOnly; SameSite=Strict",
        ]);

        rewriter.rewrite_headers(&mut map);

        let lines = set_cookies(&map);
        assert_eq!(lines.len(), 1);
        let cookie = Cookie::parse(lines[0]).unwrap();
        assert_eq!(cookie.name_value(), ("sid", "abc123"));
        assert_eq!(cookie.path(), Some("/app/login"));
        assert_eq!(cookie.domain(), Some("public.example.com"));
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(3600));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Strict));
    }

    #[test]
    fn test_rule_emptying_path_removes_attribute() {
        let rewriter = rewriter("", vec![Rewrite::new("^/tmp$", "")], vec![]);
        let mut map = headers(&["a=1; Path=/tmp"]);

        rewriter.rewrite_headers(&mut map);
        assert_eq!(set_cookies(&map), vec!["a=1"]);
    }

    #[test]
    fn test_rule_can_add_missing_domain() {
        let rewriter = rewriter("", vec![], vec![Rewrite::new("^$", "example.com")]);
        let mut map = headers(&["a=1"]);

        rewriter.rewrite_headers(&mut map);
        assert_eq!(set_cookies(&map), vec!["a=1; Domain=example.com"]);
    }

    fn rewrite_one(rewriter: &CookieRewriter, line: &str) -> String {
        let mut map = headers(&[line]);
        assert_eq!(rewriter.rewrite_headers(&mut map), 1);
        set_cookies(&map)[0].to_string()
    }

    #[test]
    fn test_same_site_none_without_secure_stays_insecure() {
        let rewriter = rewriter("foo", vec![], vec![]);

        let line = rewrite_one(&rewriter, "a=1; Path=/; SameSite=None");
        assert!(!line.contains("Secure"), "unexpected Secure flag in {line:?}");

        let cookie = Cookie::parse(line.as_str()).unwrap();
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::None));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.path(), Some("/foo"));
    }

    #[test]
    fn test_flags_round_trip_exactly() {
        let rewriter = rewriter("foo", vec![], vec![]);
        let inputs = [
            "a=1; Path=/; SameSite=None",
            "a=1; Path=/; SameSite=None; Secure",
            "a=1; Path=/; SameSite=Lax",
            "a=1; Path=/; SameSite=Lax; HttpOnly",
            "a=1; Path=/; Secure; Partitioned",
            "a=1; Path=/; Partitioned",
            "a=1; Path=/; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
            "a=1; Path=/; HttpOnly; Secure; Max-Age=60",
        ];

        for input in inputs {
            let before = Cookie::parse(input).unwrap();
            let output = rewrite_one(&rewriter, input);
            let after = Cookie::parse(output.as_str()).unwrap();

            assert_eq!(after.path(), Some("/foo"), "{input}");
            assert_eq!(after.secure(), before.secure(), "{input} -> {output}");
            assert_eq!(after.http_only(), before.http_only(), "{input} -> {output}");
            assert_eq!(after.same_site(), before.same_site(), "{input} -> {output}");
            assert_eq!(after.partitioned(), before.partitioned(), "{input} -> {output}");
            assert_eq!(after.max_age(), before.max_age(), "{input} -> {output}");
            assert_eq!(
                after.expires_datetime(),
                before.expires_datetime(),
                "{input} -> {output}"
            );
        }
    }

    #[test]
    fn test_unknown_attributes_are_not_preserved() {
        let rewriter = rewriter("foo", vec![], vec![]);

        assert_eq!(rewrite_one(&rewriter, "a=1; Path=/; Priority=High"), "a=1; Path=/foo");
        assert_eq!(rewrite_one(&rewriter, "a=1; Path=/; Expires=garbage"), "a=1; Path=/foo");
    }
}
