//! URL model with the crawler's canonical form
//!
//! A `Url` is either absolute or relative. Absolute URLs always carry all five
//! components (scheme, host, port, path, query); relative URLs keep the raw
//! reference text and are resolved against a base at the crawler layer.
//! Equality and hashing use the canonical string, so two spellings of the same
//! location (default port written out, missing path) compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing or combining URLs
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("malformed URL: {0}")]
    Format(&'static str),
    #[error("unsupported URL scheme: {0}")]
    NotSupported(String),
    #[error("the base URL is not an absolute URL")]
    RelativeBase,
}

/// Default port for a supported scheme
fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// A parsed URL in canonical form
///
/// The canonical string is `scheme://host[:port]path[?query]` with the port
/// omitted when it equals the scheme default. Accessors for the structured
/// components return empty values on relative URLs.
#[derive(Debug, Clone)]
pub struct Url {
    canonical: String,
    absolute: bool,
    scheme: String,
    host: String,
    port: u16,
    path: String,
    query: String,
}

impl Url {
    /// Parse a URL string.
    ///
    /// A string without a `//` authority marker is treated as a relative
    /// reference and kept verbatim. Only `http` and `https` are supported;
    /// a missing scheme before `//` defaults to `http`.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let Some(sep) = input.find("//") else {
            return Ok(Self {
                canonical: input.to_string(),
                absolute: false,
                scheme: String::new(),
                host: String::new(),
                port: 0,
                path: String::new(),
                query: String::new(),
            });
        };

        // Everything before "//" minus the trailing ':' names the scheme.
        let scheme = if sep > 0 {
            input[..sep - 1].to_ascii_lowercase()
        } else {
            "http".to_string()
        };
        let scheme_default =
            default_port(&scheme).ok_or_else(|| UrlError::NotSupported(scheme.clone()))?;

        let host_begin = sep + 2;
        if host_begin >= input.len() {
            return Err(UrlError::Format("missing host"));
        }
        let bytes = input.as_bytes();
        let host_end = input[host_begin..]
            .find([':', '/'])
            .map(|i| i + host_begin);
        let host = input[host_begin..host_end.unwrap_or(input.len())].to_ascii_lowercase();

        // Optional explicit port, terminated by the first '/' of the path.
        let mut pos = host_end;
        let port = match pos {
            Some(i) if bytes[i] == b':' => {
                let port_begin = i + 1;
                let port_end = input[port_begin..].find('/').map(|j| j + port_begin);
                let raw = &input[port_begin..port_end.unwrap_or(input.len())];
                pos = port_end;
                raw.parse::<u16>()
                    .map_err(|_| UrlError::Format("invalid port"))?
            }
            _ => scheme_default,
        };

        let (path, query) = match pos {
            Some(path_begin) => {
                let path_end = input[path_begin..].find(['?', '#']).map(|j| j + path_begin);
                let path = input[path_begin..path_end.unwrap_or(input.len())].to_string();
                let query = match path_end {
                    Some(q) if bytes[q] == b'?' => {
                        let query_begin = q + 1;
                        let query_end = input[query_begin..]
                            .find('#')
                            .map(|j| j + query_begin)
                            .unwrap_or(input.len());
                        input[query_begin..query_end].to_string()
                    }
                    _ => String::new(),
                };
                (path, query)
            }
            None => ("/".to_string(), String::new()),
        };

        Ok(Self::assemble(scheme, host, port, path, query))
    }

    /// Combine an absolute base URL with a relative reference.
    ///
    /// A reference starting with `/` replaces the base path; any other
    /// reference is appended to it. The query comes from the reference alone.
    pub fn combine(base: &Url, relative: &str) -> Result<Self, UrlError> {
        if !base.absolute {
            return Err(UrlError::RelativeBase);
        }

        let path_end = relative.find(['?', '#']);
        let path_part = &relative[..path_end.unwrap_or(relative.len())];
        let path = if path_part.starts_with('/') {
            path_part.to_string()
        } else {
            format!("{}{}", base.path, path_part)
        };

        let query = match path_end {
            Some(q) if relative.as_bytes()[q] == b'?' => {
                let query_begin = q + 1;
                let query_end = relative[query_begin..]
                    .find('#')
                    .map(|j| j + query_begin)
                    .unwrap_or(relative.len());
                relative[query_begin..query_end].to_string()
            }
            _ => String::new(),
        };

        Ok(Self::assemble(
            base.scheme.clone(),
            base.host.clone(),
            base.port,
            path,
            query,
        ))
    }

    /// Resolve a reference against this URL: absolute references parse on
    /// their own, anything else combines with `self` as the base.
    pub fn resolve(&self, reference: &str) -> Result<Self, UrlError> {
        let parsed = Url::parse(reference)?;
        if parsed.absolute {
            Ok(parsed)
        } else {
            Url::combine(self, reference)
        }
    }

    fn assemble(scheme: String, host: String, port: u16, path: String, query: String) -> Self {
        let mut canonical = format!("{scheme}://{host}");
        if Some(port) != default_port(&scheme) {
            canonical.push(':');
            canonical.push_str(&port.to_string());
        }
        canonical.push_str(&path);
        if !query.is_empty() {
            canonical.push('?');
            canonical.push_str(&query);
        }
        Self {
            canonical,
            absolute: true,
            scheme,
            host,
            port,
            path,
            query,
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The canonical string (or the raw reference for relative URLs).
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Path and query joined by `?`, as written on the HTTP request line.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for Url {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Url {}

impl Hash for Url {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_absolute_with_query() {
        let url = Url::parse("https://www.google.com/index.html?query=test").unwrap();
        assert!(url.is_absolute());
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "www.google.com");
        assert_eq!(url.port(), 443);
        assert_eq!(url.path(), "/index.html");
        assert_eq!(url.query(), "query=test");
        assert_eq!(url.path_and_query(), "/index.html?query=test");
    }

    #[test]
    fn parse_explicit_default_port() {
        let url = Url::parse("https://www.google.com:443").unwrap();
        assert_eq!(url.port(), 443);
        assert_eq!(url.path(), "/");
        assert_eq!(url.query(), "");
        // Default port is omitted from the canonical form.
        assert_eq!(url.as_str(), "https://www.google.com/");
    }

    #[test]
    fn parse_explicit_custom_port() {
        let url = Url::parse("http://localhost:8080/healthz").unwrap();
        assert_eq!(url.port(), 8080);
        assert_eq!(url.as_str(), "http://localhost:8080/healthz");
    }

    #[test]
    fn parse_scheme_relative_defaults_to_http() {
        let url = Url::parse("//www.cnn.com/business").unwrap();
        assert!(url.is_absolute());
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host(), "www.cnn.com");
        assert_eq!(url.port(), 80);
        assert_eq!(url.path(), "/business");
    }

    #[test]
    fn parse_relative() {
        for raw in ["/index.html", "index.html", "a/b/c.html"] {
            let url = Url::parse(raw).unwrap();
            assert!(!url.is_absolute());
            assert_eq!(url.as_str(), raw);
        }
    }

    #[test]
    fn parse_lowercases_scheme_and_host() {
        let url = Url::parse("HTTPS://WWW.Example.COM/Path").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "www.example.com");
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn parse_discards_fragment() {
        let url = Url::parse("http://example.com/page?x=1#section").unwrap();
        assert_eq!(url.query(), "x=1");
        assert_eq!(url.as_str(), "http://example.com/page?x=1");
    }

    #[test]
    fn parse_rejects_unsupported_scheme() {
        assert!(matches!(
            Url::parse("ftp://example.com/file"),
            Err(UrlError::NotSupported(_))
        ));
        assert!(matches!(
            Url::parse("mailto://nobody"),
            Err(UrlError::NotSupported(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_port() {
        assert!(matches!(
            Url::parse("http://example.com:notaport/"),
            Err(UrlError::Format(_))
        ));
    }

    #[test]
    fn canonical_round_trip() {
        for raw in [
            "https://www.google.com/index.html?query=test",
            "http://example.com:8080/a/b?x=1",
            "http://example.com/",
        ] {
            let url = Url::parse(raw).unwrap();
            let reparsed = Url::parse(url.as_str()).unwrap();
            assert_eq!(url, reparsed);
            assert_eq!(url.as_str(), reparsed.as_str());
        }
    }

    #[test]
    fn combine_variants() {
        let cases = [
            (
                "https://www.google.com",
                "index.html",
                "https://www.google.com/index.html",
            ),
            (
                "https://www.google.com",
                "/index.html",
                "https://www.google.com/index.html",
            ),
            (
                "https://www.google.com/?query=test",
                "index.html",
                "https://www.google.com/index.html",
            ),
            (
                "https://www.google.com/US/",
                "/index.html?query=test",
                "https://www.google.com/index.html?query=test",
            ),
            (
                "https://www.google.com/about/",
                "index.html",
                "https://www.google.com/about/index.html",
            ),
        ];
        for (base, relative, expected) in cases {
            let base = Url::parse(base).unwrap();
            let combined = Url::combine(&base, relative).unwrap();
            assert_eq!(combined.as_str(), expected);
        }
    }

    #[test]
    fn combine_requires_absolute_base() {
        let base = Url::parse("relative/path").unwrap();
        assert!(matches!(
            Url::combine(&base, "index.html"),
            Err(UrlError::RelativeBase)
        ));
    }

    #[test]
    fn resolve_prefers_absolute_reference() {
        let base = Url::parse("https://example.com/dir/").unwrap();
        let absolute = base.resolve("http://other.org/x").unwrap();
        assert_eq!(absolute.as_str(), "http://other.org/x");
        let relative = base.resolve("page.html").unwrap();
        assert_eq!(relative.as_str(), "https://example.com/dir/page.html");
    }

    #[test]
    fn equality_uses_canonical_form() {
        let a = Url::parse("https://example.com:443/x").unwrap();
        let b = Url::parse("https://example.com/x").unwrap();
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
