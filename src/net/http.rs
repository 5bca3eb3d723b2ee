//! Blocking HTTP/1.1 client for the fetch engine
//!
//! One TCP connection per request (`Connection: close`), TLS via native-tls
//! when the scheme is https. The client follows 302/307 internally up to five
//! hops; 301/308 are returned to the caller so the crawler can re-route the
//! permanent location through the shard layer.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::url::{Url, UrlError};

/// Maximum internal 302/307 hops per request
const MAX_REDIRECTS: usize = 5;

/// Errors raised at the HTTP boundary
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("a network error occurred: {0}")]
    Network(String),
    #[error("the request times out")]
    Timeout,
    #[error("the HTTP response message is malformed: {0}")]
    Format(&'static str),
    #[error("failed with status code {0}")]
    Status(u16),
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("disallowed by robots.txt")]
    RobotsDisallowed,
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Headers sent with every request
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    pub accept: Option<String>,
    pub accept_encoding: Option<String>,
    pub accept_language: Option<String>,
    pub connection: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for RequestHeaders {
    fn default() -> Self {
        Self {
            accept: Some("text/html".to_string()),
            accept_encoding: Some("identity".to_string()),
            accept_language: Some("en".to_string()),
            connection: Some("close".to_string()),
            user_agent: Some(crate::config::DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// A parsed response: status line, the retained headers, and the body
///
/// Only `Content-Language`, `Content-Type`, and `Location` survive header
/// parsing; the crawler has no use for anything else.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub content_language: Option<String>,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: String,
}

/// Blocking HTTP client
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub headers: RequestHeaders,
    pub timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            headers: RequestHeaders::default(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// GET a URL, following temporary redirects internally.
    ///
    /// Returns responses with status 200, 301, or 308; every other status
    /// maps to [`HttpError::Status`].
    pub fn get(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        let mut current = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let response = self.send(&current)?;

            // 302/307 stay inside the client; the caller never sees them.
            if response.status == 302 || response.status == 307 {
                let location = response
                    .location
                    .as_deref()
                    .ok_or(HttpError::Format("redirect without Location"))?;
                current = current.resolve(location)?;
                continue;
            }

            if response.status != 200 && response.status != 301 && response.status != 308 {
                return Err(HttpError::Status(response.status));
            }
            return Ok(response);
        }

        Err(HttpError::TooManyRedirects)
    }

    /// One request/response exchange on a fresh connection.
    fn send(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        let start = Instant::now();
        let request = self.format_request(url);

        let address = (url.host(), url.port())
            .to_socket_addrs()
            .map_err(|e| HttpError::Network(e.to_string()))?
            .next()
            .ok_or_else(|| HttpError::Network(format!("cannot resolve {}", url.host())))?;
        let mut stream = TcpStream::connect_timeout(&address, self.timeout)
            .map_err(|e| HttpError::Network(e.to_string()))?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| HttpError::Network(e.to_string()))?;

        let raw = if url.scheme() == "https" {
            let connector = native_tls::TlsConnector::new()
                .map_err(|e| HttpError::Network(e.to_string()))?;
            let mut tls = connector
                .connect(url.host(), stream)
                .map_err(|e| HttpError::Network(e.to_string()))?;
            tls.write_all(request.as_bytes())
                .map_err(|e| HttpError::Network(e.to_string()))?;
            read_to_end(&mut tls, start, self.timeout)?
        } else {
            stream
                .write_all(request.as_bytes())
                .map_err(|e| HttpError::Network(e.to_string()))?;
            read_to_end(&mut stream, start, self.timeout)?
        };

        parse_response(&String::from_utf8_lossy(&raw))
    }

    fn format_request(&self, url: &Url) -> String {
        let mut request = format!("GET {} HTTP/1.1\r\n", url.path_and_query());
        let header = |out: &mut String, name: &str, value: &Option<String>| {
            if let Some(value) = value {
                out.push_str(name);
                out.push_str(": ");
                out.push_str(value);
                out.push_str("\r\n");
            }
        };
        header(&mut request, "Accept", &self.headers.accept);
        header(&mut request, "Accept-Encoding", &self.headers.accept_encoding);
        header(&mut request, "Accept-Language", &self.headers.accept_language);
        header(&mut request, "Connection", &self.headers.connection);
        request.push_str("Host: ");
        request.push_str(url.host());
        request.push_str("\r\n");
        header(&mut request, "User-Agent", &self.headers.user_agent);
        request.push_str("\r\n");
        request
    }
}

/// Read until the peer closes or the cumulative elapsed time exceeds the
/// timeout. A zero-length read and an `UnexpectedEof` both count as clean
/// end-of-stream (TLS peers often drop the connection without a close_notify).
fn read_to_end<R: Read>(
    reader: &mut R,
    start: Instant,
    timeout: Duration,
) -> Result<Vec<u8>, HttpError> {
    let mut response = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if start.elapsed() > timeout {
                    return Err(HttpError::Timeout);
                }
                response.extend_from_slice(&buffer[..n]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Err(HttpError::Timeout)
            }
            Err(e) => return Err(HttpError::Network(e.to_string())),
        }
    }
    Ok(response)
}

/// Parse a raw response: status line, headers until the blank line, body.
fn parse_response(raw: &str) -> Result<HttpResponse, HttpError> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or(HttpError::Format("missing header terminator"))?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let rest = status_line
        .strip_prefix("HTTP/")
        .ok_or(HttpError::Format("missing status line"))?;
    let (version, rest) = rest
        .split_once(' ')
        .ok_or(HttpError::Format("missing status code"))?;
    let (status, reason) = match rest.split_once(' ') {
        Some((code, reason)) => (code, reason),
        None => (rest, ""),
    };
    let status: u16 = status
        .parse()
        .map_err(|_| HttpError::Format("invalid status code"))?;

    let mut response = HttpResponse {
        version: version.to_string(),
        status,
        reason: reason.to_string(),
        body: body.to_string(),
        ..Default::default()
    };

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "content-language" => response.content_language = Some(value.to_string()),
            "content-type" => match &mut response.content_type {
                // Repeated headers fold into one comma-separated value.
                Some(existing) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                None => response.content_type = Some(value.to_string()),
            },
            "location" => response.location = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(response)
}
