//! HTTP content resolver.
//!
//! A minimal async HTTP/1.1 GET client over [`tokio::net::TcpStream`],
//! resolving content paths against a base URL. Plain HTTP only: an
//! `https` base or redirect is reported as an error instead of being
//! fetched without verification.

use std::time::Duration;

use async_trait::async_trait;
use parchment_core::{ParchmentError, Resolver, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::url::Url;

/// Maximum response body size (8 MB).
const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: u8 = 5;

/// TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-response read timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolver fetching content over plain HTTP.
///
/// Content paths are resolved against the base URL the way links resolve
/// in a browser, so a base of `http://host/docs/` turns `intro.md` into
/// `http://host/docs/intro.md` and follows `..` segments upward.
pub struct HttpResolver {
    base: Url,
}

impl HttpResolver {
    /// Create a resolver fetching relative to `base`.
    ///
    /// The base must be an absolute plain-`http` URL. End it with `/` so
    /// sibling paths resolve into the same directory.
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .ok_or_else(|| ParchmentError::Config(format!("invalid base URL: {base}")))?;
        if base.scheme != "http" {
            return Err(ParchmentError::Config(format!(
                "unsupported scheme '{}': only plain http is available",
                base.scheme,
            )));
        }
        Ok(Self { base })
    }

    /// Fetch a path, following redirects up to [`MAX_REDIRECTS`] hops.
    async fn fetch(&self, path: &str) -> Result<Response> {
        let mut url = self.base.resolve(path).ok_or_else(|| {
            ParchmentError::Resolve(format!("cannot resolve {path} against {}", self.base))
        })?;

        for _ in 0..MAX_REDIRECTS {
            if url.scheme != "http" {
                return Err(ParchmentError::Resolve(format!(
                    "refusing {url}: only plain http is available",
                )));
            }

            let resp = request(&url).await?;

            if is_redirect(resp.status)
                && let Some(location) = header(&resp.headers, "location")
            {
                let location = location.to_string();
                url = url.resolve(&location).ok_or_else(|| {
                    ParchmentError::Resolve(format!("bad redirect location: {location}"))
                })?;
                log::debug!("following redirect to {url}");
                continue;
            }

            return Ok(resp);
        }

        Err(ParchmentError::Resolve(format!(
            "too many redirects for {path}",
        )))
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, path: &str) -> Result<String> {
        let resp = self.fetch(path).await?;
        if !(200..300).contains(&resp.status) {
            return Err(ParchmentError::Resolve(format!(
                "failed to load {path}: HTTP {}",
                resp.status,
            )));
        }
        Ok(String::from_utf8_lossy(&resp.body).into_owned())
    }
}

// -------------------------------------------------------------------
// Wire internals
// -------------------------------------------------------------------

/// A parsed HTTP response.
#[derive(Debug)]
struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Connect, send GET, read to EOF, parse.
async fn request(url: &Url) -> Result<Response> {
    let addr = format!("{}:{}", url.host, url.port.unwrap_or(80));
    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
        .await
        .map_err(|_| ParchmentError::Resolve(format!("connect timed out: {addr}")))??;

    stream.write_all(request_text(url).as_bytes()).await?;

    let raw = timeout(READ_TIMEOUT, read_capped(&mut stream))
        .await
        .map_err(|_| ParchmentError::Resolve(format!("read timed out: {url}")))??;
    parse_response(&raw)
}

/// Format the GET request. `Connection: close` makes end-of-body
/// detection work even without a Content-Length.
fn request_text(url: &Url) -> String {
    let host_header = match url.port {
        Some(p) if p != 80 => format!("{}:{p}", url.host),
        _ => url.host.clone(),
    };

    let path = match url.query {
        Some(ref q) => format!("{}?{q}", url.path),
        None => url.path.clone(),
    };

    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host_header}\r\n\
         User-Agent: parchment/{}\r\n\
         Accept: text/markdown, text/plain, */*\r\n\
         Connection: close\r\n\
         \r\n",
        parchment_core::VERSION,
    )
}

/// Read the whole response, enforcing the body size cap with headroom
/// for the header block.
async fn read_capped(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if buf.len() + n > MAX_BODY_SIZE + 4096 {
            return Err(ParchmentError::Resolve("response too large".to_string()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf)
}

/// Parse raw bytes into status, headers, and decoded body.
fn parse_response(data: &[u8]) -> Result<Response> {
    let header_end = find_subsequence(data, b"\r\n\r\n").ok_or_else(|| {
        ParchmentError::Resolve("malformed response: no header terminator".to_string())
    })?;

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| ParchmentError::Resolve("malformed response: non-UTF-8 headers".to_string()))?;
    let mut lines = header_text.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| ParchmentError::Resolve("empty response".to_string()))?;
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let raw_body = &data[header_end + 4..];
    let body = if header(&headers, "transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        decode_chunked(raw_body)?
    } else if let Some(cl) = header(&headers, "content-length") {
        let len: usize = cl
            .parse()
            .map_err(|_| ParchmentError::Resolve("bad Content-Length".to_string()))?;
        if len > MAX_BODY_SIZE {
            return Err(ParchmentError::Resolve("body exceeds size limit".to_string()));
        }
        raw_body[..raw_body.len().min(len)].to_vec()
    } else {
        raw_body.to_vec()
    };

    if body.len() > MAX_BODY_SIZE {
        return Err(ParchmentError::Resolve("body exceeds size limit".to_string()));
    }

    Ok(Response {
        status,
        headers,
        body,
    })
}

/// Status line: "HTTP/1.x NNN reason".
fn parse_status_line(line: &str) -> Result<u16> {
    line.splitn(3, ' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| ParchmentError::Resolve(format!("bad status line: {line}")))
}

/// Case-insensitive header lookup.
fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    let name = name.to_ascii_lowercase();
    headers
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.as_str())
}

/// Decode a chunked transfer-encoded body. A truncated final chunk is
/// kept rather than rejected.
fn decode_chunked(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(i) = find_subsequence(&data[pos..], b"\r\n") {
        let size_text = std::str::from_utf8(&data[pos..pos + i])
            .map_err(|_| ParchmentError::Resolve("bad chunk size".to_string()))?;
        // Chunk extensions after `;` are ignored.
        let size_text = size_text.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| ParchmentError::Resolve("bad chunk size".to_string()))?;
        if size == 0 {
            break;
        }

        let start = pos + i + 2;
        let end = start + size;
        if end > data.len() {
            out.extend_from_slice(&data[start..]);
            break;
        }
        if out.len() + size > MAX_BODY_SIZE {
            return Err(ParchmentError::Resolve("body exceeds size limit".to_string()));
        }
        out.extend_from_slice(&data[start..end]);
        // Step over the chunk's trailing CRLF; clamped so a body ending
        // flush with a chunk stays in range.
        pos = (end + 2).min(data.len());
    }

    Ok(out)
}

/// Whether a status code is a redirect worth following.
fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 307 | 308)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
