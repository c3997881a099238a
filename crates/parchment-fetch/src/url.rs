//! Minimal URL handling for the HTTP resolver.
//!
//! Covers exactly what fetching content needs: parsing absolute
//! `http`/`https` URLs, resolving references against a base (absolute,
//! root-relative, and relative with `.`/`..` segments), and printing.
//! Fragments are dropped on parse; they never reach the wire.

use std::fmt;

/// A parsed absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// Lowercased scheme (`http`, `https`).
    pub scheme: String,
    /// Host name or address.
    pub host: String,
    /// Explicit port, if the URL carries one.
    pub port: Option<u16>,
    /// Absolute path, always starting with `/`.
    pub path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
}

impl Url {
    /// Parse an absolute URL. Returns `None` when the input has no
    /// scheme, no host, or an unparseable port.
    pub fn parse(input: &str) -> Option<Url> {
        let input = input.split('#').next().unwrap_or(input);
        let (scheme, rest) = input.split_once("://")?;
        if scheme.is_empty() {
            return None;
        }

        let (authority, path_and_query) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.split_once(':') {
            Some((h, p)) => (h, Some(p.parse::<u16>().ok()?)),
            None => (authority, None),
        };
        if host.is_empty() {
            return None;
        }

        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (path_and_query, None),
        };

        Some(Url {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            query,
        })
    }

    /// Resolve a reference against this URL.
    ///
    /// Absolute references replace the URL entirely, root-relative ones
    /// keep the origin, and plain relative ones are joined onto the
    /// directory of the current path with `.` and `..` collapsed.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        if reference.contains("://") {
            return Url::parse(reference);
        }

        let reference = reference.split('#').next().unwrap_or(reference);
        let (ref_path, query) = match reference.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (reference, None),
        };

        let joined = if ref_path.starts_with('/') {
            ref_path.to_string()
        } else if ref_path.is_empty() {
            // Query-only reference keeps the current path.
            self.path.clone()
        } else {
            let dir = match self.path.rfind('/') {
                Some(i) => &self.path[..=i],
                None => "/",
            };
            format!("{dir}{ref_path}")
        };

        Some(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path: collapse_dots(&joined),
            query,
        })
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(ref query) = self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Collapse `.` and `..` segments in an absolute path. `..` at the root
/// is clamped rather than rejected, as servers do.
fn collapse_dots(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(path.len());
    out.push('/');
    out.push_str(&segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        out.push('/');
    }
    out
}
