//! Content parsing.

use crate::Result;
use crate::escape::escape_html;

/// Turns raw resolved content into an HTML fragment for the target element.
///
/// Parsing is synchronous; content has already been fetched by the time a
/// parser runs. The stock markdown parser lives in `parchment-markdown`;
/// [`PlainTextParser`] is the built-in fallback used when no parser is
/// configured.
pub trait Parser: Send + Sync {
    /// Convert raw content to an HTML fragment.
    fn parse(&self, text: &str) -> Result<String>;
}

/// Fallback parser: escapes the content and wraps it in `<pre>`.
///
/// Warns on every use; it stands in for a real converter, it does not
/// replace one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl Parser for PlainTextParser {
    fn parse(&self, text: &str) -> Result<String> {
        log::warn!("no markdown parser installed, rendering raw text");
        Ok(format!("<pre>{}</pre>", escape_html(text)))
    }
}
