//! Markdown-to-HTML parsing for Parchment sessions.
//!
//! [`MarkdownParser`] implements [`parchment_core::Parser`] on top of
//! `pulldown-cmark`, with the extensions document sites lean on: tables,
//! strikethrough, task lists, and footnotes. Inline HTML in the source
//! passes through untouched, so documents keep working scripts and
//! embeds when the session opts into them.

use parchment_core::{Parser, Result};
use pulldown_cmark::{Options, Parser as MarkdownEvents, html};

/// CommonMark parser with table, strikethrough, task-list, and footnote
/// support.
///
/// ```
/// use parchment_core::Parser;
/// use parchment_markdown::MarkdownParser;
///
/// let html = MarkdownParser.parse("# Hello").unwrap();
/// assert_eq!(html, "<h1>Hello</h1>\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl Parser for MarkdownParser {
    fn parse(&self, text: &str) -> Result<String> {
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        opts.insert(Options::ENABLE_TASKLISTS);
        opts.insert(Options::ENABLE_FOOTNOTES);

        let events = MarkdownEvents::new_ext(text, opts);
        let mut out = String::new();
        html::push_html(&mut out, events);
        Ok(out)
    }
}
