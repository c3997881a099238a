//! HTML escaping for text interpolated into markup.

/// Escape text for safe interpolation into HTML.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with entity references. Used for
/// error messages and for plain-text content rendered without a parser.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
