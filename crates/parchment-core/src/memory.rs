//! In-memory page implementation.
//!
//! Useful for unit tests and headless embedding. The document is a flat list
//! of elements in creation order (which stands in for document order), and
//! every mutating call is recorded as a [`PageOp`] for assertion.
//!
//! Selector support is the subset the engine actually uses: `#id`, `tag`,
//! and `tag[attr$="suffix"]`. Markup handed to `set_html` is scanned with a
//! small tokenizer that lifts out `<a>` and `<script>` tags; everything else
//! stays opaque text.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::Result;
use crate::page::{ElementId, EmbeddedScript, HistoryState, Page};

/// A recorded page mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOp {
    SetHtml { el: ElementId, html: String },
    EvalScript { source: String },
    LoadScript { src: String },
    ScrollToTop,
    PushHistory { path: String, url: String },
}

impl PageOp {
    /// Short name for order assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            PageOp::SetHtml { .. } => "set_html",
            PageOp::EvalScript { .. } => "eval_script",
            PageOp::LoadScript { .. } => "load_script",
            PageOp::ScrollToTop => "scroll_to_top",
            PageOp::PushHistory { .. } => "push_history",
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    id: ElementId,
    tag: String,
    attrs: BTreeMap<String, String>,
    /// The element whose content this element lives in; `None` for
    /// elements added directly to the document.
    container: Option<ElementId>,
    /// Inner text, captured for `<script>` bodies.
    text: String,
    /// Inner HTML, stored for elements that received `set_html`.
    html: String,
    alive: bool,
}

#[derive(Debug, Default)]
struct Inner {
    elements: Vec<Element>,
    next_id: u64,
    location: String,
    pushed: Vec<(HistoryState, String)>,
    ops: Vec<PageOp>,
}

/// A fully in-memory [`Page`].
///
/// Unlike a real document, script forwarding is observable: `eval_script`
/// and `load_script` are overridden to record, so tests can assert what
/// would have run.
#[derive(Debug)]
pub struct MemoryPage {
    inner: RefCell<Inner>,
}

impl MemoryPage {
    /// An empty document at location `/`.
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner {
                location: "/".to_string(),
                next_id: 1,
                ..Inner::default()
            }),
        }
    }

    /// A document holding one empty container with the given `id`
    /// attribute, ready to be used as a render target.
    pub fn with_container(id: &str) -> Self {
        let page = Self::new();
        page.add_element("div", &[("id", id)]);
        page
    }

    /// Append an element to the document. Returns its id.
    pub fn add_element(&self, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let mut inner = self.inner.borrow_mut();
        let id = ElementId(inner.next_id);
        inner.next_id += 1;
        inner.elements.push(Element {
            id,
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            container: None,
            text: String::new(),
            html: String::new(),
            alive: true,
        });
        id
    }

    /// Set the current location without touching history.
    pub fn set_location(&self, location: &str) {
        self.inner.borrow_mut().location = location.to_string();
    }

    /// All recorded mutations, in order.
    pub fn ops(&self) -> Vec<PageOp> {
        self.inner.borrow().ops.clone()
    }

    /// Short names of all recorded mutations, for order assertions.
    pub fn op_kinds(&self) -> Vec<&'static str> {
        self.inner.borrow().ops.iter().map(PageOp::kind).collect()
    }

    /// Current inner HTML of an element, if it is live.
    pub fn html_of(&self, el: ElementId) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .find(|e| e.id == el && e.alive)
            .map(|e| e.html.clone())
    }

    /// Whether any live element's content contains the given substring.
    pub fn has_html(&self, needle: &str) -> bool {
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .any(|e| e.alive && e.html.contains(needle))
    }

    /// History entries pushed so far, as `(state path, url)` pairs.
    pub fn pushed_entries(&self) -> Vec<(String, String)> {
        let inner = self.inner.borrow();
        inner
            .pushed
            .iter()
            .map(|(state, url)| (state.path.clone(), url.clone()))
            .collect()
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for MemoryPage {
    fn query(&self, selector: &str) -> Option<ElementId> {
        let sel = parse_selector(selector)?;
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .find(|e| e.alive && sel.matches(e))
            .map(|e| e.id)
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(sel) = parse_selector(selector) else {
            return Vec::new();
        };
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .filter(|e| e.alive && sel.matches(e))
            .map(|e| e.id)
            .collect()
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(sel) = parse_selector(selector) else {
            return Vec::new();
        };
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .filter(|e| e.alive && e.container == Some(root) && sel.matches(e))
            .map(|e| e.id)
            .collect()
    }

    fn attr(&self, el: ElementId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .find(|e| e.id == el && e.alive)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    fn set_html(&self, el: ElementId, html: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.ops.push(PageOp::SetHtml {
            el,
            html: html.to_string(),
        });
        if !inner.elements.iter().any(|e| e.id == el && e.alive) {
            // Stale or unknown target: the call is recorded but changes
            // nothing, like writing into a detached element.
            return Ok(());
        }

        // Old content (including content of content) goes stale.
        let mut doomed = vec![el];
        while let Some(parent) = doomed.pop() {
            for e in inner.elements.iter_mut() {
                if e.container == Some(parent) && e.alive {
                    e.alive = false;
                    doomed.push(e.id);
                }
            }
        }

        let scanned = scan_markup(html);
        for tag in scanned {
            let id = ElementId(inner.next_id);
            inner.next_id += 1;
            inner.elements.push(Element {
                id,
                tag: tag.name,
                attrs: tag.attrs,
                container: Some(el),
                text: tag.text,
                html: String::new(),
                alive: true,
            });
        }
        if let Some(e) = inner.elements.iter_mut().find(|e| e.id == el) {
            e.html = html.to_string();
        }
        Ok(())
    }

    fn scripts_within(&self, el: ElementId) -> Vec<EmbeddedScript> {
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .filter(|e| e.alive && e.container == Some(el) && e.tag == "script")
            .map(|e| match e.attrs.get("src") {
                Some(src) if !src.is_empty() => EmbeddedScript::External(src.clone()),
                _ => EmbeddedScript::Inline(e.text.clone()),
            })
            .collect()
    }

    fn location(&self) -> String {
        self.inner.borrow().location.clone()
    }

    fn push_history(&self, state: &HistoryState, url: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.ops.push(PageOp::PushHistory {
            path: state.path.clone(),
            url: url.to_string(),
        });
        inner.pushed.push((state.clone(), url.to_string()));
        inner.location = url.to_string();
        Ok(())
    }

    fn scroll_to_top(&self) {
        self.inner.borrow_mut().ops.push(PageOp::ScrollToTop);
    }

    fn eval_script(&self, source: &str) -> Result<()> {
        self.inner.borrow_mut().ops.push(PageOp::EvalScript {
            source: source.to_string(),
        });
        Ok(())
    }

    fn load_script(&self, src: &str) -> Result<()> {
        self.inner
            .borrow_mut()
            .ops
            .push(PageOp::LoadScript { src: src.to_string() });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Selector subset
// ---------------------------------------------------------------------------

enum Selector {
    Id(String),
    Tag(String),
    TagAttrSuffix {
        tag: String,
        attr: String,
        suffix: String,
    },
}

impl Selector {
    fn matches(&self, el: &Element) -> bool {
        match self {
            Selector::Id(id) => el.attrs.get("id").is_some_and(|v| v == id),
            Selector::Tag(tag) => &el.tag == tag,
            Selector::TagAttrSuffix { tag, attr, suffix } => {
                &el.tag == tag && el.attrs.get(attr).is_some_and(|v| v.ends_with(suffix))
            },
        }
    }
}

/// Parse the supported selector subset. Unsupported syntax matches nothing.
fn parse_selector(selector: &str) -> Option<Selector> {
    let s = selector.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(id) = s.strip_prefix('#') {
        return Some(Selector::Id(id.to_string()));
    }
    if let Some((tag, rest)) = s.split_once('[') {
        let inner = rest.strip_suffix(']')?;
        let (attr, raw) = inner.split_once("$=")?;
        let suffix = raw.trim().trim_matches(|c| c == '"' || c == '\'');
        return Some(Selector::TagAttrSuffix {
            tag: tag.trim().to_ascii_lowercase(),
            attr: attr.trim().to_ascii_lowercase(),
            suffix: suffix.to_string(),
        });
    }
    Some(Selector::Tag(s.to_ascii_lowercase()))
}

// ---------------------------------------------------------------------------
// Markup scanner
// ---------------------------------------------------------------------------

struct ScannedTag {
    name: String,
    attrs: BTreeMap<String, String>,
    text: String,
}

/// Lift opening tags out of an HTML fragment, in order. `<script>` bodies
/// are captured up to the matching closer. Closing tags, comments, and
/// doctypes are skipped; nesting is not tracked.
fn scan_markup(html: &str) -> Vec<ScannedTag> {
    let mut out = Vec::new();
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        let after_lt = &rest[lt + 1..];
        if after_lt.starts_with('/') || after_lt.starts_with('!') {
            rest = after_lt;
            continue;
        }
        let Some(gt) = after_lt.find('>') else { break };
        let tag_src = &after_lt[..gt];
        let mut next = &after_lt[gt + 1..];

        let (name, attr_src) = split_tag(tag_src);
        if name.is_empty() {
            rest = next;
            continue;
        }
        let name = name.to_ascii_lowercase();
        let attrs = parse_attrs(attr_src);

        let mut text = String::new();
        if name == "script" {
            match next.to_ascii_lowercase().find("</script") {
                Some(end) => {
                    text = next[..end].to_string();
                    next = &next[end..];
                },
                None => {
                    text = next.to_string();
                    next = "";
                },
            }
        }
        out.push(ScannedTag { name, attrs, text });
        rest = next;
    }
    out
}

/// Split a tag body into name and attribute source.
fn split_tag(tag_src: &str) -> (&str, &str) {
    let end = tag_src
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(tag_src.len());
    (&tag_src[..end], &tag_src[end..])
}

fn parse_attrs(src: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'/'
        {
            i += 1;
        }
        let name = src[start..i].to_ascii_lowercase();
        if name.is_empty() {
            i += 1;
            continue;
        }
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let vstart = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                let v = src[vstart..i].to_string();
                if i < bytes.len() {
                    i += 1;
                }
                v
            } else {
                let vstart = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                src[vstart..i].to_string()
            };
            attrs.insert(name, value);
        } else {
            attrs.insert(name, String::new());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_by_id() {
        let page = MemoryPage::new();
        let el = page.add_element("div", &[("id", "content")]);
        assert_eq!(page.query("#content"), Some(el));
        assert_eq!(page.query("#missing"), None);
    }

    #[test]
    fn query_by_tag_returns_first() {
        let page = MemoryPage::new();
        let first = page.add_element("a", &[("href", "a.md")]);
        page.add_element("a", &[("href", "b.md")]);
        assert_eq!(page.query("a"), Some(first));
    }

    #[test]
    fn query_all_with_suffix_selector() {
        let page = MemoryPage::new();
        let md = page.add_element("a", &[("href", "guide.md")]);
        page.add_element("a", &[("href", "image.png")]);
        let md2 = page.add_element("a", &[("href", "notes.md")]);
        assert_eq!(page.query_all("a[href$=\".md\"]"), vec![md, md2]);
    }

    #[test]
    fn unsupported_selector_matches_nothing() {
        let page = MemoryPage::new();
        page.add_element("a", &[("href", "a.md")]);
        assert!(page.query_all("a[href^=\"x\"]").is_empty());
        assert!(page.query(".class").is_none());
    }

    #[test]
    fn attr_read() {
        let page = MemoryPage::new();
        let el = page.add_element("a", &[("href", "a.md"), ("title", "A")]);
        assert_eq!(page.attr(el, "href").as_deref(), Some("a.md"));
        assert_eq!(page.attr(el, "title").as_deref(), Some("A"));
        assert_eq!(page.attr(el, "rel"), None);
        assert_eq!(page.attr(ElementId(99), "href"), None);
    }

    #[test]
    fn set_html_stores_content() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<h1>Hi</h1>").unwrap();
        assert_eq!(page.html_of(el).as_deref(), Some("<h1>Hi</h1>"));
    }

    #[test]
    fn set_html_scans_links_into_scope() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<p>See <a href=\"one.md\">one</a> and <a href=\"two.md\">two</a></p>")
            .unwrap();
        let links = page.query_within(el, "a[href$=\".md\"]");
        assert_eq!(links.len(), 2);
        assert_eq!(page.attr(links[0], "href").as_deref(), Some("one.md"));
        assert_eq!(page.attr(links[1], "href").as_deref(), Some("two.md"));
    }

    #[test]
    fn set_html_replaces_previous_children() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<a href=\"old.md\">old</a>").unwrap();
        let old = page.query_within(el, "a")[0];

        page.set_html(el, "<a href=\"new.md\">new</a>").unwrap();
        let links = page.query_within(el, "a");
        assert_eq!(links.len(), 1);
        assert_ne!(links[0], old);
        // The replaced element's id is stale.
        assert_eq!(page.attr(old, "href"), None);
    }

    #[test]
    fn set_html_on_stale_id_is_recorded_but_inert() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<a href=\"a.md\">a</a>").unwrap();
        let stale = page.query_within(el, "a")[0];
        page.set_html(el, "").unwrap();

        page.set_html(stale, "<p>ghost</p>").unwrap();
        assert!(!page.has_html("ghost"));
        assert_eq!(page.op_kinds(), vec!["set_html", "set_html", "set_html"]);
    }

    #[test]
    fn scripts_within_in_document_order() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(
            el,
            "<script>first()</script><script src=\"lib.js\"></script><script>second()</script>",
        )
        .unwrap();
        assert_eq!(
            page.scripts_within(el),
            vec![
                EmbeddedScript::Inline("first()".into()),
                EmbeddedScript::External("lib.js".into()),
                EmbeddedScript::Inline("second()".into()),
            ]
        );
    }

    #[test]
    fn scripts_only_from_live_content() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<script>old()</script>").unwrap();
        page.set_html(el, "<p>no scripts</p>").unwrap();
        assert!(page.scripts_within(el).is_empty());
    }

    #[test]
    fn push_history_updates_location() {
        let page = MemoryPage::new();
        page.set_location("/docs?foo=1");
        let state = HistoryState {
            path: "guide.md".into(),
        };
        page.push_history(&state, "/docs?foo=1&path=guide.md").unwrap();
        assert_eq!(page.location(), "/docs?foo=1&path=guide.md");
        assert_eq!(
            page.pushed_entries(),
            vec![("guide.md".to_string(), "/docs?foo=1&path=guide.md".to_string())]
        );
    }

    #[test]
    fn ops_record_in_call_order() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "x").unwrap();
        page.scroll_to_top();
        page.push_history(&HistoryState { path: "p".into() }, "/u").unwrap();
        assert_eq!(
            page.op_kinds(),
            vec!["set_html", "scroll_to_top", "push_history"]
        );
    }

    #[test]
    fn script_forwarding_is_recorded() {
        let page = MemoryPage::new();
        page.eval_script("run()").unwrap();
        page.load_script("ext.js").unwrap();
        assert_eq!(
            page.ops(),
            vec![
                PageOp::EvalScript { source: "run()".into() },
                PageOp::LoadScript { src: "ext.js".into() },
            ]
        );
    }

    // -- scanner edge cases -------------------------------------------------

    #[test]
    fn scanner_handles_quote_styles() {
        let tags = scan_markup("<a href='single.md'>x</a><a href=bare.md>y</a>");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].attrs.get("href").unwrap(), "single.md");
        assert_eq!(tags[1].attrs.get("href").unwrap(), "bare.md");
    }

    #[test]
    fn scanner_is_case_insensitive_on_tags_and_attrs() {
        let page = MemoryPage::with_container("c");
        let el = page.query("#c").unwrap();
        page.set_html(el, "<A HREF=\"up.md\">x</A>").unwrap();
        let links = page.query_within(el, "a[href$=\".md\"]");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn scanner_skips_closers_and_doctype() {
        let tags = scan_markup("<!doctype html></p><b>x</b>");
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn scanner_reads_into_comments() {
        // Comments are not tracked -- this documents the current behavior.
        // Only the comment opener itself is skipped; tags inside the
        // comment body are still lifted out.
        let tags = scan_markup("<!-- <a href=\"in-comment.md\"> -->");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attrs.get("href").unwrap(), "in-comment.md");
    }

    #[test]
    fn scanner_captures_script_body_exactly() {
        let tags = scan_markup("<script>\n  let x = 1 < 2;\n</script>");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].text, "\n  let x = 1 < 2;\n");
    }

    #[test]
    fn scanner_unterminated_script_takes_rest() {
        let tags = scan_markup("<script>dangling(");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].text, "dangling(");
    }

    #[test]
    fn scanner_empty_and_plain_text() {
        assert!(scan_markup("").is_empty());
        assert!(scan_markup("no tags here").is_empty());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scanner_never_panics(html in ".*") {
                let _ = scan_markup(&html);
            }

            #[test]
            fn generated_links_are_all_found(names in proptest::collection::vec("[a-z]{1,8}", 0..10)) {
                let html: String = names
                    .iter()
                    .map(|n| format!("<a href=\"{n}.md\">{n}</a>"))
                    .collect();
                let tags = scan_markup(&html);
                prop_assert_eq!(tags.len(), names.len());
                for (tag, name) in tags.iter().zip(&names) {
                    prop_assert_eq!(tag.attrs.get("href").unwrap(), &format!("{name}.md"));
                }
            }

            #[test]
            fn set_html_then_query_within_count(n in 0usize..8) {
                let page = MemoryPage::with_container("c");
                let el = page.query("#c").unwrap();
                let html: String = (0..n)
                    .map(|i| format!("<a href=\"doc{i}.md\">d</a>"))
                    .collect();
                page.set_html(el, &html).unwrap();
                prop_assert_eq!(page.query_within(el, "a[href$=\".md\"]").len(), n);
            }
        }
    }
}
