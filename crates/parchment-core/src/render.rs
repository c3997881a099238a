//! Content composition for the target element.

use crate::config::BackLink;
use crate::escape::escape_html;
use crate::page::{ElementId, EmbeddedScript, Page};
use crate::Result;

/// Compose the final target HTML: the back affordance, if configured,
/// followed by the parsed content.
///
/// A [`BackLink::To`] target is developer-supplied configuration, not
/// content, and is interpolated as-is.
pub fn compose(html: &str, back_link: &BackLink) -> String {
    match back_link {
        BackLink::None => html.to_string(),
        BackLink::To(target) => format!("<a href=\"{target}\">Back</a><br><br>{html}"),
        BackLink::HistoryBack => {
            format!("<a href=\"javascript:history.back()\">Back</a><br><br>{html}")
        },
    }
}

/// Inline markup shown in the target when a navigation fails.
pub fn error_markup(message: &str) -> String {
    format!("<p>Error loading content: {}</p>", escape_html(message))
}

/// Forward scripts found inside `el` to the page, in document order.
/// Inline scripts go to `eval_script`, external ones to `load_script`; the
/// first failure aborts the walk.
pub fn forward_scripts(page: &dyn Page, el: ElementId) -> Result<()> {
    for script in page.scripts_within(el) {
        match script {
            EmbeddedScript::Inline(source) => page.eval_script(&source)?,
            EmbeddedScript::External(src) => page.load_script(&src)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParchmentError;
    use std::cell::RefCell;

    #[test]
    fn compose_without_back_link() {
        assert_eq!(compose("<h1>Hi</h1>", &BackLink::None), "<h1>Hi</h1>");
    }

    #[test]
    fn compose_with_fixed_back_link() {
        assert_eq!(
            compose("<h1>Hi</h1>", &BackLink::To("index.md".into())),
            "<a href=\"index.md\">Back</a><br><br><h1>Hi</h1>"
        );
    }

    #[test]
    fn compose_with_history_back_link() {
        assert_eq!(
            compose("<h1>Hi</h1>", &BackLink::HistoryBack),
            "<a href=\"javascript:history.back()\">Back</a><br><br><h1>Hi</h1>"
        );
    }

    #[test]
    fn error_markup_escapes_message() {
        assert_eq!(
            error_markup("bad <tag> & more"),
            "<p>Error loading content: bad &lt;tag&gt; &amp; more</p>"
        );
    }

    /// Records script calls; `scripts_within` returns a preset list.
    struct ScriptPage {
        scripts: Vec<EmbeddedScript>,
        calls: RefCell<Vec<String>>,
        fail_eval: bool,
    }

    impl ScriptPage {
        fn new(scripts: Vec<EmbeddedScript>) -> Self {
            Self {
                scripts,
                calls: RefCell::new(Vec::new()),
                fail_eval: false,
            }
        }
    }

    impl Page for ScriptPage {
        fn query(&self, _selector: &str) -> Option<ElementId> {
            None
        }
        fn query_all(&self, _selector: &str) -> Vec<ElementId> {
            Vec::new()
        }
        fn query_within(&self, _root: ElementId, _selector: &str) -> Vec<ElementId> {
            Vec::new()
        }
        fn attr(&self, _el: ElementId, _name: &str) -> Option<String> {
            None
        }
        fn set_html(&self, _el: ElementId, _html: &str) -> Result<()> {
            Ok(())
        }
        fn scripts_within(&self, _el: ElementId) -> Vec<EmbeddedScript> {
            self.scripts.clone()
        }
        fn location(&self) -> String {
            String::new()
        }
        fn push_history(&self, _state: &crate::HistoryState, _url: &str) -> Result<()> {
            Ok(())
        }
        fn scroll_to_top(&self) {}
        fn eval_script(&self, source: &str) -> Result<()> {
            if self.fail_eval {
                return Err(ParchmentError::Parse(format!("eval failed: {source}")));
            }
            self.calls.borrow_mut().push(format!("eval:{source}"));
            Ok(())
        }
        fn load_script(&self, src: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("load:{src}"));
            Ok(())
        }
    }

    #[test]
    fn forward_scripts_in_document_order() {
        let page = ScriptPage::new(vec![
            EmbeddedScript::Inline("first()".into()),
            EmbeddedScript::External("lib.js".into()),
            EmbeddedScript::Inline("second()".into()),
        ]);
        forward_scripts(&page, ElementId(1)).unwrap();
        assert_eq!(
            *page.calls.borrow(),
            vec!["eval:first()", "load:lib.js", "eval:second()"]
        );
    }

    #[test]
    fn forward_scripts_stops_on_error() {
        let mut page = ScriptPage::new(vec![
            EmbeddedScript::Inline("boom()".into()),
            EmbeddedScript::External("never.js".into()),
        ]);
        page.fail_eval = true;
        assert!(forward_scripts(&page, ElementId(1)).is_err());
        assert!(page.calls.borrow().is_empty());
    }
}
