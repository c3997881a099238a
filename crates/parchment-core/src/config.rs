//! Session configuration.

use std::fmt;
use std::sync::Arc;

use crate::page::ElementId;
use crate::parse::{Parser, PlainTextParser};
use crate::resolve::Resolver;
use crate::{ParchmentError, Result};

/// Hook called before each navigation with the path about to load.
/// Returning `false` cancels the navigation.
pub type NavigateHook = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Hook called after content is rendered, with the path and the target
/// element it was rendered into.
pub type LoadHook = Arc<dyn Fn(&str, ElementId) + Send + Sync>;

/// How navigations are reflected in the page location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Rewrite a query parameter of the current location, preserving the
    /// rest of the query string.
    #[default]
    Param,
    /// Push the content path itself as the new location.
    Path,
    /// Leave location and history untouched.
    None,
}

/// The back affordance prepended to rendered content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackLink {
    /// No back link.
    #[default]
    None,
    /// A link to a fixed location.
    To(String),
    /// A link that walks one entry back in history.
    HistoryBack,
}

/// Caller-supplied session options.
///
/// Every field has a default; set only what differs:
///
/// ```no_run
/// use std::sync::Arc;
/// use parchment_core::{Options, HistoryMode};
/// # let my_resolver: Arc<dyn parchment_core::Resolver> = unimplemented!();
///
/// let opts = Options {
///     resolver: Some(my_resolver),
///     history_mode: HistoryMode::Path,
///     ..Options::default()
/// };
/// ```
///
/// A resolver is the one field with no usable default; `Session::init`
/// rejects options without one.
#[derive(Clone)]
pub struct Options {
    /// Selector for the element content is rendered into.
    pub target: String,
    /// Selector for the links the session intercepts.
    pub link_selector: String,
    /// Content fetcher. Required.
    pub resolver: Option<Arc<dyn Resolver>>,
    /// Content parser. Falls back to [`PlainTextParser`] when absent.
    pub parser: Option<Arc<dyn Parser>>,
    /// Forward scripts in rendered content to the page for execution.
    pub eval_scripts: bool,
    /// Back affordance prepended to rendered content.
    pub back_link: BackLink,
    /// Pre-navigation hook. Returning `false` cancels the navigation.
    pub on_navigate: Option<NavigateHook>,
    /// Post-render hook.
    pub on_load: Option<LoadHook>,
    /// How navigations are reflected in the location.
    pub history_mode: HistoryMode,
    /// Query parameter holding the content path in [`HistoryMode::Param`].
    pub param_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            target: "#parchment-content".to_string(),
            link_selector: "a[href$=\".md\"]".to_string(),
            resolver: None,
            parser: None,
            eval_scripts: false,
            back_link: BackLink::None,
            on_navigate: None,
            on_load: None,
            history_mode: HistoryMode::Param,
            param_name: "path".to_string(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("target", &self.target)
            .field("link_selector", &self.link_selector)
            .field("resolver", &self.resolver.as_ref().map(|_| ".."))
            .field("parser", &self.parser.as_ref().map(|_| ".."))
            .field("eval_scripts", &self.eval_scripts)
            .field("back_link", &self.back_link)
            .field("history_mode", &self.history_mode)
            .field("param_name", &self.param_name)
            .finish_non_exhaustive()
    }
}

/// Active session configuration, validated from [`Options`].
///
/// Immutable for the life of a session. `Session::config` hands out
/// clones; mutating one never reaches the session.
#[derive(Clone)]
pub struct Config {
    pub target: String,
    pub link_selector: String,
    pub resolver: Arc<dyn Resolver>,
    pub parser: Arc<dyn Parser>,
    pub eval_scripts: bool,
    pub back_link: BackLink,
    pub on_navigate: Option<NavigateHook>,
    pub on_load: Option<LoadHook>,
    pub history_mode: HistoryMode,
    pub param_name: String,
}

impl Config {
    /// Validate options into an active configuration.
    pub fn from_options(opts: Options) -> Result<Self> {
        let resolver = opts
            .resolver
            .ok_or_else(|| ParchmentError::Config("no resolver installed".into()))?;
        let parser = opts
            .parser
            .unwrap_or_else(|| Arc::new(PlainTextParser) as Arc<dyn Parser>);
        Ok(Self {
            target: opts.target,
            link_selector: opts.link_selector,
            resolver,
            parser,
            eval_scripts: opts.eval_scripts,
            back_link: opts.back_link,
            on_navigate: opts.on_navigate,
            on_load: opts.on_load,
            history_mode: opts.history_mode,
            param_name: opts.param_name,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("target", &self.target)
            .field("link_selector", &self.link_selector)
            .field("eval_scripts", &self.eval_scripts)
            .field("back_link", &self.back_link)
            .field("history_mode", &self.history_mode)
            .field("param_name", &self.param_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullResolver;

    #[async_trait]
    impl Resolver for NullResolver {
        async fn resolve(&self, _path: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn default_values_are_sensible() {
        let opts = Options::default();
        assert_eq!(opts.target, "#parchment-content");
        assert_eq!(opts.link_selector, "a[href$=\".md\"]");
        assert!(opts.resolver.is_none());
        assert!(opts.parser.is_none());
        assert!(!opts.eval_scripts);
        assert_eq!(opts.back_link, BackLink::None);
        assert!(opts.on_navigate.is_none());
        assert!(opts.on_load.is_none());
        assert_eq!(opts.history_mode, HistoryMode::Param);
        assert_eq!(opts.param_name, "path");
    }

    #[test]
    fn from_options_requires_resolver() {
        let err = Config::from_options(Options::default()).unwrap_err();
        assert_eq!(format!("{err}"), "config error: no resolver installed");
    }

    #[test]
    fn from_options_falls_back_to_plain_text_parser() {
        let cfg = Config::from_options(Options {
            resolver: Some(Arc::new(NullResolver)),
            ..Options::default()
        })
        .unwrap();
        let html = cfg.parser.parse("*raw*").unwrap();
        assert_eq!(html, "<pre>*raw*</pre>");
    }

    #[test]
    fn from_options_keeps_explicit_settings() {
        let cfg = Config::from_options(Options {
            target: "#docs".into(),
            resolver: Some(Arc::new(NullResolver)),
            back_link: BackLink::To("index.md".into()),
            history_mode: HistoryMode::Path,
            param_name: "page".into(),
            ..Options::default()
        })
        .unwrap();
        assert_eq!(cfg.target, "#docs");
        assert_eq!(cfg.back_link, BackLink::To("index.md".into()));
        assert_eq!(cfg.history_mode, HistoryMode::Path);
        assert_eq!(cfg.param_name, "page");
    }

    #[test]
    fn debug_elides_capabilities() {
        let cfg = Config::from_options(Options {
            resolver: Some(Arc::new(NullResolver)),
            ..Options::default()
        })
        .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("target"));
        assert!(!dbg.contains("NullResolver"));
    }
}
