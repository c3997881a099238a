//! Parchment: in-page navigation for text-document sites.
//!
//! A [`Session`] watches a page for clicks on document links, fetches the
//! linked content through a [`Resolver`], turns it into HTML through a
//! [`Parser`], renders it into a target element, and keeps the page
//! location and history in sync. The page itself sits behind the [`Page`]
//! trait, so the engine runs the same against a real document, a widget
//! tree, or the in-memory [`MemoryPage`] used in tests.
//!
//! ```
//! use std::sync::Arc;
//! use parchment_core::{MemoryPage, Options, Session};
//! # use parchment_core::{Resolver, Result};
//! # use async_trait::async_trait;
//! # struct Docs;
//! # #[async_trait]
//! # impl Resolver for Docs {
//! #     async fn resolve(&self, path: &str) -> Result<String> {
//! #         Ok(format!("# {path}"))
//! #     }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let page = MemoryPage::with_container("parchment-content");
//! let session = Session::init(
//!     Options {
//!         resolver: Some(Arc::new(Docs)),
//!         ..Options::default()
//!     },
//!     &page,
//! )
//! .await?;
//!
//! session.go("intro.md", &page).await?;
//! assert!(page.has_html("intro.md"));
//! # Ok(())
//! # }
//! ```
//!
//! Sessions are single-threaded: methods take `&self` and their futures
//! are not `Send`. Drive them on the embedder's event thread and forward
//! clicks and history traversals to [`Session::handle_click`] and
//! [`Session::handle_pop_state`].

pub mod config;
pub mod error;
pub mod escape;
pub mod history;
pub mod links;
pub mod memory;
pub mod page;
pub mod parse;
pub mod render;
pub mod resolve;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use config::{BackLink, Config, HistoryMode, LoadHook, NavigateHook, Options};
pub use error::{ParchmentError, Result};
pub use escape::escape_html;
pub use memory::{MemoryPage, PageOp};
pub use page::{ElementId, EmbeddedScript, HistoryState, Page, PopStateEvent};
pub use parse::{Parser, PlainTextParser};
pub use resolve::Resolver;

// -----------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------

use std::cell::{Cell, RefCell};

use links::LinkBinder;

/// Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// -----------------------------------------------------------------------
// NavState
// -----------------------------------------------------------------------

/// Current loading state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// No navigation in progress.
    Idle,
    /// A navigation is resolving.
    Loading,
    /// The most recent navigation failed.
    Failed,
}

// -----------------------------------------------------------------------
// Session
// -----------------------------------------------------------------------

/// A navigation session bound to one target element on a page.
///
/// Created by [`Session::init`]. The session does not own the page; every
/// operation takes it as a parameter, and the embedder is responsible for
/// forwarding click and history-traversal events.
///
/// Navigations may overlap. The session neither queues nor cancels them:
/// whichever navigation resolves last performs the last render, as a late
/// response would in a browser.
#[derive(Debug)]
pub struct Session {
    config: Config,
    /// The element content renders into, looked up once at init.
    target: ElementId,
    binder: RefCell<LinkBinder>,
    state: Cell<NavState>,
    last_error: RefCell<Option<String>>,
}

impl Session {
    /// Start a session on a page.
    ///
    /// Validates the options, locates the target element, and either
    /// performs an initial navigation (when the current location's query
    /// already names a content path) or claims matching links across the
    /// document.
    pub async fn init(options: Options, page: &dyn Page) -> Result<Session> {
        let config = Config::from_options(options)?;
        let Some(target) = page.query(&config.target) else {
            log::error!("render target '{}' not found", config.target);
            return Err(ParchmentError::TargetNotFound(config.target));
        };
        log::debug!("session ready; rendering into {target:?}");

        let session = Session {
            config,
            target,
            binder: RefCell::new(LinkBinder::new()),
            state: Cell::new(NavState::Idle),
            last_error: RefCell::new(None),
        };

        match history::param_path(&page.location(), &session.config.param_name) {
            Some(path) => {
                // The location already points at content; render it without
                // pushing a duplicate entry.
                session.navigate(&path, page, false).await?;
            },
            None => {
                session.bind_links(page, None);
            },
        }
        Ok(session)
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Navigate to a content path, updating history.
    pub async fn go(&self, path: &str, page: &dyn Page) -> Result<()> {
        self.navigate(path, page, true).await
    }

    /// Navigate to a content path.
    ///
    /// Runs the pre-navigation hook, resolves and parses the content, and
    /// renders it into the target. A resolve, parse, or render failure is
    /// shown in the target as an inline error message and reported through
    /// [`Session::state`]; `Err` is returned only when the page surface
    /// itself rejects the error render.
    ///
    /// `update_history` controls whether a successful render pushes a
    /// history entry; re-renders during traversal pass `false`.
    pub async fn navigate(&self, path: &str, page: &dyn Page, update_history: bool) -> Result<()> {
        if let Some(hook) = &self.config.on_navigate
            && !hook(path)
        {
            log::debug!("navigation to {path} cancelled by hook");
            return Ok(());
        }

        self.state.set(NavState::Loading);
        self.last_error.borrow_mut().take();

        let rendered = async {
            let text = self.config.resolver.resolve(path).await?;
            let html = self.config.parser.parse(&text)?;
            self.render(&html, path, page, update_history)
        }
        .await;

        match rendered {
            Ok(()) => {
                self.state.set(NavState::Idle);
                Ok(())
            },
            Err(e) => {
                log::error!("failed to load content for {path}: {e}");
                let message = e.to_string();
                page.set_html(self.target, &render::error_markup(&message))?;
                self.state.set(NavState::Failed);
                *self.last_error.borrow_mut() = Some(message);
                Ok(())
            },
        }
    }

    /// Render parsed HTML into the target.
    ///
    /// Order matters and is observable: content swap, script forwarding,
    /// scroll reset, history push, link rebind, load hook.
    fn render(&self, html: &str, path: &str, page: &dyn Page, update_history: bool) -> Result<()> {
        let content = render::compose(html, &self.config.back_link);
        page.set_html(self.target, &content)?;

        if self.config.eval_scripts {
            render::forward_scripts(page, self.target)?;
        }

        page.scroll_to_top();

        if update_history
            && let Some(url) = history::push_url(
                &page.location(),
                self.config.history_mode,
                &self.config.param_name,
                path,
            )
        {
            let state = HistoryState {
                path: path.to_string(),
            };
            page.push_history(&state, &url)?;
        }

        self.bind_links(page, Some(self.target));

        if let Some(hook) = &self.config.on_load {
            hook(path, self.target);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Links and clicks
    // ---------------------------------------------------------------

    /// Claim unclaimed links matching the configured selector, either
    /// document-wide (`scope: None`) or within an element. Returns the ids
    /// newly claimed by this call.
    ///
    /// The session rebinds the target after every render; embedders only
    /// need this after inserting content themselves.
    pub fn bind_links(&self, page: &dyn Page, scope: Option<ElementId>) -> Vec<ElementId> {
        self.binder
            .borrow_mut()
            .bind(page, &self.config.link_selector, scope)
    }

    /// The path a click on `el` would navigate to: the element must have
    /// been claimed by this session and carry an `href`.
    pub fn click_target(&self, el: ElementId, page: &dyn Page) -> Option<String> {
        if !self.binder.borrow().is_bound(el) {
            return None;
        }
        page.attr(el, "href")
    }

    /// Handle a click on an element.
    ///
    /// Returns `true` when the click was consumed, meaning the element is a
    /// claimed link and the embedder must suppress its default action. The
    /// navigation itself may still be cancelled by the hook or fail into an
    /// inline error; the click is consumed either way.
    pub async fn handle_click(&self, el: ElementId, page: &dyn Page) -> Result<bool> {
        let Some(path) = self.click_target(el, page) else {
            return Ok(false);
        };
        self.navigate(&path, page, true).await?;
        Ok(true)
    }

    // ---------------------------------------------------------------
    // History traversal
    // ---------------------------------------------------------------

    /// Handle a back/forward traversal event forwarded by the embedder.
    ///
    /// An entry carrying this session's state re-renders its path; a
    /// foreign or stateless entry falls back to the path named in the
    /// current location's query parameter. Traversal renders never push
    /// history. An event with no recoverable path is ignored.
    pub async fn handle_pop_state(&self, event: &PopStateEvent, page: &dyn Page) -> Result<()> {
        let path = event
            .state
            .as_ref()
            .map(|s| s.path.clone())
            .filter(|p| !p.is_empty())
            .or_else(|| history::param_path(&page.location(), &self.config.param_name));

        if let Some(path) = path {
            self.navigate(&path, page, false).await?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// Snapshot of the active configuration. The session keeps using its
    /// own copy; the snapshot is the caller's to keep.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// The element content renders into.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Current loading state.
    pub fn state(&self) -> NavState {
        self.state.get()
    }

    /// Message of the most recent failed navigation. Cleared when a new
    /// navigation starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }
}
