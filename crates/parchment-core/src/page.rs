//! The page surface a Parchment session drives.
//!
//! [`Page`] abstracts the handful of document operations the engine needs:
//! element lookup, attribute reads, content replacement, script discovery,
//! location/history access, and scrolling. Embedders implement it over a real
//! DOM, a terminal widget tree, or any other renderable surface;
//! [`MemoryPage`](crate::MemoryPage) implements it in memory for tests.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Opaque handle to an element on a [`Page`].
///
/// Ids are assigned by the page and stay stable for the lifetime of the
/// element. An id whose element has been replaced is stale; pages ignore
/// operations on stale ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// A script block discovered in rendered content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedScript {
    /// Inline script source text.
    Inline(String),
    /// External script reference (the value of its `src` attribute).
    External(String),
}

/// History entry state attached to entries Parchment pushes.
///
/// The serialized field name is `parchmentPath` so that entries survive
/// embedders that round-trip history state through JSON, and so foreign
/// entries (pushed by other code) are distinguishable from ours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// The content path this entry displays.
    #[serde(rename = "parchmentPath")]
    pub path: String,
}

/// A back/forward traversal event, forwarded by the embedder.
///
/// `state` carries the [`HistoryState`] of the entry being returned to, or
/// `None` when the entry has no state or its state was pushed by foreign
/// code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopStateEvent {
    pub state: Option<HistoryState>,
}

/// The document surface Parchment renders into.
///
/// Methods take `&self`: a page is a shared surface the way a browser
/// document is, and overlapping navigations may touch it in turn.
/// Implementations mutate through interior mutability and are not expected
/// to be thread-safe; session futures are driven on the embedder's event
/// thread.
///
/// # Core methods (required)
///
/// Element access, content replacement, location/history, and scrolling must
/// be implemented. Selector support may be minimal: the engine only ever
/// passes the configured `target` and `link_selector` strings through.
///
/// # Script methods (optional, default no-ops)
///
/// `eval_script` and `load_script` receive scripts found in rendered content
/// when script execution is enabled in the config. The defaults discard
/// them, so a page that never overrides these can never execute content.
pub trait Page {
    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    /// Find the first element matching `selector`, if any.
    fn query(&self, selector: &str) -> Option<ElementId>;

    /// Find all elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;

    /// Find all elements matching `selector` inside `root`, in document
    /// order. `root` itself is not a candidate.
    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId>;

    /// Read an attribute of an element. `None` if the element is stale or
    /// the attribute is absent.
    fn attr(&self, el: ElementId, name: &str) -> Option<String>;

    /// Replace the inner HTML of an element. Children of the old content are
    /// discarded; their ids become stale.
    fn set_html(&self, el: ElementId, html: &str) -> Result<()>;

    /// Collect script blocks inside `el`, in document order.
    fn scripts_within(&self, el: ElementId) -> Vec<EmbeddedScript>;

    // -----------------------------------------------------------------------
    // Location and history
    // -----------------------------------------------------------------------

    /// Current location as `path` or `path?query` (no scheme or host).
    fn location(&self) -> String;

    /// Push a history entry with the given state and URL, making `url` the
    /// new location. Hosts report a rejected push as
    /// [`ParchmentError::History`](crate::ParchmentError::History).
    fn push_history(&self, state: &HistoryState, url: &str) -> Result<()>;

    // -----------------------------------------------------------------------
    // Viewport
    // -----------------------------------------------------------------------

    /// Scroll the viewport back to the top of the document.
    fn scroll_to_top(&self);

    // -----------------------------------------------------------------------
    // Scripts (optional -- defaults discard)
    // -----------------------------------------------------------------------

    /// Evaluate inline script source.
    fn eval_script(&self, _source: &str) -> Result<()> {
        Ok(())
    }

    /// Load and run an external script by its `src` reference.
    fn load_script(&self, _src: &str) -> Result<()> {
        Ok(())
    }
}
