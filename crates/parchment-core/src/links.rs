//! Link discovery and bound-set tracking.

use std::collections::HashSet;

use crate::page::{ElementId, Page};

/// Tracks which link elements the session has claimed.
///
/// Ids are never removed. A replaced element's id goes stale and no live
/// element reports it again, so stale entries are inert; the set grows by
/// the number of links ever bound.
#[derive(Debug, Default)]
pub struct LinkBinder {
    bound: HashSet<ElementId>,
}

impl LinkBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim all elements matching `selector`, document-wide or within
    /// `scope`. Already-claimed elements are skipped. Returns the ids newly
    /// claimed by this call, in document order.
    pub fn bind(
        &mut self,
        page: &dyn Page,
        selector: &str,
        scope: Option<ElementId>,
    ) -> Vec<ElementId> {
        let candidates = match scope {
            Some(root) => page.query_within(root, selector),
            None => page.query_all(selector),
        };
        let mut fresh = Vec::new();
        for el in candidates {
            if self.bound.insert(el) {
                fresh.push(el);
            }
        }
        fresh
    }

    /// Whether `el` has been claimed.
    pub fn is_bound(&self, el: ElementId) -> bool {
        self.bound.contains(&el)
    }

    /// Number of ids ever claimed, stale ones included.
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
