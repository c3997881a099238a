//! Content resolution.

use async_trait::async_trait;

use crate::Result;

/// Fetches raw content for a path.
///
/// The session calls the resolver once per navigation with the path exactly
/// as it appeared in the link `href` (or as given to
/// [`Session::go`](crate::Session::go)). Implementations decide what a path
/// means: the stock resolvers in `parchment-fetch` treat it as an HTTP URL
/// or a file below a root directory.
///
/// Errors are not fatal to the session; a failed resolve is rendered into
/// the target element as an inline error message.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fetch the raw text content for `path`.
    async fn resolve(&self, path: &str) -> Result<String>;
}
