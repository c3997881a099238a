//! Content resolvers for Parchment sessions.
//!
//! Two [`parchment_core::Resolver`] implementations: [`HttpResolver`]
//! fetches documents over plain HTTP relative to a base URL, and
//! [`FileResolver`] reads them from a local directory tree. Both return
//! the document text as-is; parsing into HTML is the session's job.

pub mod file;
pub mod http;
pub mod url;

pub use file::FileResolver;
pub use http::HttpResolver;
pub use url::Url;
