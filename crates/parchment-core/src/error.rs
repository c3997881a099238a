//! Error types for Parchment.

use std::io;

/// Errors produced by the Parchment engine and its stock capabilities.
#[derive(Debug, thiserror::Error)]
pub enum ParchmentError {
    #[error("config error: {0}")]
    Config(String),

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("resolve error: {0}")]
    Resolve(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("history error: {0}")]
    History(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParchmentError>;
