//! Error types for shotsort.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for shotsort operations.
pub type Result<T> = std::result::Result<T, ShotsortError>;

/// Top-level error type for shotsort.
///
/// Skipped files are not errors; they surface as
/// [`Outcome::Skipped`](crate::organizer::Outcome::Skipped).
#[derive(Debug, Error)]
pub enum ShotsortError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("counter file {path}: {message}")]
    Counter { path: PathBuf, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("watch error: {0}")]
    Watch(String),
}
