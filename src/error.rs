//! Error types for following files.

use thiserror::Error;

/// The main error type for follow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading or stating the followed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// No path patterns were given.
    #[error("No paths to follow")]
    NoPatterns,

    /// A path pattern could not be parsed as a glob.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The polling interval must be non-zero.
    #[error("Polling interval must be greater than zero")]
    InvalidInterval,

    /// A poll cycle panicked or was cancelled on the blocking pool.
    #[error("Poll cycle failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A convenient Result type for follow operations.
pub type Result<T> = std::result::Result<T, Error>;
