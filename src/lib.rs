//! Like `tail -F`, but always following the newest file.
//!
//! Given a set of paths, directories or glob patterns, the file with the most
//! recent modification time is followed. When a newer file shows up (for
//! example after log rotation) following switches over to it, reading it from
//! the start, without re-emitting or skipping data.
//!
//! # Example
//!
//! ```rust,no_run
//! use follow_newest::{FollowConfig, follow_newest};
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = follow_newest(FollowConfig::new(["/var/log/app"])).await?;
//!
//!     while let Some(update) = stream.next().await {
//!         let update = update?;
//!         for notice in &update.notices {
//!             eprintln!("{}", notice);
//!         }
//!         print!("{}", String::from_utf8_lossy(&update.data));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! The synchronous building blocks are public as well: [`FileFollower`]
//! follows a single path and [`NewestFileSelector`] runs one selection cycle
//! per call.

mod config;
mod error;
mod follower;
mod fs;
mod notice;
mod selector;
mod stream;
mod watcher;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{DEFAULT_INTERVAL, DEFAULT_PATTERN, FollowConfig, StartPosition};
pub use error::{Error, Result};
pub use follower::FileFollower;
pub use fs::{FileKind, FileStat, FileSystem, LocalFs};
pub use notice::{Notice, Update};
pub use selector::NewestFileSelector;
pub use stream::NewestFileStream;

use tokio_stream::Stream;

/// Creates a stream that follows the newest file matching `config.patterns`.
///
/// Must be called from within a tokio runtime.
pub async fn follow_newest(config: FollowConfig) -> Result<impl Stream<Item = Result<Update>>> {
    NewestFileStream::new(config).await
}
