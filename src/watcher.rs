//! Change notifications for the directory of the active file.
//!
//! Events only wake the poll loop early; every wakeup runs a normal cycle.

use crate::error::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Watches the parent directory of one file at a time.
pub(crate) struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    watched_dir: Option<PathBuf>,
}

impl FileWatcher {
    pub(crate) fn new() -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
            watched_dir: None,
        })
    }

    /// Moves the watch to the directory containing `file`.
    pub(crate) fn watch_parent_of(&mut self, file: &Path) -> Result<()> {
        let dir = parent_dir(file);
        if self.watched_dir.as_deref() == Some(dir) {
            return Ok(());
        }

        if let Some(old) = self.watched_dir.take() {
            // The directory may be gone already
            let _ = self.watcher.unwatch(&old);
        }
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(dir = %dir.display(), "watching directory");
        self.watched_dir = Some(dir.to_path_buf());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn watched_dir(&self) -> Option<&Path> {
        self.watched_dir.as_deref()
    }

    /// Returns the next file system event.
    pub(crate) async fn next_event(&mut self) -> Option<notify::Result<Event>> {
        self.receiver.recv().await
    }
}

fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check if a notify event may have changed the content of a specific file
pub(crate) fn is_event_relevant_to_file(event: &Event, target_file_name: &str) -> bool {
    let content_change = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };

    content_change
        && event.paths.iter().any(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy() == target_file_name)
                .unwrap_or(false)
        })
}
