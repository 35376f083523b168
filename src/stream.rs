//! Async polling driver that exposes the newest-file selector as a stream.

use crate::config::FollowConfig;
use crate::error::Result;
use crate::fs::{FileSystem, LocalFs};
use crate::notice::Update;
use crate::selector::NewestFileSelector;
use crate::watcher::{FileWatcher, is_event_relevant_to_file};
use futures::Stream;
use notify::Event;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A stream of updates from whichever file is newest.
///
/// Yields an item for every cycle that read data or raised notices. The first
/// error ends the stream.
pub struct NewestFileStream {
    receiver: mpsc::UnboundedReceiver<Result<Update>>,
    _shutdown_tx: broadcast::Sender<()>,
    _task_handle: JoinHandle<()>,
}

impl NewestFileStream {
    /// Creates a stream over the local filesystem.
    pub async fn new(config: FollowConfig) -> Result<Self> {
        Self::with_fs(config, LocalFs).await
    }

    /// Creates a stream over any filesystem.
    pub async fn with_fs<F>(config: FollowConfig, fs: F) -> Result<Self>
    where
        F: FileSystem + Clone + Send + 'static,
    {
        config.validate()?;
        let selector = NewestFileSelector::with_fs(fs, config.patterns.clone(), config.start)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task_handle = tokio::spawn(poll_task(selector, config, tx, shutdown_rx));

        Ok(NewestFileStream {
            receiver: rx,
            _shutdown_tx: shutdown_tx,
            _task_handle: task_handle,
        })
    }

    /// Check if the stream has been closed/dropped
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for NewestFileStream {
    fn drop(&mut self) {
        // Ignore errors if the task already finished
        let _ = self._shutdown_tx.send(());
    }
}

impl Stream for NewestFileStream {
    type Item = Result<Update>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

enum Wake {
    Tick,
    Event(notify::Result<Event>),
}

/// Background task that runs one selector cycle per wakeup.
///
/// Cycles do blocking filesystem I/O, so each one runs on the blocking pool
/// and the selector is handed back when it finishes.
async fn poll_task<F>(
    mut selector: NewestFileSelector<F>,
    config: FollowConfig,
    tx: mpsc::UnboundedSender<Result<Update>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    F: FileSystem + Clone + Send + 'static,
{
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut watcher = if config.watch {
        match FileWatcher::new() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "file watcher unavailable, polling only");
                None
            }
        }
    } else {
        None
    };

    loop {
        let wake = tokio::select! {
            _ = shutdown_rx.recv() => {
                break;
            }
            _ = ticker.tick() => Wake::Tick,
            Some(event) = next_event(&mut watcher) => Wake::Event(event),
        };

        if let Wake::Event(event) = wake {
            match event {
                Ok(event) if event_touches_active(&selector, &event) => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "file watcher failed, polling only");
                    watcher = None;
                    continue;
                }
            }
        }

        let cycle = tokio::task::spawn_blocking(move || {
            let result = selector.get();
            (selector, result)
        });
        let (returned, result) = match cycle.await {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(error = %e, "poll cycle aborted");
                let _ = tx.send(Err(e.into()));
                break;
            }
        };
        selector = returned;

        match result {
            Ok(mut update) => {
                if config.quiet {
                    update.notices.clear();
                }
                if !update.is_empty() && tx.send(Ok(update)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }

        let retarget = match (watcher.as_mut(), selector.active_path()) {
            (Some(w), Some(active)) => w.watch_parent_of(active),
            _ => Ok(()),
        };
        if let Err(e) = retarget {
            tracing::warn!(error = %e, "can't watch active file, polling only");
            watcher = None;
        }
    }
}

async fn next_event(watcher: &mut Option<FileWatcher>) -> Option<notify::Result<Event>> {
    match watcher {
        Some(watcher) => watcher.next_event().await,
        None => std::future::pending().await,
    }
}

fn event_touches_active<F: FileSystem + Clone>(
    selector: &NewestFileSelector<F>,
    event: &Event,
) -> bool {
    selector
        .active_path()
        .and_then(|path| path.file_name())
        .map(|name| is_event_relevant_to_file(event, &name.to_string_lossy()))
        .unwrap_or(false)
}
