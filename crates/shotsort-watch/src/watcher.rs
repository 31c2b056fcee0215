//! Directory watcher for newly created screenshots.
//!
//! Uses the `notify` crate for cross-platform file system events
//! (FSEvents on macOS, inotify on Linux, ReadDirectoryChanges on Windows).
//! Only the root itself is watched; month folders below it are not.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use shotsort_core::naming;
use shotsort_core::ShotsortError;

use crate::ScreenshotSource;

/// Watches one directory and yields paths of newly created screenshots.
pub struct ScreenshotWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<PathBuf>,
}

impl ScreenshotWatcher {
    /// Start watching `root` (non-recursively) for files with `extension`.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Watch`] if the watcher cannot be created or
    /// the directory cannot be watched.
    pub fn start(root: &Path, extension: &str) -> Result<Self, ShotsortError> {
        let (tx, rx) = mpsc::channel();
        let extension = extension.to_string();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("watch error: {e}");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_)) {
                return;
            }
            if matches!(event.kind, EventKind::Create(CreateKind::Folder)) {
                return;
            }
            for path in event.paths {
                if path.is_dir() {
                    continue;
                }
                if !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| naming::has_extension(n, &extension))
                {
                    continue;
                }
                let _ = tx.send(path);
            }
        })
        .map_err(|e| ShotsortError::Watch(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(|e| ShotsortError::Watch(format!("{}: {e}", root.display())))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Try to receive the next created path with a timeout.
    ///
    /// Returns `None` if nothing arrives within the timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PathBuf> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl ScreenshotSource for ScreenshotWatcher {
    fn next_timeout(&self, timeout: Duration) -> Option<PathBuf> {
        self.recv_timeout(timeout)
    }
}
