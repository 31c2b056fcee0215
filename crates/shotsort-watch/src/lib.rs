//! # shotsort-watch
//!
//! Feeds newly created screenshots to the [`Organizer`].
//!
//! [`ScreenshotWatcher`] is the real `notify`-backed source; anything
//! implementing [`ScreenshotSource`] can drive [`pump`] instead.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use shotsort_core::{Organizer, Outcome, Result};

pub mod watcher;

pub use watcher::ScreenshotWatcher;

/// How long [`pump`] waits for an event before re-checking its stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A stream of paths to newly created screenshots.
pub trait ScreenshotSource {
    /// Next path, or `None` if nothing arrived within `timeout`.
    fn next_timeout(&self, timeout: Duration) -> Option<PathBuf>;
}

/// Process paths from `source` one at a time until `stop` is raised.
///
/// Returns the number of files moved.
///
/// # Errors
///
/// Stops at and returns the first error from [`Organizer::process`].
pub fn pump(
    source: &impl ScreenshotSource,
    organizer: &mut Organizer,
    stop: &AtomicBool,
) -> Result<usize> {
    let mut moved = 0;
    while !stop.load(Ordering::Relaxed) {
        let Some(path) = source.next_timeout(POLL_INTERVAL) else {
            continue;
        };
        if let Outcome::Moved(_) = organizer.process(&path)? {
            moved += 1;
        }
    }
    Ok(moved)
}
