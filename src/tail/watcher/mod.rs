// SPDX-License-Identifier: Apache-2.0

//! File change watchers for the tail follower.
//!
//! This module provides two watching strategies:
//! - **Native watching**: Uses OS-level file system notifications (inotify on Linux,
//!   FSEvents on macOS, ReadDirectoryChangesW on Windows) for immediate wakeups.
//! - **Poll watching**: Stats the file periodically. Use it on network file
//!   systems where native notifications are not delivered.
//!
//! `Auto` mode attempts native watching first and falls back to polling.

mod native;
mod poll;
mod traits;

pub use native::NativeWatcher;
pub use poll::PollWatcher;
pub use traits::{FileEvent, FileEventKind, FileWatcher, WatcherError};

use std::path::Path;
use std::time::Duration;

/// Watch mode configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchMode {
    /// Try native watching first, fall back to polling on failure.
    #[default]
    Auto,
    /// Force native file system watching (inotify/kqueue/FSEvents).
    /// Will fail if native watching is not supported.
    Native,
    /// Force polling mode.
    Poll,
}

impl std::str::FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(WatchMode::Auto),
            "native" => Ok(WatchMode::Native),
            "poll" | "polling" => Ok(WatchMode::Poll),
            _ => Err(format!(
                "Invalid watch mode '{}'. Valid options: auto, native, poll",
                s
            )),
        }
    }
}

/// Create a watcher for `path` according to `mode`.
pub fn create_watcher(
    mode: WatchMode,
    poll_interval: Duration,
    debounce_interval: Duration,
    path: &Path,
) -> Result<Box<dyn FileWatcher + Send>, WatcherError> {
    match mode {
        WatchMode::Native => {
            let mut watcher = NativeWatcher::new(debounce_interval)?;
            watcher.watch(path)?;
            Ok(Box::new(watcher))
        }
        WatchMode::Poll => {
            let mut watcher = PollWatcher::new(poll_interval);
            watcher.watch(path)?;
            Ok(Box::new(watcher))
        }
        WatchMode::Auto => {
            let native = NativeWatcher::new(debounce_interval).and_then(|mut w| {
                w.watch(path)?;
                Ok(w)
            });
            match native {
                Ok(watcher) => {
                    tracing::debug!(backend = watcher.backend_name(), "Using native file watcher");
                    Ok(Box::new(watcher))
                }
                Err(e) => {
                    tracing::warn!(
                        "Native file watching unavailable ({}), falling back to polling",
                        e
                    );
                    let mut watcher = PollWatcher::new(poll_interval);
                    watcher.watch(path)?;
                    Ok(Box::new(watcher))
                }
            }
        }
    }
}
