// SPDX-License-Identifier: Apache-2.0

//! Traits and types for file change watchers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for watcher operations
#[derive(Debug)]
pub enum WatcherError {
    /// Failed to initialize the watcher
    Init(String),
    /// Failed to watch a path
    Watch(String),
    /// IO error
    Io(std::io::Error),
    /// The notification backend went away
    Disconnected,
}

impl fmt::Display for WatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherError::Init(msg) => write!(f, "watcher initialization failed: {}", msg),
            WatcherError::Watch(msg) => write!(f, "watch failed: {}", msg),
            WatcherError::Io(e) => write!(f, "IO error: {}", e),
            WatcherError::Disconnected => write!(f, "watcher channel disconnected"),
        }
    }
}

impl std::error::Error for WatcherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WatcherError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WatcherError {
    fn from(e: std::io::Error) -> Self {
        WatcherError::Io(e)
    }
}

/// Kind of file event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Create,
    Modify,
    Remove,
    Other,
}

/// A change observed on a watched file
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub paths: Vec<PathBuf>,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, paths: Vec<PathBuf>) -> Self {
        Self { kind, paths }
    }
}

/// A source of "this file may have changed" wakeups.
///
/// The tail follower treats every event as a hint to re-read from its cursor,
/// so backends may over-report but should not need to be exact.
pub trait FileWatcher {
    /// Start watching a single file.
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError>;

    /// Block until events arrive or the timeout expires.
    ///
    /// Returns an empty vector when the timeout expires with no events.
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<FileEvent>, WatcherError>;

    /// Name of the backend for logging.
    fn backend_name(&self) -> &'static str;
}
