// SPDX-License-Identifier: Apache-2.0

//! Polling-based file watcher for file systems where native notifications
//! are unavailable or unreliable (e.g., NFS).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use super::traits::{FileEvent, FileEventKind, FileWatcher, WatcherError};

/// File metadata for change detection
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileState {
    modified: Option<SystemTime>,
    size: u64,
}

impl FileState {
    fn stat(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok(),
            size: metadata.len(),
        })
    }
}

/// Periodically stats the watched files and reports size or mtime changes.
pub struct PollWatcher {
    /// Last observed state per watched file, None while it does not exist
    files: HashMap<PathBuf, Option<FileState>>,
    poll_interval: Duration,
    last_poll: Instant,
}

impl PollWatcher {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            files: HashMap::new(),
            poll_interval,
            last_poll: Instant::now(),
        }
    }

    fn scan(&mut self) -> Vec<FileEvent> {
        let mut events = Vec::new();

        for (path, last) in self.files.iter_mut() {
            let current = FileState::stat(path);
            let kind = match (&*last, &current) {
                (None, Some(_)) => Some(FileEventKind::Create),
                (Some(_), None) => Some(FileEventKind::Remove),
                (Some(old), Some(new)) if old != new => Some(FileEventKind::Modify),
                _ => None,
            };

            if let Some(kind) = kind {
                events.push(FileEvent::new(kind, vec![path.clone()]));
            }
            *last = current;
        }

        self.last_poll = Instant::now();
        events
    }
}

impl FileWatcher for PollWatcher {
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError> {
        // Surface permission problems up front, same as a native watch would
        let state = match fs::metadata(path) {
            Ok(_) => FileState::stat(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(WatcherError::Io(e)),
        };
        self.files.insert(path.to_path_buf(), state);
        Ok(())
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<FileEvent>, WatcherError> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.last_poll.elapsed() >= self.poll_interval {
                let events = self.scan();
                if !events.is_empty() {
                    return Ok(events);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }

            // Sleep until next poll or timeout, whichever is sooner
            let time_to_next_poll = self.poll_interval.saturating_sub(self.last_poll.elapsed());
            let sleep_duration = time_to_next_poll.min(deadline - now);
            if !sleep_duration.is_zero() {
                std::thread::sleep(sleep_duration);
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "poll"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_poll_watcher_detects_append() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.log");
        File::create(&file_path).unwrap();

        let mut watcher = PollWatcher::new(Duration::from_millis(20));
        watcher.watch(&file_path).unwrap();

        {
            let mut file = fs::OpenOptions::new()
                .append(true)
                .open(&file_path)
                .unwrap();
            file.write_all(b"more content\n").unwrap();
        }

        let events = watcher.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Modify);
        assert_eq!(events[0].paths, vec![file_path]);
    }

    #[test]
    fn test_poll_watcher_detects_create_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("later.log");

        let mut watcher = PollWatcher::new(Duration::from_millis(20));
        watcher.watch(&file_path).unwrap();

        File::create(&file_path).unwrap();
        let events = watcher.recv_timeout(Duration::from_millis(500)).unwrap();
        assert!(events.iter().any(|e| e.kind == FileEventKind::Create));

        fs::remove_file(&file_path).unwrap();
        let events = watcher.recv_timeout(Duration::from_millis(500)).unwrap();
        assert!(events.iter().any(|e| e.kind == FileEventKind::Remove));
    }

    #[test]
    fn test_poll_watcher_times_out_without_changes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("quiet.log");
        File::create(&file_path).unwrap();

        let mut watcher = PollWatcher::new(Duration::from_millis(10));
        watcher.watch(&file_path).unwrap();

        let start = Instant::now();
        let events = watcher.recv_timeout(Duration::from_millis(60)).unwrap();
        assert!(events.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_poll_watcher_backend_name() {
        let watcher = PollWatcher::new(Duration::from_millis(100));
        assert_eq!(watcher.backend_name(), "poll");
    }
}
