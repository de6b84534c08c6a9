// SPDX-License-Identifier: Apache-2.0

//! Native file watcher using the `notify` crate.
//!
//! Uses OS-level file system notifications:
//! - Linux: inotify
//! - macOS: FSEvents
//! - Windows: ReadDirectoryChangesW
//!
//! Each watcher owns its own notify backend. Dropping it removes the watches
//! and stops the backend's event thread.

use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError, channel};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::traits::{FileEvent, FileEventKind, FileWatcher, WatcherError};

pub struct NativeWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
}

impl NativeWatcher {
    pub fn new(debounce: Duration) -> Result<Self, WatcherError> {
        let (tx, rx) = channel();

        let config = Config::default().with_poll_interval(debounce);

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            config,
        )
        .map_err(|e| WatcherError::Init(e.to_string()))?;

        Ok(Self {
            watcher,
            receiver: rx,
        })
    }

    fn convert_event(event: Event) -> Option<FileEvent> {
        let kind = match event.kind {
            EventKind::Create(_) => FileEventKind::Create,
            EventKind::Modify(_) => FileEventKind::Modify,
            EventKind::Remove(_) => FileEventKind::Remove,
            EventKind::Access(_) => return None,
            EventKind::Other | EventKind::Any => FileEventKind::Other,
        };

        Some(FileEvent::new(kind, event.paths))
    }

    fn push(events: &mut Vec<FileEvent>, res: Result<Event, notify::Error>) {
        match res {
            Ok(event) => events.extend(Self::convert_event(event)),
            Err(e) => tracing::warn!("File watcher error: {}", e),
        }
    }
}

impl FileWatcher for NativeWatcher {
    fn watch(&mut self, path: &Path) -> Result<(), WatcherError> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::Watch(e.to_string()))
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<FileEvent>, WatcherError> {
        let mut events = Vec::new();

        match self.receiver.recv_timeout(timeout) {
            Ok(res) => Self::push(&mut events, res),
            Err(RecvTimeoutError::Timeout) => return Ok(events),
            Err(RecvTimeoutError::Disconnected) => return Err(WatcherError::Disconnected),
        }

        // Drain whatever else is already queued so one wakeup covers a burst
        loop {
            match self.receiver.try_recv() {
                Ok(res) => Self::push(&mut events, res),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(WatcherError::Disconnected),
            }
        }

        Ok(events)
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "linux")]
        {
            "inotify"
        }
        #[cfg(target_os = "macos")]
        {
            "FSEvents"
        }
        #[cfg(target_os = "windows")]
        {
            "ReadDirectoryChangesW"
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            "native"
        }
    }
}
