// SPDX-License-Identifier: Apache-2.0

//! Tailing engine.
//!
//! A [`Tailer`] opens a file at a byte offset and follows it as it grows,
//! producing one [`LineEvent`] per complete line in file order.
//!
//! Architecture:
//! - A follower on a dedicated OS thread reads lines from the cursor and waits
//!   on a file watcher (native notifications or polling) when it reaches EOF
//! - Lines are handed to the tailer through a bounded channel
//! - [`Tailer::next_line`] is the only suspension point for callers and races
//!   the channel against the caller's cancellation token

mod error;
mod follow;
pub mod reader;
pub mod watcher;

pub use error::TailError;
pub use reader::LineReader;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::bounded_channel::{self, BoundedReceiver};

use follow::Follower;
use watcher::{WatchMode, create_watcher};

/// Tuning for the tail follower
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Watch mode: auto, native, or poll
    pub watch_mode: WatchMode,
    /// Longest time the follower waits before re-reading the file
    pub poll_interval: Duration,
    /// Debounce interval for native events
    pub debounce_interval: Duration,
    /// Lines buffered between the follower and the reader
    pub channel_size: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            watch_mode: WatchMode::Auto,
            poll_interval: Duration::from_millis(250),
            debounce_interval: Duration::from_millis(100),
            channel_size: 128,
        }
    }
}

/// One newly observed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    /// 1-based, counted from the start of this tail session
    pub line_number: u64,
    /// Raw line bytes without the trailing newline
    pub text: Bytes,
    /// Byte offset just after this line, where a resumed session starts
    pub offset: u64,
}

/// Handle to a running tail session.
pub struct Tailer {
    path: PathBuf,
    lines_rx: Option<BoundedReceiver<LineEvent>>,
    /// Terminal error left by the follower before it closed the channel
    error: Arc<Mutex<Option<Arc<TailError>>>>,
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Tailer {
    /// Open `path` at `offset` and start following it.
    pub fn start(
        path: impl AsRef<Path>,
        offset: u64,
        config: &TailConfig,
    ) -> Result<Self, TailError> {
        let path = path.as_ref().to_path_buf();

        let reader = LineReader::open(&path, offset).map_err(|source| TailError::Open {
            path: path.clone(),
            source,
        })?;
        let watcher = create_watcher(
            config.watch_mode,
            config.poll_interval,
            config.debounce_interval,
            &path,
        )?;

        let (lines_tx, lines_rx) = bounded_channel::bounded(config.channel_size.max(1));
        let error = Arc::new(Mutex::new(None));
        let stop = CancellationToken::new();

        let mut follower = Follower::new(reader, watcher, lines_tx, config.poll_interval);
        let thread_error = error.clone();
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("file-tail".to_string())
            .spawn(move || {
                if let Err(e) = follower.run(&thread_stop) {
                    error!(error = %e, "Tail follower failed");
                    if let Ok(mut slot) = thread_error.lock() {
                        *slot = Some(Arc::new(e));
                    }
                }
                // Closing the channel only after the error is stored lets the
                // reader see it once the queue is drained
                drop(follower);
                debug!("Tail follower stopped");
            })?;

        Ok(Self {
            path,
            lines_rx: Some(lines_rx),
            error,
            stop,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next line.
    ///
    /// Returns `Ok(None)` once the stream is closed without error (after
    /// [`Tailer::stop`]), or [`TailError::Cancelled`] if `cancel` fires first.
    /// Cancellation never consumes a pending line. If the follower failed,
    /// every call after the queue is drained returns [`TailError::Failed`].
    pub async fn next_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<LineEvent>, TailError> {
        let received = {
            let Some(rx) = self.lines_rx.as_mut() else {
                return Ok(None);
            };

            select! {
                biased;

                _ = cancel.cancelled() => return Err(TailError::Cancelled),
                line = rx.next() => line,
            }
        };

        match received {
            Some(line) => Ok(Some(line)),
            None => match self.terminal_error() {
                Some(e) => Err(TailError::Failed(e)),
                None => Ok(None),
            },
        }
    }

    fn terminal_error(&self) -> Option<Arc<TailError>> {
        self.error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Stop following and release the watcher. Safe to call repeatedly.
    pub async fn stop(&mut self) -> Result<(), TailError> {
        self.stop.cancel();
        // Unblocks a follower waiting for channel capacity
        drop(self.lines_rx.take());

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(())) => {
                debug!(path = ?self.path, "Tailer stopped");
                Ok(())
            }
            _ => Err(TailError::FollowerPanicked),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Tailer {
    fn drop(&mut self) {
        // The follower exits on its own within one poll interval
        self.stop.cancel();
        self.lines_rx.take();
    }
}
