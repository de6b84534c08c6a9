// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bounded_channel::BoundedSender;

use super::LineEvent;
use super::error::TailError;
use super::reader::LineReader;
use super::watcher::{FileEventKind, FileWatcher};

/// Reads lines from the cursor, hands them to the tailer and waits for the
/// file to grow. Runs on the tailer's dedicated OS thread.
pub(super) struct Follower {
    reader: LineReader,
    watcher: Box<dyn FileWatcher + Send>,
    lines_tx: BoundedSender<LineEvent>,
    poll_interval: Duration,
    /// Lines delivered in this session
    line_number: u64,
}

impl Follower {
    pub(super) fn new(
        reader: LineReader,
        watcher: Box<dyn FileWatcher + Send>,
        lines_tx: BoundedSender<LineEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            watcher,
            lines_tx,
            poll_interval,
            line_number: 0,
        }
    }

    /// Follow the file until `stop` fires, the receiving side goes away, or an
    /// unrecoverable error occurs.
    pub(super) fn run(&mut self, stop: &CancellationToken) -> Result<(), TailError> {
        debug!(
            path = ?self.reader.path(),
            offset = self.reader.offset(),
            backend = self.watcher.backend_name(),
            "Tail follower started"
        );

        loop {
            while let Some(text) = self.reader.next_line()? {
                self.line_number += 1;
                let event = LineEvent {
                    line_number: self.line_number,
                    text: Bytes::from(text),
                    offset: self.reader.offset(),
                };

                if self.lines_tx.send_blocking(event).is_err() {
                    return Ok(());
                }
                if stop.is_cancelled() {
                    return Ok(());
                }
            }

            if self.reader.is_truncated()? {
                return Err(TailError::Truncated {
                    offset: self.reader.offset(),
                    len: self.reader.file_len()?,
                });
            }

            if stop.is_cancelled() || self.lines_tx.is_disconnected() {
                return Ok(());
            }

            // Re-read on any event, and at least once per poll interval
            let events = self.watcher.recv_timeout(self.poll_interval)?;
            for event in &events {
                if event.kind == FileEventKind::Remove {
                    debug!(paths = ?event.paths, "Tailed file removed, keeping open handle");
                }
            }
            if !events.is_empty() {
                trace!(count = events.len(), "File change events received");
            }
        }
    }
}
