// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::watcher::WatcherError;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("could not tail file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file watch failed: {0}")]
    Watcher(#[from] WatcherError),

    /// The file shrank below the read cursor.
    #[error("file truncated to {len} bytes below read offset {offset}")]
    Truncated { offset: u64, len: u64 },

    #[error("waiting for the next line was cancelled")]
    Cancelled,

    #[error("tail follower thread panicked")]
    FollowerPanicked,

    /// The follower stopped on this error. Returned by every read after the
    /// queued lines are drained.
    #[error(transparent)]
    Failed(Arc<TailError>),
}

impl TailError {
    /// The underlying error, looking through [`TailError::Failed`].
    pub fn cause(&self) -> &TailError {
        match self {
            TailError::Failed(inner) => inner.cause(),
            other => other,
        }
    }
}

