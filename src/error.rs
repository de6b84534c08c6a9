// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::position::PositionError;
use crate::tail::TailError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tail(TailError),

    /// The caller's cancellation signal fired. Nothing was consumed.
    #[error("operation cancelled")]
    Cancelled,

    #[error("connector is not configured")]
    NotConfigured,

    #[error("{0} is not open")]
    NotOpen(&'static str),

    /// A batch write stopped early. `written` records were appended in full.
    #[error("write failed after {written} records: {source}")]
    Write {
        written: usize,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True when the error is the cancellation control signal rather than a
    /// failure of the file or the data.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Number of records durably appended before a write failure.
    pub fn written(&self) -> Option<usize> {
        match self {
            Error::Write { written, .. } => Some(*written),
            _ => None,
        }
    }
}

impl From<TailError> for Error {
    fn from(e: TailError) -> Self {
        match e {
            TailError::Cancelled => Error::Cancelled,
            other => Error::Tail(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
