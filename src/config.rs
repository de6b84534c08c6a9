// SPDX-License-Identifier: Apache-2.0

//! Configuration shared by the file source and destination.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::tail::TailConfig;
use crate::tail::watcher::WatchMode;

/// File path used to read or write records.
pub const PATH_KEY: &str = "path";
/// Watch strategy for the source: auto, native or poll.
pub const WATCH_MODE_KEY: &str = "watch_mode";
/// Maximum time the source waits before re-reading the file, in milliseconds.
pub const POLL_INTERVAL_MS_KEY: &str = "poll_interval_ms";

#[derive(Debug, Clone)]
pub struct FileConnectorConfig {
    /// File path used by the connector to read/write records
    pub path: PathBuf,
    /// Tail tuning, only used by the source
    pub tail: TailConfig,
}

impl FileConnectorConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tail: TailConfig::default(),
        }
    }

    /// Build a configuration from the host's string parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let path = match params.get(PATH_KEY) {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => {
                return Err(Error::Config(format!(
                    "config value \"{}\" is required",
                    PATH_KEY
                )));
            }
        };

        let mut config = Self::new(path);

        if let Some(mode) = params.get(WATCH_MODE_KEY) {
            config.tail.watch_mode = mode.parse::<WatchMode>().map_err(Error::Config)?;
        }

        if let Some(ms) = params.get(POLL_INTERVAL_MS_KEY) {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!(
                    "config value \"{}\" must be a number of milliseconds: {}",
                    POLL_INTERVAL_MS_KEY, e
                ))
            })?;
            config.tail.poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.path)?;

        if self.tail.poll_interval.is_zero() {
            return Err(Error::Config(format!(
                "config value \"{}\" must be greater than zero",
                POLL_INTERVAL_MS_KEY
            )));
        }

        Ok(())
    }
}

/// Check that `path` can be used by either connector direction.
///
/// A path that does not exist yet is accepted: the destination creates it and
/// the source fails at open time if it still cannot find it. Any other stat
/// failure is a configuration error.
pub fn validate_path(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Config(format!(
            "config value \"{}\" does not contain a valid path: {}",
            PATH_KEY, e
        ))),
    }
}
