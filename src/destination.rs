// SPDX-License-Identifier: Apache-2.0

//! File destination.
//!
//! Appends each record payload to the configured file as one newline
//! terminated line. Writes are sequential and unbuffered; a failed batch
//! reports how many records were fully appended so the host can retry the rest,
//! and any bytes of the record that failed midway are cut back out.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::FileConnectorConfig;
use crate::connector::Destination;
use crate::error::{Error, Result};
use crate::record::Record;

#[derive(Default)]
pub struct FileDestination {
    config: Option<FileConnectorConfig>,
    file: Option<File>,
}

impl FileDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FileConnectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Some(config),
            file: None,
        })
    }
}

/// Open `path` for appending, creating it empty if it does not exist.
fn open_or_create(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

/// Output that can drop a partially written tail after a failed write.
pub(crate) trait AppendTarget: Write {
    /// Current length of the output in bytes.
    fn end(&self) -> io::Result<u64>;

    /// Cut the output back to `len` bytes.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl AppendTarget for File {
    fn end(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write each payload followed by `\n`, stopping at the first failure.
///
/// A record that fails midway is cut back out, so the output holds exactly
/// the `written` records reported by the error.
pub(crate) fn append_records<W: AppendTarget>(out: &mut W, records: &[Record]) -> Result<usize> {
    let mut line = Vec::new();
    let mut end = out.end()?;

    for (written, record) in records.iter().enumerate() {
        line.clear();
        line.extend_from_slice(&record.payload);
        line.push(b'\n');

        if let Err(source) = out.write_all(&line) {
            if let Err(e) = out.truncate_to(end) {
                warn!(error = %e, offset = end, "Unable to remove partially written record");
            }
            return Err(Error::Write { written, source });
        }
        end += line.len() as u64;
    }

    Ok(records.len())
}

#[async_trait]
impl Destination for FileDestination {
    async fn configure(&mut self, params: &HashMap<String, String>) -> Result<()> {
        let config = FileConnectorConfig::from_params(params)?;
        config.validate()?;
        self.config = Some(config);
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        let config = self.config.as_ref().ok_or(Error::NotConfigured)?;

        let file = open_or_create(&config.path)?;
        info!(path = ?config.path, "Opened destination file");

        // Re-opening releases the previous handle
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, records: &[Record]) -> Result<usize> {
        let file = self.file.as_mut().ok_or(Error::NotOpen("destination"))?;
        let written = append_records(file, records)?;
        debug!(count = written, "Appended records");
        Ok(written)
    }

    async fn teardown(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            // Surface I/O errors that dropping the handle would swallow
            file.sync_all()?;
            debug!("Closed destination file");
        }
        Ok(())
    }
}
