// SPDX-License-Identifier: Apache-2.0

//! Lifecycle seams between the file connector and its host.
//!
//! The host drives every connector through configure → open → repeated
//! read/write → teardown and always calls teardown exactly once, even when an
//! earlier step failed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::destination::FileDestination;
use crate::error::Result;
use crate::position::Position;
use crate::record::Record;
use crate::source::FileSource;

#[async_trait]
pub trait Source: Send {
    /// Parse and validate the host's parameters.
    async fn configure(&mut self, params: &HashMap<String, String>) -> Result<()>;

    /// Start reading at `position`, or at the start of the file when absent.
    async fn open(&mut self, position: Option<&Position>) -> Result<()>;

    /// Block until a record is available or `cancel` fires.
    async fn read(&mut self, cancel: &CancellationToken) -> Result<Record>;

    async fn ack(&mut self, position: &Position) -> Result<()>;

    async fn teardown(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Destination: Send {
    async fn configure(&mut self, params: &HashMap<String, String>) -> Result<()>;

    async fn open(&mut self) -> Result<()>;

    /// Append `records` in order and return how many were written. On failure
    /// the error carries the number of records fully written before it.
    async fn write(&mut self, records: &[Record]) -> Result<usize>;

    async fn teardown(&mut self) -> Result<()>;
}

/// Static description of the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    pub name: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
}

pub fn specification() -> Specification {
    Specification {
        name: "file",
        summary: "A file source and destination connector.",
        description: "The file source listens to a local file and emits one record per \
            appended line. The destination appends each record payload to a local file \
            as a new line.",
        version: env!("CARGO_PKG_VERSION"),
        author: env!("CARGO_PKG_AUTHORS"),
    }
}

/// Entry point a host uses to instantiate the connector.
pub struct Connector {
    pub specification: fn() -> Specification,
    pub new_source: fn() -> Box<dyn Source>,
    pub new_destination: fn() -> Box<dyn Destination>,
}

pub const CONNECTOR: Connector = Connector {
    specification,
    new_source,
    new_destination,
};

fn new_source() -> Box<dyn Source> {
    Box::new(FileSource::new())
}

fn new_destination() -> Box<dyn Destination> {
    Box::new(FileDestination::new())
}
