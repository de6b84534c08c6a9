// SPDX-License-Identifier: Apache-2.0

//! Line-oriented file connector.
//!
//! The source follows a local file and emits one record per appended line,
//! with a resumable byte-offset position. The destination appends record
//! payloads to a local file, one per line.

pub mod bounded_channel;
pub mod config;
pub mod connector;
pub mod destination;
pub mod error;
pub mod init;
pub mod position;
pub mod record;
pub mod source;
pub mod tail;

pub use config::{FileConnectorConfig, validate_path};
pub use connector::{CONNECTOR, Connector, Destination, Source, Specification, specification};
pub use destination::FileDestination;
pub use error::{Error, Result};
pub use position::Position;
pub use record::{METADATA_FILE_PATH, Record};
pub use source::FileSource;
