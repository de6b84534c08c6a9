// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::position::Position;

/// Metadata key carrying the configured file path on every source record.
pub const METADATA_FILE_PATH: &str = "file.path";

/// A single line-delimited record.
///
/// Records produced by the source carry the line number as key, the line
/// text as payload and the post-line byte offset as position. The
/// destination only looks at the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub position: Position,
    pub metadata: BTreeMap<String, String>,
    #[serde(serialize_with = "lossy_utf8")]
    pub key: Bytes,
    #[serde(serialize_with = "lossy_utf8")]
    pub payload: Bytes,
}

impl Record {
    pub fn new(position: Position, key: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            position,
            metadata: BTreeMap::new(),
            key: key.into(),
            payload: payload.into(),
        }
    }

    /// Build a record that only carries a payload, as handed to a destination.
    pub fn from_payload(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

fn lossy_utf8<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_bytes_as_text() {
        let record = Record::new(Position::from_offset(2), "1", "x")
            .with_metadata(METADATA_FILE_PATH, "/tmp/in.txt");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["position"], "2");
        assert_eq!(json["key"], "1");
        assert_eq!(json["payload"], "x");
        assert_eq!(json["metadata"]["file.path"], "/tmp/in.txt");
    }

    #[test]
    fn test_from_payload_has_empty_position() {
        let record = Record::from_payload("hello");
        assert!(record.position.is_empty());
        assert!(record.key.is_empty());
        assert_eq!(&record.payload[..], b"hello");
    }
}
