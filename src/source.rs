// SPDX-License-Identifier: Apache-2.0

//! File source.
//!
//! Follows a single file and emits one record per line. The record position is
//! the byte offset just after the line, so reopening at a returned position
//! continues with the next line. Line numbers used as keys are counted per
//! open: after a reopen at a non-zero position numbering starts again at 1
//! while the byte offsets keep increasing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::FileConnectorConfig;
use crate::connector::Source;
use crate::error::{Error, Result};
use crate::position::{self, Position};
use crate::record::{METADATA_FILE_PATH, Record};
use crate::tail::{LineEvent, Tailer};

#[derive(Default)]
pub struct FileSource {
    config: Option<FileConnectorConfig>,
    tailer: Option<Tailer>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already built configuration instead of host parameters.
    pub fn with_config(config: FileConnectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Some(config),
            tailer: None,
        })
    }

    fn to_record(config: &FileConnectorConfig, line: LineEvent) -> Record {
        Record::new(
            position::encode(line.offset),
            line.line_number.to_string(),
            line.text,
        )
        .with_metadata(METADATA_FILE_PATH, config.path.display().to_string())
    }
}

#[async_trait]
impl Source for FileSource {
    async fn configure(&mut self, params: &HashMap<String, String>) -> Result<()> {
        let config = FileConnectorConfig::from_params(params)?;
        config.validate()?;
        self.config = Some(config);
        Ok(())
    }

    async fn open(&mut self, position: Option<&Position>) -> Result<()> {
        let config = self.config.as_ref().ok_or(Error::NotConfigured)?;
        let offset = position::decode(position)?;

        info!(position = offset, path = ?config.path, "seeking...");

        let tailer = Tailer::start(&config.path, offset, &config.tail)?;
        if let Some(mut previous) = self.tailer.replace(tailer) {
            previous.stop().await?;
        }
        Ok(())
    }

    async fn read(&mut self, cancel: &CancellationToken) -> Result<Record> {
        let config = self.config.as_ref().ok_or(Error::NotConfigured)?;
        let tailer = self.tailer.as_mut().ok_or(Error::NotOpen("source"))?;

        match tailer.next_line(cancel).await? {
            Some(line) => Ok(Self::to_record(config, line)),
            None => {
                // Closed without a terminal error: nothing more will arrive
                debug!(path = ?config.path, "Tail stream closed, waiting for cancellation");
                cancel.cancelled().await;
                Err(Error::Cancelled)
            }
        }
    }

    async fn ack(&mut self, _position: &Position) -> Result<()> {
        // Nothing to commit, the position returned by read is the checkpoint
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        if let Some(mut tailer) = self.tailer.take() {
            tailer.stop().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tail::TailError;
    use crate::tail::watcher::WatchMode;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn test_source(path: &Path) -> FileSource {
        let mut config = FileConnectorConfig::new(path);
        config.tail.watch_mode = WatchMode::Poll;
        config.tail.poll_interval = Duration::from_millis(10);
        FileSource::with_config(config).unwrap()
    }

    async fn read(source: &mut FileSource) -> Record {
        let cancel = CancellationToken::new();
        timeout(WAIT, source.read(&cancel))
            .await
            .expect("timed out waiting for record")
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_and_resume() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("in.txt");
        std::fs::write(&path, "x\ny\n").unwrap();

        let mut source = test_source(&path);
        source.open(None).await.unwrap();

        let first = read(&mut source).await;
        assert_eq!(&first.key[..], b"1");
        assert_eq!(&first.payload[..], b"x");
        assert_eq!(first.position, Position::from("2"));
        assert_eq!(
            first.metadata.get(METADATA_FILE_PATH),
            Some(&path.display().to_string())
        );

        let second = read(&mut source).await;
        assert_eq!(&second.key[..], b"2");
        assert_eq!(&second.payload[..], b"y");
        assert_eq!(second.position, Position::from("4"));

        source.teardown().await.unwrap();

        let mut resumed = test_source(&path);
        resumed.open(Some(&first.position)).await.unwrap();
        let again = read(&mut resumed).await;
        assert_eq!(&again.payload[..], b"y");
        // numbering restarts with the session
        assert_eq!(&again.key[..], b"1");
        assert_eq!(again.position, second.position);
        resumed.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_configure_from_params() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.txt");
        std::fs::write(&path, "hello\n").unwrap();

        let params = HashMap::from([
            ("path".to_string(), path.display().to_string()),
            ("watch_mode".to_string(), "poll".to_string()),
            ("poll_interval_ms".to_string(), "10".to_string()),
        ]);

        let mut source = FileSource::new();
        source.configure(&params).await.unwrap();
        source.open(None).await.unwrap();
        assert_eq!(&read(&mut source).await.payload[..], b"hello");
        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_position() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("in.txt");
        std::fs::write(&path, "x\n").unwrap();

        let mut source = test_source(&path);
        let err = source
            .open(Some(&Position::from("not-a-number")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Position(_)));
        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_fails_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = test_source(&temp_dir.path().join("missing.txt"));

        let err = source.open(None).await.unwrap_err();
        assert!(matches!(err, Error::Tail(_)));
        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_before_open() {
        let mut source = FileSource::new();
        let cancel = CancellationToken::new();
        assert!(matches!(
            source.read(&cancel).await,
            Err(Error::NotConfigured)
        ));

        let temp_dir = TempDir::new().unwrap();
        let mut source = test_source(&temp_dir.path().join("x.txt"));
        assert!(matches!(
            source.read(&cancel).await,
            Err(Error::NotOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_read_cancellation_keeps_next_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wait.txt");
        std::fs::File::create(&path).unwrap();

        let mut source = test_source(&path);
        source.open(None).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let err = timeout(WAIT, source.read(&cancel)).await.unwrap().unwrap_err();
        assert!(err.is_cancelled());

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"first\nsecond\n").unwrap();

        let first = read(&mut source).await;
        assert_eq!(&first.key[..], b"1");
        assert_eq!(&first.payload[..], b"first");
        let second = read(&mut source).await;
        assert_eq!(&second.key[..], b"2");

        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_after_truncation_surfaces_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trunc.txt");
        std::fs::write(&path, "abc\n").unwrap();

        let mut source = test_source(&path);
        source.open(None).await.unwrap();
        read(&mut source).await;

        std::fs::write(&path, "").unwrap();

        let cancel = CancellationToken::new();
        for _ in 0..2 {
            let err = timeout(WAIT, source.read(&cancel))
                .await
                .expect("read after a terminal error must not block")
                .unwrap_err();
            assert!(!err.is_cancelled());
            let Error::Tail(tail_err) = &err else {
                panic!("expected a tail error, got {err:?}");
            };
            assert!(matches!(tail_err.cause(), TailError::Truncated { .. }));
            assert_eq!(
                err.to_string(),
                "file truncated to 0 bytes below read offset 4"
            );
        }
        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ack_is_noop() {
        let mut source = FileSource::new();
        source.ack(&Position::from("12")).await.unwrap();
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("td.txt");
        std::fs::write(&path, "a\n").unwrap();

        let mut source = test_source(&path);
        source.teardown().await.unwrap();

        source.open(None).await.unwrap();
        source.teardown().await.unwrap();
        source.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_replaces_running_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("re.txt");
        std::fs::write(&path, "a\nb\n").unwrap();

        let mut source = test_source(&path);
        source.open(None).await.unwrap();
        assert_eq!(&read(&mut source).await.payload[..], b"a");

        source.open(Some(&Position::from("2"))).await.unwrap();
        assert_eq!(&read(&mut source).await.payload[..], b"b");
        source.teardown().await.unwrap();
    }
}
