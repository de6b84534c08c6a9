// SPDX-License-Identifier: Apache-2.0

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::FileConnectorConfig;
use crate::tail::TailConfig;
use crate::tail::watcher::WatchMode;

/// Watch mode for file system monitoring
#[derive(Copy, Clone, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum WatchModeArg {
    /// Automatically select the best watching strategy (native first, poll fallback)
    #[default]
    Auto,
    /// Force native file system watching (inotify/kqueue/FSEvents)
    Native,
    /// Force polling mode (use for NFS or when native watching is unreliable)
    Poll,
}

impl From<WatchModeArg> for WatchMode {
    fn from(w: WatchModeArg) -> Self {
        match w {
            WatchModeArg::Auto => WatchMode::Auto,
            WatchModeArg::Native => WatchMode::Native,
            WatchModeArg::Poll => WatchMode::Poll,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FileArgs {
    /// File to read records from or append records to
    #[arg(long, env = "FILE_CONNECTOR_PATH")]
    pub path: PathBuf,

    /// Watch mode: auto (default), native (inotify/kqueue/FSEvents), poll (for NFS)
    #[arg(
        value_enum,
        long,
        env = "FILE_CONNECTOR_WATCH_MODE",
        default_value = "auto"
    )]
    pub watch_mode: WatchModeArg,

    /// Longest time in milliseconds to wait before re-reading the file
    #[arg(long, env = "FILE_CONNECTOR_POLL_INTERVAL_MS", default_value = "250")]
    pub poll_interval_ms: u64,

    /// Debounce interval in milliseconds for the native file watcher
    #[arg(
        long,
        env = "FILE_CONNECTOR_DEBOUNCE_INTERVAL_MS",
        default_value = "100"
    )]
    pub debounce_interval_ms: u64,
}

impl FileArgs {
    /// Build the connector config from command line args
    pub fn build_config(&self) -> FileConnectorConfig {
        FileConnectorConfig {
            path: self.path.clone(),
            tail: TailConfig {
                watch_mode: self.watch_mode.into(),
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                debounce_interval: Duration::from_millis(self.debounce_interval_ms),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        file: FileArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test", "--path", "/tmp/in.txt"]).unwrap();
        let config = cli.file.build_config();
        assert_eq!(config.path, PathBuf::from("/tmp/in.txt"));
        assert_eq!(config.tail.watch_mode, WatchMode::Auto);
        assert_eq!(config.tail.poll_interval, Duration::from_millis(250));
        assert_eq!(config.tail.debounce_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_overrides() {
        let cli = TestCli::try_parse_from([
            "test",
            "--path",
            "/tmp/in.txt",
            "--watch-mode",
            "poll",
            "--poll-interval-ms",
            "20",
        ])
        .unwrap();
        let config = cli.file.build_config();
        assert_eq!(config.tail.watch_mode, WatchMode::Poll);
        assert_eq!(config.tail.poll_interval, Duration::from_millis(20));
    }
}
