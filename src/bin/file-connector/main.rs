// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::select;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing::{error, info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use file_connector::init::args::FileArgs;
use file_connector::{
    Destination, FileConnectorConfig, FileDestination, FileSource, Position, Record, Source,
};

type BoxError = Box<dyn Error + Send + Sync>;

const DEFAULT_WRITE_BATCH_SIZE: usize = 100;

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Follow a file and print one JSON record per line
    Read(ReadArgs),

    /// Append stdin lines to a file
    Write(WriteArgs),

    /// Return version
    Version,
}

#[derive(Debug, clap::Args)]
struct ReadArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Position returned by a previous read to resume from
    #[arg(long, env = "FILE_CONNECTOR_POSITION")]
    position: Option<String>,

    /// Exit after this many records
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Debug, clap::Args)]
struct WriteArgs {
    /// File to append records to
    #[arg(long, env = "FILE_CONNECTOR_PATH")]
    path: PathBuf,

    /// Number of lines handed to the destination per write
    #[arg(long, default_value_t = DEFAULT_WRITE_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Debug, Parser)]
#[command(name = "file-connector")]
#[command(bin_name = "file-connector")]
#[command(version, about, long_about = None)]
#[command(subcommand_required = true)]
struct Arguments {
    #[arg(
        value_enum,
        long,
        global = true,
        env = "FILE_CONNECTOR_LOG_FORMAT",
        default_value = "text"
    )]
    /// Log format
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

fn main() -> ExitCode {
    let opt = Arguments::parse();

    match opt.command {
        Some(Commands::Version) => {
            println!("{}", get_version())
        }
        Some(command) => {
            let _guard = match setup_logging(&opt.log_format) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("ERROR: failed to setup logging: {}", e);
                    return ExitCode::from(1);
                }
            };

            if let Err(e) = run(command) {
                error!(error = e, "Command failed.");
                return ExitCode::from(1);
            }
        }
        None => {
            // it shouldn't be possible to get here since we mark a subcommand as
            // required
            eprintln!("Must specify a command");
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}

#[tokio::main]
async fn run(command: Commands) -> Result<(), BoxError> {
    let cancel = CancellationToken::new();
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            match signal_wait().await {
                Ok(()) => info!("Shutdown signal received."),
                Err(e) => warn!("Unable to listen for shutdown signals: {}", e),
            }
            token.cancel();
        });
    }

    match command {
        Commands::Read(args) => read(args, cancel).await,
        Commands::Write(args) => write(args, cancel).await,
        Commands::Version => Ok(()),
    }
}

async fn read(args: ReadArgs, cancel: CancellationToken) -> Result<(), BoxError> {
    let mut source = FileSource::with_config(args.file.build_config())?;
    let position = args.position.as_deref().map(Position::from);

    let result = read_records(&mut source, position.as_ref(), args.limit, &cancel).await;
    source.teardown().await?;
    result
}

async fn read_records(
    source: &mut FileSource,
    position: Option<&Position>,
    limit: Option<u64>,
    cancel: &CancellationToken,
) -> Result<(), BoxError> {
    source.open(position).await?;

    let mut stdout = tokio::io::stdout();
    let mut count = 0u64;

    while limit.is_none_or(|limit| count < limit) {
        match source.read(cancel).await {
            Ok(record) => {
                let mut line = serde_json::to_vec(&record)?;
                line.push(b'\n');
                stdout.write_all(&line).await?;
                count += 1;
            }
            Err(e) if e.is_cancelled() => break,
            Err(e) => return Err(e.into()),
        }
    }

    stdout.flush().await?;
    info!(records = count, "Finished reading");
    Ok(())
}

async fn write(args: WriteArgs, cancel: CancellationToken) -> Result<(), BoxError> {
    let mut destination = FileDestination::with_config(FileConnectorConfig::new(args.path))?;

    let result = write_records(&mut destination, args.batch_size.max(1), &cancel).await;
    destination.teardown().await?;
    result
}

async fn write_records(
    destination: &mut FileDestination,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<(), BoxError> {
    destination.open().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    loop {
        let line = select! {
            _ = cancel.cancelled() => None,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break;
        };

        batch.push(Record::from_payload(line));
        if batch.len() >= batch_size {
            total += destination.write(&batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        total += destination.write(&batch).await?;
    }

    info!(records = total, "Finished writing");
    Ok(())
}

type LoggerGuard = tracing_appender::non_blocking::WorkerGuard;

fn setup_logging(log_format: &LogFormatArg) -> Result<LoggerGuard, BoxError> {
    LogTracer::init()?;

    // stdout carries records, logs go to stderr
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?
        .add_directive("notify=warn".parse()?);

    if *log_format == LogFormatArg::Json {
        let app_name = format!("{}-{}", env!("CARGO_PKG_NAME"), get_version());
        let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking_writer);

        let subscriber = Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(bunyan_formatting_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        use std::io;
        use std::io::IsTerminal;

        // Skip color codes when not in a terminal
        let use_ansi = io::stderr().is_terminal();

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_target(false)
            .with_level(true)
            .with_ansi(use_ansi)
            .compact();

        let subscriber = Registry::default().with(filter).with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(guard)
}

fn get_version() -> String {
    // Set during CI
    let version_build = option_env!("BUILD_SHORT_SHA").unwrap_or("dev");

    format!("{}-{}", env!("CARGO_PKG_VERSION"), version_build)
}

async fn signal_wait() -> std::io::Result<()> {
    let mut sig_term = signal(SignalKind::terminate())?;
    let mut sig_int = signal(SignalKind::interrupt())?;

    select! {
        _ = sig_term.recv() => {},
        _ = sig_int.recv() => {},
    }
    Ok(())
}
