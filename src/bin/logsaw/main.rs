// SPDX-License-Identifier: Apache-2.0

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::select;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use logsaw::logger_tree::{LoggerTreeHandle, LoggerTreeIndexer, TreeSnapshot};
use logsaw::model::LogEvent;
use logsaw::receivers::logfile::{LogFileReceiver, LogFileReceiverConfig};
use logsaw::receivers::output::{event_channel, EventStream};

const EVENT_QUEUE_SIZE: usize = 1_000;

#[derive(Debug, Parser)]
#[command(name = "logsaw")]
#[command(bin_name = "logsaw")]
#[command(version, about = "Tail log files and decode them into structured events", long_about = None)]
struct Arguments {
    /// URL of the log file to read
    #[arg(long, env = "LOGSAW_FILE_URL")]
    file_url: String,

    /// Decoder used to turn file content into events
    #[arg(long, env = "LOGSAW_DECODER", default_value = "xml")]
    decoder: String,

    /// Filter expression; only matching events are emitted
    #[arg(long, env = "LOGSAW_FILTER")]
    filter: Option<String>,

    /// Keep polling the file for appended content
    #[arg(long, env = "LOGSAW_FOLLOW", default_value = "false")]
    follow: bool,

    /// Delay between re-reads while following, in seconds
    #[arg(long, env = "LOGSAW_POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Output format for decoded events
    #[arg(value_enum, long, env = "LOGSAW_OUTPUT", default_value = "text")]
    output: OutputFormat,

    /// Index logger names and print the tree on exit
    #[arg(long, env = "LOGSAW_LOGGER_TREE", default_value = "false")]
    logger_tree: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let args = Arguments::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOGSAW_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ERROR: cannot start runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Arguments) -> Result<(), BoxError> {
    let cancel = CancellationToken::new();
    let mut task_set: JoinSet<Result<(), BoxError>> = JoinSet::new();

    let (output, events) = event_channel::<LogEvent>(EVENT_QUEUE_SIZE);

    let config = LogFileReceiverConfig::new(&args.file_url)
        .with_decoder(&args.decoder)
        .with_filter_expression(args.filter.clone())
        .with_tailing(args.follow)
        .with_poll_interval(Duration::from_secs(args.poll_interval_secs));

    let receiver = LogFileReceiver::new(config, Some(output))?;
    receiver.start(&mut task_set, &cancel).await;

    let tree = if args.logger_tree {
        let (handle, indexer) = LoggerTreeIndexer::new();
        indexer.start(&mut task_set, &cancel);
        Some(handle)
    } else {
        None
    };

    consume_events(events, &tree, args.output).await;

    if let Some(handle) = &tree {
        if let Some(snapshot) = handle.snapshot().await {
            print_tree(&snapshot, 0);
        }
    }

    cancel.cancel();
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("task error: {}", e),
            Err(e) => error!("task join error: {}", e),
        }
    }

    Ok(())
}

/// Drain the event stream until the receiver finishes or Ctrl-C arrives.
async fn consume_events(
    mut events: EventStream<LogEvent>,
    tree: &Option<LoggerTreeHandle>,
    format: OutputFormat,
) {
    loop {
        select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("cannot listen for shutdown signal: {}", e);
                }
                info!("shutdown signal received");
                break;
            }

            event = events.next() => match event {
                Some(event) => {
                    if let Some(handle) = tree {
                        handle.insert(event.logger.clone());
                    }
                    print_event(&event, format);
                }
                None => break,
            }
        }
    }
}

fn print_event(event: &LogEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("cannot encode event: {}", e),
        },
        OutputFormat::Text => println!(
            "{} {:<5} [{}] {} - {}",
            event.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            event.level,
            event.thread.as_deref().unwrap_or("-"),
            event.logger,
            event.message
        ),
    }
}

fn print_tree(node: &TreeSnapshot, depth: usize) {
    println!("{}{}", "  ".repeat(depth), node.label);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}
