// SPDX-License-Identifier: Apache-2.0

//! Log file receiver implementation.
//!
//! Resolves the configured URL into host/path identifiers, compiles the
//! optional filter expression, resolves the configured decoder, then runs a
//! read-decode-filter-forward loop over fixed-size chunks of the file.
//! With tailing enabled, end-of-file triggers a sleep-and-retry instead of
//! shutdown, so appended content keeps flowing.

use std::path::PathBuf;

use opentelemetry::metrics::Counter;
use opentelemetry::KeyValue;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::select;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::filter::FilterRule;
use crate::model::{LogEvent, APPLICATION_KEY, HOSTNAME_KEY};
use crate::receivers::get_meter;
use crate::receivers::logfile::config::LogFileReceiverConfig;
use crate::receivers::logfile::decoder;
use crate::receivers::logfile::error::{Error, Result};
use crate::receivers::output::EventOutput;

/// Host identifier used when the file URL has no host component.
const FILE_HOST: &str = "file";

/// Number of bytes requested per read.
const READ_CHUNK_SIZE: usize = 10_000;

pub struct LogFileReceiver {
    config: LogFileReceiverConfig,
    output: Option<EventOutput<LogEvent>>,
}

impl LogFileReceiver {
    pub fn new(
        config: LogFileReceiverConfig,
        output: Option<EventOutput<LogEvent>>,
    ) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        info!(
            file_url = %config.file_url,
            decoder = %config.decoder,
            tailing = config.tailing,
            "Log file receiver initialized"
        );

        Ok(Self { config, output })
    }

    /// Run the receiver. By default the processing loop is spawned onto
    /// `task_set`; with `use_current_thread` set it runs on the caller's
    /// task and `start` returns once processing completes.
    ///
    /// All processing failures are terminal to the loop and reported via
    /// logging, never propagated to the caller.
    pub async fn start(
        self,
        task_set: &mut JoinSet<std::result::Result<(), BoxError>>,
        receivers_cancel: &CancellationToken,
    ) {
        let cancel = receivers_cancel.clone();
        let config = self.config;
        let output = self.output;

        info!(file_url = %config.file_url, "Log file receiver starting");

        if config.use_current_thread {
            run_log_file_receiver(config, output, cancel).await;
        } else {
            task_set.spawn(async move {
                run_log_file_receiver(config, output, cancel).await;
                Ok(())
            });
        }
    }
}

/// Metrics counters for the log file receiver.
struct ReceiverMetrics {
    accepted: Counter<u64>,
    refused: Counter<u64>,
    filtered: Counter<u64>,
    tags: [KeyValue; 1],
}

impl ReceiverMetrics {
    fn new() -> Self {
        Self {
            accepted: get_meter()
                .u64_counter("logsaw_receiver_accepted_log_events")
                .with_description(
                    "Number of log events successfully decoded and forwarded downstream.",
                )
                .with_unit("log_events")
                .build(),
            refused: get_meter()
                .u64_counter("logsaw_receiver_refused_log_events")
                .with_description("Number of log events that could not be forwarded downstream.")
                .with_unit("log_events")
                .build(),
            filtered: get_meter()
                .u64_counter("logsaw_receiver_filtered_log_events")
                .with_description("Number of log events rejected by the filter expression.")
                .with_unit("log_events")
                .build(),
            tags: [KeyValue::new("receiver", "logfile")],
        }
    }

    fn add_accepted(&self, count: u64) {
        if count > 0 {
            self.accepted.add(count, &self.tags);
        }
    }

    fn add_refused(&self, count: u64) {
        if count > 0 {
            self.refused.add(count, &self.tags);
        }
    }

    fn add_filtered(&self, count: u64) {
        if count > 0 {
            self.filtered.add(count, &self.tags);
        }
    }
}

/// Host and path identifiers resolved from the file URL. Forwarded events
/// carrying `hostname`/`application` properties have them overwritten with
/// these so every event identifies its source.
fn resolve_source(url: &Url) -> (String, String) {
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => FILE_HOST.to_string(),
    };
    (host, url.path().to_string())
}

/// Filesystem path for a `file://` URL.
fn resolve_file_path(url: &Url) -> std::result::Result<PathBuf, String> {
    if url.scheme() != "file" {
        return Err(format!("unsupported URL scheme: {}", url.scheme()));
    }
    url.to_file_path()
        .or_else(|_| Ok(PathBuf::from(url.path())))
}

async fn run_log_file_receiver(
    config: LogFileReceiverConfig,
    output: Option<EventOutput<LogEvent>>,
    cancel: CancellationToken,
) {
    let url = match Url::parse(&config.file_url) {
        Ok(url) => url,
        Err(e) => {
            error!(file_url = %config.file_url, "malformed file URL: {}", e);
            return;
        }
    };
    let (host, path) = resolve_source(&url);

    let filter = match &config.filter_expression {
        Some(expression) => match FilterRule::parse(expression) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(expression = %expression, "invalid filter expression: {}", e);
                None
            }
        },
        None => None,
    };

    let mut decoder = match decoder::resolve(&config.decoder) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!(decoder = %config.decoder, "cannot resolve decoder: {}", e);
            return;
        }
    };

    let file_path = match resolve_file_path(&url) {
        Ok(file_path) => file_path,
        Err(e) => {
            error!(file_url = %config.file_url, "{}", e);
            return;
        }
    };

    let file = match File::open(&file_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %file_path.display(), "file not available");
            return;
        }
        Err(e) => {
            warn!(path = %file_path.display(), "unable to open file: {}", e);
            return;
        }
    };

    debug!(file_url = %config.file_url, "processing starting");

    let metrics = ReceiverMetrics::new();
    let mut reader = BufReader::new(file);
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let mut carry: Vec<u8> = Vec::new();

    'read: loop {
        let n = select! {
            _ = cancel.cancelled() => {
                info!("log file receiver cancelled");
                break;
            }

            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    if !config.tailing {
                        break;
                    }
                    // end of file while tailing: wait for the file to grow
                    select! {
                        _ = cancel.cancelled() => {
                            info!("log file receiver cancelled");
                            break 'read;
                        }
                        _ = sleep(config.poll_interval) => continue,
                    }
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("error reading file: {}", e);
                    break;
                }
            }
        };

        let chunk = complete_utf8(&mut carry, &buf[..n]);
        for mut event in decoder.decode(&chunk) {
            let keep = filter.as_ref().map(|rule| rule.matches(&event)).unwrap_or(true);
            if !keep {
                metrics.add_filtered(1);
                continue;
            }

            if event.property(HOSTNAME_KEY).is_some() {
                event.set_property(HOSTNAME_KEY, host.as_str());
            }
            if event.property(APPLICATION_KEY).is_some() {
                event.set_property(APPLICATION_KEY, path.as_str());
            }

            let Some(output) = &output else {
                // no output configured, just discard
                continue;
            };
            select! {
                _ = cancel.cancelled() => {
                    info!("log file receiver cancelled");
                    break 'read;
                }
                sent = output.send(event) => match sent {
                    Ok(()) => metrics.add_accepted(1),
                    Err(_) => {
                        metrics.add_refused(1);
                        debug!("event stream closed, stopping");
                        break 'read;
                    }
                }
            }
        }
    }

    debug!(file_url = %config.file_url, "processing complete");
}

/// Append `bytes` to any carried partial sequence and return the longest
/// valid UTF-8 prefix, keeping an incomplete trailing sequence for the next
/// read. Invalid bytes are replaced rather than dropped.
fn complete_utf8(carry: &mut Vec<u8>, bytes: &[u8]) -> String {
    carry.extend_from_slice(bytes);
    match std::str::from_utf8(carry) {
        Ok(s) => {
            let chunk = s.to_string();
            carry.clear();
            chunk
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let chunk = String::from_utf8_lossy(&carry[..valid]).into_owned();
            carry.drain(..valid);
            chunk
        }
        Err(_) => {
            let chunk = String::from_utf8_lossy(carry).into_owned();
            carry.clear();
            chunk
        }
    }
}
