// SPDX-License-Identifier: Apache-2.0

//! Configuration for the log file receiver.

use std::time::Duration;

/// Default decoder registry name.
pub const DEFAULT_DECODER: &str = "xml";

/// Default delay between re-reads when tailing a file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the log file receiver.
#[derive(Debug, Clone)]
pub struct LogFileReceiverConfig {
    /// URL of the file to read. Only `file://` URLs are openable.
    pub file_url: String,

    /// Registry name of the decoder turning file content into events.
    pub decoder: String,

    /// Optional filter expression; only matching events are forwarded.
    /// A failing compile logs a warning and disables filtering.
    pub filter_expression: Option<String>,

    /// Keep polling the file for appended content after reaching its end.
    pub tailing: bool,

    /// Run the processing loop on the caller's task instead of a spawned
    /// one.
    pub use_current_thread: bool,

    /// Delay between re-reads while tailing.
    pub poll_interval: Duration,
}

impl Default for LogFileReceiverConfig {
    fn default() -> Self {
        Self {
            file_url: String::new(),
            decoder: DEFAULT_DECODER.to_string(),
            filter_expression: None,
            tailing: false,
            use_current_thread: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LogFileReceiverConfig {
    pub fn new(file_url: impl Into<String>) -> Self {
        Self {
            file_url: file_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.file_url.is_empty() {
            return Err("file URL must be specified".to_string());
        }

        if self.poll_interval.is_zero() {
            return Err("poll interval must be non-zero".to_string());
        }

        Ok(())
    }

    pub fn with_decoder(mut self, decoder: impl Into<String>) -> Self {
        self.decoder = decoder.into();
        self
    }

    pub fn with_filter_expression(mut self, expression: Option<String>) -> Self {
        self.filter_expression = expression;
        self
    }

    pub fn with_tailing(mut self, tailing: bool) -> Self {
        self.tailing = tailing;
        self
    }

    pub fn with_use_current_thread(mut self, use_current_thread: bool) -> Self {
        self.use_current_thread = use_current_thread;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
