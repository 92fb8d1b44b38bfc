// SPDX-License-Identifier: Apache-2.0

use tracing::warn;

use super::Decoder;
use crate::model::LogEvent;

/// Decoder for newline-delimited JSON log events.
///
/// Each line is one serialized [`LogEvent`]; a line is decoded once its
/// newline arrives, so a trailing unterminated line stays buffered. Lines
/// that fail to deserialize are skipped with a diagnostic.
#[derive(Default)]
pub struct JsonLinesDecoder {
    buffer: String,
}

impl JsonLinesDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for JsonLinesDecoder {
    fn decode(&mut self, chunk: &str) -> Vec<LogEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "skipping undecodable JSON log line"),
            }
        }

        events
    }
}
