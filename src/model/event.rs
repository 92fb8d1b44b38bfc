// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Level;

/// Property key carrying the host an event originated from.
pub const HOSTNAME_KEY: &str = "hostname";

/// Property key carrying the application or file path an event originated from.
pub const APPLICATION_KEY: &str = "application";

/// Source location captured by the logging framework, when available.
///
/// `line` stays textual: frameworks emit `?` when the location is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub class: String,
    pub method: String,
    pub file: String,
    pub line: String,
}

/// A decoded log event.
///
/// Events are transient: a receiver owns an event while it is in flight and
/// the downstream sink takes ownership once it is forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub level: Level,

    /// Dotted logger name, e.g. `com.example.Service`.
    pub logger: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,

    /// Nested diagnostic context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndc: Option<String>,

    /// Rendered stack trace, when the event carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throwable: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,

    /// MDC-style properties, including the well-known [`HOSTNAME_KEY`] and
    /// [`APPLICATION_KEY`] entries.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(logger: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            logger: logger.into(),
            message: message.into(),
            thread: None,
            ndc: None,
            throwable: None,
            location: None,
            properties: HashMap::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Event time as milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
