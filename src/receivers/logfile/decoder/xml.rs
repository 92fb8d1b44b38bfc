// SPDX-License-Identifier: Apache-2.0

use chrono::{TimeZone, Utc};
use regex::Regex;
use tracing::warn;

use super::Decoder;
use crate::model::{Level, LocationInfo, LogEvent};
use crate::receivers::logfile::error::{Error, Result};

const EVENT_OPEN: &str = "<log4j:event";
const EVENT_CLOSE: &str = "</log4j:event>";

/// Attribute pairs inside a tag, e.g. `logger="com.example"`.
const ATTR_PATTERN: &str = r#"([\w:]+)\s*=\s*"([^"]*)""#;

/// Property entries: `<log4j:data name="..." value="..."/>`.
const DATA_PATTERN: &str = r#"<log4j:data\s+name="([^"]*)"\s+value="([^"]*)""#;

/// Decoder for log4j XMLLayout event streams.
///
/// Events look like:
///
/// ```text
/// <log4j:event logger="com.example.Service" timestamp="1714557600000"
///              level="WARN" thread="main">
///   <log4j:message><![CDATA[disk almost full]]></log4j:message>
///   <log4j:properties>
///     <log4j:data name="hostname" value="box-1"/>
///   </log4j:properties>
/// </log4j:event>
/// ```
///
/// Input is not assumed to be a well-formed document: events are scanned
/// for individually, content between them is ignored, and a fragment split
/// across chunks is buffered until its closing tag arrives.
pub struct XmlLayoutDecoder {
    buffer: String,
    attr_re: Regex,
    data_re: Regex,
}

impl XmlLayoutDecoder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            buffer: String::new(),
            attr_re: Regex::new(ATTR_PATTERN).map_err(|e| Error::Pattern(e.to_string()))?,
            data_re: Regex::new(DATA_PATTERN).map_err(|e| Error::Pattern(e.to_string()))?,
        })
    }

    fn parse_event(&self, block: &str) -> Option<LogEvent> {
        let open_end = block.find('>')?;
        let open_tag = &block[..open_end];

        let mut logger = None;
        let mut timestamp = None;
        let mut level = None;
        let mut thread = None;
        for caps in self.attr_re.captures_iter(open_tag) {
            let value = decode_entities(&caps[2]);
            match &caps[1] {
                "logger" => logger = Some(value),
                "timestamp" => timestamp = Some(value),
                "level" => level = Some(value),
                "thread" => thread = Some(value),
                _ => {}
            }
        }

        let logger = logger?;
        let millis: i64 = timestamp?.parse().ok()?;
        let timestamp = Utc.timestamp_millis_opt(millis).single()?;
        let level = level.as_deref().and_then(Level::parse).unwrap_or_default();

        Some(LogEvent {
            timestamp,
            level,
            logger,
            message: element_text(block, "log4j:message").unwrap_or_default(),
            thread: thread.filter(|t| !t.is_empty()),
            ndc: element_text(block, "log4j:NDC"),
            throwable: element_text(block, "log4j:throwable"),
            location: self.parse_location(block),
            properties: self
                .data_re
                .captures_iter(block)
                .map(|caps| (decode_entities(&caps[1]), decode_entities(&caps[2])))
                .collect(),
        })
    }

    fn parse_location(&self, block: &str) -> Option<LocationInfo> {
        let start = block.find("<log4j:locationInfo")?;
        let end = block[start..].find('>')? + start;
        let tag = &block[start..end];

        let mut location = LocationInfo {
            class: String::new(),
            method: String::new(),
            file: String::new(),
            line: String::new(),
        };
        for caps in self.attr_re.captures_iter(tag) {
            let value = decode_entities(&caps[2]);
            match &caps[1] {
                "class" => location.class = value,
                "method" => location.method = value,
                "file" => location.file = value,
                "line" => location.line = value,
                _ => {}
            }
        }
        Some(location)
    }

    /// Drop buffered content that can no longer begin an event, keeping a
    /// tail shorter than the opening tag in case it arrives split.
    fn trim_buffer(&mut self) {
        let keep = EVENT_OPEN.len() - 1;
        if self.buffer.len() > keep {
            let mut cut = self.buffer.len() - keep;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }
    }
}

impl Decoder for XmlLayoutDecoder {
    fn decode(&mut self, chunk: &str) -> Vec<LogEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        loop {
            let Some(start) = self.buffer.find(EVENT_OPEN) else {
                self.trim_buffer();
                break;
            };

            let Some(close) = self.buffer[start..].find(EVENT_CLOSE) else {
                // incomplete event, drop the garbage ahead of it and wait
                self.buffer.drain(..start);
                break;
            };

            let end = start + close + EVENT_CLOSE.len();
            let block = self.buffer[start..end].to_string();
            self.buffer.drain(..end);
            match self.parse_event(&block) {
                Some(event) => events.push(event),
                None => warn!("skipping undecodable log event fragment"),
            }
        }

        events
    }
}

/// Text content of a child element, entity-decoded or CDATA-unwrapped.
fn element_text(block: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;

    let text = block[start..end].trim();
    if let Some(inner) = text
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
    {
        return Some(inner.to_string());
    }
    Some(decode_entities(text))
}

/// Decode the XML character entities the layout emits. Unknown entities are
/// kept literally.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match rest.find(';') {
            Some(semi) if semi <= 10 => {
                let entity = &rest[1..semi];
                match entity {
                    "lt" => out.push('<'),
                    "gt" => out.push('>'),
                    "amp" => out.push('&'),
                    "quot" => out.push('"'),
                    "apos" => out.push('\''),
                    _ => {
                        let decoded = entity
                            .strip_prefix("#x")
                            .or_else(|| entity.strip_prefix("#X"))
                            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                            .or_else(|| {
                                entity.strip_prefix('#').and_then(|dec| dec.parse().ok())
                            })
                            .and_then(char::from_u32);
                        match decoded {
                            Some(ch) => out.push(ch),
                            None => {
                                out.push('&');
                                out.push_str(entity);
                                out.push(';');
                            }
                        }
                    }
                }
                rest = &rest[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
