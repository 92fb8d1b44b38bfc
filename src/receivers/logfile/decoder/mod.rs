// SPDX-License-Identifier: Apache-2.0

//! Pluggable decoders turning raw file content into log events.
//!
//! Decoders are stateful and incremental: a chunk handed to
//! [`Decoder::decode`] may end mid-event, in which case the undecoded tail
//! is buffered until the next call. Implementations are lenient — content
//! that cannot be decoded is skipped with a diagnostic, never an error.

mod json;
mod xml;

pub use json::JsonLinesDecoder;
pub use xml::XmlLayoutDecoder;

use crate::model::LogEvent;
use crate::receivers::logfile::error::{Error, Result};

/// Converts chunks of raw text into decoded log events.
pub trait Decoder: Send {
    /// Decode as many complete events as the chunk plus any buffered input
    /// allows, in the order they appear.
    fn decode(&mut self, chunk: &str) -> Vec<LogEvent>;
}

/// Resolve a configured decoder name to an implementation.
///
/// Short registry names are canonical; the fully qualified class names that
/// appear in older receiver configurations are accepted as aliases.
pub fn resolve(name: &str) -> Result<Box<dyn Decoder>> {
    match name {
        "xml" | "org.apache.log4j.xml.XMLDecoder" => Ok(Box::new(XmlLayoutDecoder::new()?)),
        "json" => Ok(Box::new(JsonLinesDecoder::new())),
        other => Err(Error::UnknownDecoder(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        assert!(resolve("xml").is_ok());
        assert!(resolve("json").is_ok());
    }

    #[test]
    fn test_resolve_legacy_alias() {
        assert!(resolve("org.apache.log4j.xml.XMLDecoder").is_ok());
    }

    #[test]
    fn test_resolve_unknown_name() {
        match resolve("com.example.NoSuchDecoder") {
            Err(Error::UnknownDecoder(name)) => {
                assert_eq!(name, "com.example.NoSuchDecoder");
            }
            other => panic!("expected UnknownDecoder, got {:?}", other.map(|_| ())),
        }
    }
}
