// SPDX-License-Identifier: Apache-2.0

//! Log file receiver.
//!
//! Opens a URL-addressed log file, incrementally decodes its content into
//! log events with a pluggable decoder, applies an optional filter
//! expression, rewrites the host and application properties to identify the
//! source, and forwards surviving events to the downstream output. With
//! tailing enabled the receiver keeps polling the file for appended
//! content.

pub mod config;
pub mod decoder;
pub mod error;
pub mod receiver;

pub use config::LogFileReceiverConfig;
pub use error::{Error, Result};
pub use receiver::LogFileReceiver;
