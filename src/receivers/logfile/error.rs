// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid file URL: {0}")]
    Url(String),

    #[error("unknown decoder: {0}")]
    UnknownDecoder(String),

    #[error("invalid decoder pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, Error>;
