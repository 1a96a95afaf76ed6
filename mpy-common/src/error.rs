// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error type shared by the parsing and configuration helpers.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// First word of a filesystem command line is not a known command.
    #[error("'{0}' is not a filesystem command")]
    UnknownCommand(String),

    /// A known filesystem command was given the wrong arguments.
    #[error("{command}: {message}")]
    Usage {
        command: &'static str,
        message: String,
    },

    #[error("Malformed directory listing line: {0:?}")]
    MalformedListing(String),

    #[error("Malformed stat result: {0:?}")]
    MalformedStat(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn usage<S: Into<String>>(command: &'static str, message: S) -> Self {
        Self::Usage {
            command,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
