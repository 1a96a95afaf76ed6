// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error type for board sessions.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PyboardError {
    /// The serial device could not be opened (after waiting, if asked to).
    #[error("failed to access {device}: {source}")]
    Access {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The board answered something the raw REPL protocol does not allow.
    #[error("{0}")]
    Protocol(String),

    #[error("timeout waiting for {0}")]
    Timeout(&'static str),

    /// A script raised on the board; `stderr` holds the traceback.
    #[error("{}", exception_text(.stderr))]
    Exception { stdout: Vec<u8>, stderr: Vec<u8> },

    #[error("{path}: No such file or directory")]
    NotFound { path: String },

    #[error("{path}: File exists")]
    AlreadyExists { path: String },

    #[error("unexpected board output: {0}")]
    Parse(#[from] mpy_common::Error),
}

fn exception_text(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim_end().to_string()
}

impl PyboardError {
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Access { .. } => 2,
            Self::Timeout(_) => 3,
            _ => 1,
        }
    }

    /// Map a remote `OSError` about `path` onto a path error.
    pub fn convert(self, path: &str) -> Self {
        if let Self::Exception { stderr, .. } = &self {
            let text = String::from_utf8_lossy(stderr);
            if text.contains("OSError") {
                if text.contains("ENOENT") || text.contains("Errno 2]") {
                    return Self::NotFound {
                        path: path.to_string(),
                    };
                }
                if text.contains("EEXIST") || text.contains("Errno 17]") {
                    return Self::AlreadyExists {
                        path: path.to_string(),
                    };
                }
            }
        }
        self
    }
}

pub type Result<T> = std::result::Result<T, PyboardError>;
