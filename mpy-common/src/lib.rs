// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and utilities for MicroPython host tools.
//!
//! Everything in this crate is pure logic with no serial I/O, so it can be
//! shared between the REPL client, the wrapper and their tests:
//! - `protocol`: raw REPL control bytes, markers and reply classification
//! - `script`: MicroPython snippets executed on the board
//! - `listing`: parsing of directory listings and `os.stat` results
//! - `paths` / `fs_command`: filesystem command-line rules
//! - `config`: the `.pyboarddev` project configuration file

pub mod config;
pub mod error;
pub mod fs_command;
pub mod listing;
pub mod paths;
pub mod protocol;
pub mod script;

// Re-export commonly used types
pub use config::{CreateOutcome, DeviceConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use fs_command::FsCommand;
pub use listing::{DirEntry, EntryKind, RemoteStat};
pub use protocol::{RawPasteReply, ReplMode, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT_MS, TRANSFER_CHUNK};
