// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Raw REPL client for MicroPython boards over a serial port.
//!
//! The [`Pyboard`] session drives the board's raw REPL to run scripts and
//! move files; [`cli`] wraps it in the `mpy-remote` command line:
//!
//! ```text
//! mpy-remote -d /dev/ttyACM0 -c "print(1 + 1)"
//! mpy-remote -d /dev/ttyACM0 script.py
//! mpy-remote -d /dev/ttyACM0 -f cp main.py :
//! mpy-remote -d /dev/ttyACM0 -f ls :/lib
//! mpy-remote --list-ports
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod fs;
pub mod mock;
pub mod progress;
pub mod pyboard;
pub mod transport;

pub use error::{PyboardError, Result};
pub use pyboard::{DataConsumer, Pyboard};
pub use transport::{available_ports, Link, PortEntry, SerialLink};
