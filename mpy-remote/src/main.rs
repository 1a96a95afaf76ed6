// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Run scripts and manage files on a MicroPython board.
//!
//! Usage:
//!   mpy-remote --device /dev/ttyACM0 -c "import os; print(os.listdir())"
//!   mpy-remote --device /dev/ttyACM0 -f cp main.py :main.py
//!   mpy-remote --init-config

use std::process::ExitCode;

fn main() -> ExitCode {
    mpy_remote::cli::main_with_args(std::env::args_os())
}
