// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Quick check that a board answers on its raw REPL.

use std::io::Write;

use anyhow::{Context, Result};

use mpy_common::script::{IMPORT_OS, PRINT_CWD};
use mpy_remote::{Link, Pyboard};

/// Print the board's working directory and the listing of `/` into `out`.
pub fn run<L: Link>(pyb: &mut Pyboard<L>, out: &mut dyn Write) -> Result<()> {
    pyb.enter_raw_repl(true)
        .context("Failed to enter raw REPL")?;
    pyb.exec(IMPORT_OS)?;

    let cwd = pyb.exec(PRINT_CWD)?;
    let cwd = String::from_utf8(cwd).context("Working directory is not valid UTF-8")?;
    writeln!(out, "{}", cwd)?;

    pyb.fs_ls("/", out)?;
    pyb.exit_raw_repl()?;
    Ok(())
}
