// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for board sessions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use mpy_common::config::{create_default, CreateOutcome};
use mpy_common::paths::{cp_destination, is_remote, remote_name};
use mpy_common::protocol::strip_eof;
use mpy_common::FsCommand;

use crate::progress::{report_to, transfer_bar};
use crate::pyboard::Pyboard;
use crate::transport::{Link, PortEntry};

/// What one invocation asks the board to do.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Soft reset before entering raw REPL.
    pub soft_reset: bool,
    /// `Some` when `--follow` / `--no-follow` was given.
    pub follow: Option<bool>,
    pub command: Option<String>,
    /// Script paths, or the filesystem command when `filesystem` is set.
    pub files: Vec<String>,
    pub filesystem: bool,
    pub verbose: bool,
    pub verify: bool,
    /// Draw progress bars for transfers.
    pub progress: bool,
}

/// How a session ended when no local error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Success,
    /// A script raised on the board; its traceback was printed.
    RemoteFailure,
}

impl SessionOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::RemoteFailure => 1,
        }
    }
}

/// Run the requested filesystem command, scripts and follow mode.
pub fn run_session<L: Link>(
    pyb: &mut Pyboard<L>,
    opts: &SessionOptions,
    out: &mut dyn Write,
) -> Result<SessionOutcome> {
    let fs_command = if opts.filesystem {
        Some(FsCommand::parse(opts.files.as_slice())?)
    } else {
        None
    };

    let needs_raw_repl = opts.command.is_some() || opts.filesystem || !opts.files.is_empty();
    if needs_raw_repl {
        pyb.enter_raw_repl(opts.soft_reset)
            .context("Failed to enter raw REPL")?;
    }

    if let Some(cmd) = &fs_command {
        if let Err(e) = filesystem_command(pyb, cmd, opts, out) {
            pyb.exit_raw_repl()?;
            return Err(e);
        }
    }

    if let Some(command) = &opts.command {
        if !execbuffer(pyb, command.as_bytes(), out)? {
            return Ok(SessionOutcome::RemoteFailure);
        }
    }

    if !opts.filesystem {
        for file in &opts.files {
            let buf = fs::read(file).with_context(|| format!("Failed to read {}", file))?;
            if !execbuffer(pyb, &buf, out)? {
                return Ok(SessionOutcome::RemoteFailure);
            }
        }
    }

    if needs_raw_repl {
        pyb.exit_raw_repl()?;
    }

    let follow = opts
        .follow
        .unwrap_or(opts.command.is_none() && !opts.filesystem && opts.files.is_empty());
    if follow {
        let mut write_error = None;
        let mut sink = |bytes: &[u8]| {
            if write_error.is_none() {
                if let Err(e) = out.write_all(bytes) {
                    write_error = Some(e);
                }
            }
        };
        let (_, stderr) = pyb.follow(None, Some(&mut sink))?;
        if let Some(e) = write_error {
            return Err(e.into());
        }
        if !stderr.is_empty() {
            out.write_all(&strip_eof(&stderr))?;
            return Ok(SessionOutcome::RemoteFailure);
        }
    }

    out.flush()?;
    Ok(SessionOutcome::Success)
}

/// Run a script, streaming its output. Returns false if it raised, after
/// printing the traceback and leaving raw REPL.
pub fn execbuffer<L: Link>(pyb: &mut Pyboard<L>, buf: &[u8], out: &mut dyn Write) -> Result<bool> {
    let mut write_error = None;
    let mut sink = |bytes: &[u8]| {
        if write_error.is_none() {
            if let Err(e) = out.write_all(&strip_eof(bytes)) {
                write_error = Some(e);
            }
        }
    };
    let (_, stderr) = pyb.exec_raw(buf, None, Some(&mut sink))?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    if !stderr.is_empty() {
        pyb.exit_raw_repl()?;
        out.write_all(&stderr)?;
        out.flush()?;
        return Ok(false);
    }
    Ok(true)
}

/// Execute a filesystem command; `:`-prefixed paths are on the board.
pub fn filesystem_command<L: Link>(
    pyb: &mut Pyboard<L>,
    cmd: &FsCommand,
    opts: &SessionOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let name = cmd.name();
    let verbose = opts.verbose;

    match cmd {
        FsCommand::Cp {
            sources,
            dest,
            recursive,
        } => {
            for src in sources {
                if verbose {
                    writeln!(out, "cp {} {}", src, dest)?;
                }
                let src_name = remote_name(src);
                let dest_name = cp_destination(&src_name, &remote_name(dest));
                copy_one(pyb, src, &src_name, dest, &dest_name, *recursive, opts)
                    .with_context(|| format!("cp {} {}", src, dest))?;
            }
        }
        FsCommand::Ls(paths) => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, out| pyb.fs_ls(path, out))?
        }
        FsCommand::Cat(paths) => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, out| pyb.fs_cat(path, out))?
        }
        FsCommand::Mkdir(paths) => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, _| pyb.fs_mkdir(path))?
        }
        FsCommand::Rmdir(paths) => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, _| pyb.fs_rmdir(path))?
        }
        FsCommand::Touch(paths) => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, _| pyb.fs_touch(path))?
        }
        FsCommand::Hash(paths) => each_path(pyb, name, paths, verbose, out, |pyb, path, out| {
            let crc = pyb.fs_crc32(path)?;
            writeln!(out, "{:08x}  {}", crc, path)?;
            Ok(())
        })?,
        FsCommand::Rm { paths, recursive } => {
            each_path(pyb, name, paths, verbose, out, |pyb, path, _| {
                if *recursive {
                    pyb.fs_rm_recursive(path)
                } else {
                    pyb.fs_rm(path)
                }
            })?
        }
    }

    out.flush()?;
    Ok(())
}

/// Apply `op` to every board path of a command, echoing it when verbose.
fn each_path<L, F>(
    pyb: &mut Pyboard<L>,
    name: &'static str,
    paths: &[String],
    verbose: bool,
    out: &mut dyn Write,
    mut op: F,
) -> Result<()>
where
    L: Link,
    F: FnMut(&mut Pyboard<L>, &str, &mut dyn Write) -> crate::Result<()>,
{
    for path in paths {
        let path = remote_name(path);
        if verbose {
            writeln!(out, "{} :{}", name, path)?;
        }
        op(pyb, &path, &mut *out).with_context(|| name)?;
    }
    Ok(())
}

fn copy_one<L: Link>(
    pyb: &mut Pyboard<L>,
    src: &str,
    src_name: &str,
    dest: &str,
    dest_name: &str,
    recursive: bool,
    opts: &SessionOptions,
) -> Result<()> {
    match (is_remote(src), is_remote(dest)) {
        (true, true) => {
            if recursive {
                bail!("recursive copy between two board paths is not supported");
            }
            pyb.fs_cp(src_name, dest_name)?;
        }
        (true, false) if recursive => {
            pyb.fs_get_recursive(src_name, Path::new(dest_name))?;
        }
        (true, false) => {
            if opts.progress {
                let pb = transfer_bar(src_name)?;
                pyb.fs_get(src_name, Path::new(dest_name), Some(&mut report_to(&pb)))?;
                pb.finish_and_clear();
            } else {
                pyb.fs_get(src_name, Path::new(dest_name), None)?;
            }
        }
        (false, true) if recursive => {
            pyb.fs_put_recursive(Path::new(src_name), dest_name, opts.verify)?;
        }
        (false, true) => {
            let crc = if opts.progress {
                let pb = transfer_bar(src_name)?;
                let crc = pyb.fs_put(Path::new(src_name), dest_name, Some(&mut report_to(&pb)))?;
                pb.finish_and_clear();
                crc
            } else {
                pyb.fs_put(Path::new(src_name), dest_name, None)?
            };
            if opts.verify {
                pyb.fs_verify(dest_name, crc)?;
            }
        }
        (false, false) => {
            fs::copy(src_name, dest_name)
                .with_context(|| format!("Failed to copy {} to {}", src_name, dest_name))?;
        }
    }
    Ok(())
}

/// Create a default `.pyboarddev` in `dir`.
pub fn init_config(dir: &Path, out: &mut dyn Write) -> Result<PathBuf> {
    match create_default(dir).context("Error creating configuration file")? {
        CreateOutcome::Created(path) => {
            writeln!(out, "Configuration file created: '{}'.", path.display())?;
            Ok(path)
        }
        CreateOutcome::AlreadyExists(path) => {
            writeln!(out, "Configuration file already exists: '{}'.", path.display())?;
            Ok(path)
        }
    }
}

/// Print one line per serial port: its name, then a description if known.
pub fn list_ports(ports: &[PortEntry], out: &mut dyn Write) -> Result<()> {
    if ports.is_empty() {
        writeln!(out, "No serial ports found.")?;
    }
    for port in ports {
        match &port.description {
            Some(description) => writeln!(out, "{}  {}", port.name, description)?,
            None => writeln!(out, "{}", port.name)?,
        }
    }
    out.flush()?;
    Ok(())
}
