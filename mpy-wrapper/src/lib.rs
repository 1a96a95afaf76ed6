// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Launcher around `mpy-remote`.
//!
//! Every run first makes sure the local `__remote_files__` directory exists.
//! Without arguments it then runs a short board diagnostic (working
//! directory and root listing); with arguments the whole argument vector is
//! handed to the `mpy-remote` command line unchanged.

pub mod diagnostic;

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use mpy_common::{DeviceConfig, DEFAULT_BAUDRATE};
use mpy_remote::Pyboard;

/// Local directory that mirrors files from the board.
pub const REMOTE_FILES_DIR: &str = "__remote_files__";

/// Device the diagnostic opens when nothing else names one.
#[cfg(windows)]
pub const DEFAULT_DIAGNOSTIC_DEVICE: &str = "COM22";
#[cfg(not(windows))]
pub const DEFAULT_DIAGNOSTIC_DEVICE: &str = "/dev/ttyACM0";

/// Create `base/__remote_files__` unless it already exists.
pub fn ensure_remote_files_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(REMOTE_FILES_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        debug!("Created {}", dir.display());
    }
    Ok(dir)
}

/// What an invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Program name only.
    Diagnostic,
    /// Arguments present; carries the full argument vector, program name included.
    Forward(Vec<OsString>),
}

impl Invocation {
    pub fn from_args(argv: Vec<OsString>) -> Self {
        if argv.len() <= 1 {
            Self::Diagnostic
        } else {
            Self::Forward(argv)
        }
    }
}

/// Connection used by the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSettings {
    pub device: String,
    pub baudrate: u32,
    /// Seconds to wait for the device.
    pub wait: u64,
}

impl DiagnosticSettings {
    /// Device from `config`, then `env_device`, then the platform default.
    pub fn resolve(config: &DeviceConfig, env_device: Option<String>) -> Self {
        let device = config
            .device()
            .map(str::to_string)
            .or(env_device.filter(|d| !d.is_empty()))
            .unwrap_or_else(|| DEFAULT_DIAGNOSTIC_DEVICE.to_string());
        Self {
            device,
            baudrate: DEFAULT_BAUDRATE,
            wait: 0,
        }
    }

    /// Resolve from `.pyboarddev` in `base` and `PYBOARD_DEVICE`.
    pub fn from_environment(base: &Path) -> Self {
        let config = mpy_remote::cli::load_project_config_from(base);
        Self::resolve(&config, env::var("PYBOARD_DEVICE").ok())
    }
}

/// Ensure the mirror directory, then run the diagnostic or `forward` the
/// arguments.
pub fn run<F>(argv: Vec<OsString>, base: &Path, forward: F) -> Result<ExitCode>
where
    F: FnOnce(Vec<OsString>) -> ExitCode,
{
    ensure_remote_files_dir(base)?;

    match Invocation::from_args(argv) {
        Invocation::Forward(argv) => Ok(forward(argv)),
        Invocation::Diagnostic => {
            mpy_remote::cli::init_logging(false);
            let settings = DiagnosticSettings::from_environment(base);
            debug!(
                "Diagnostic on {} at {} baud",
                settings.device, settings.baudrate
            );
            let mut pyb = Pyboard::open(&settings.device, settings.baudrate, settings.wait)?;
            diagnostic::run(&mut pyb, &mut io::stdout())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
