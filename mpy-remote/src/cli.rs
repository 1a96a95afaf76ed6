// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

use mpy_common::DeviceConfig;

use crate::commands::{self, SessionOptions, SessionOutcome};
use crate::error::PyboardError;
use crate::pyboard::Pyboard;
use crate::transport::available_ports;

/// Device used when neither the command line, the environment nor
/// `.pyboarddev` names one.
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "mpy-remote", version)]
#[command(about = "Run scripts and manage files on a MicroPython board over its serial REPL")]
pub struct Cli {
    /// Serial port of the board (e.g., /dev/ttyACM0, COM5)
    #[arg(short, long, env = "PYBOARD_DEVICE")]
    pub device: Option<String>,

    /// Baud rate of the serial port
    #[arg(short, long, env = "PYBOARD_BAUDRATE")]
    pub baudrate: Option<u32>,

    /// Program passed in as a string
    #[arg(short, long)]
    pub command: Option<String>,

    /// Seconds to wait for the device to become available
    #[arg(short, long, default_value_t = 0)]
    pub wait: u64,

    /// Soft reset the board before running anything (default)
    #[arg(long, overrides_with = "no_soft_reset")]
    pub soft_reset: bool,

    /// Do not soft reset the board
    #[arg(long)]
    pub no_soft_reset: bool,

    /// Follow the board's output after running
    #[arg(long, overrides_with = "no_follow")]
    pub follow: bool,

    /// Do not follow the board's output
    #[arg(long)]
    pub no_follow: bool,

    /// Treat the arguments as a filesystem command: cp, ls, cat, rm, mkdir, rmdir, touch, hash
    #[arg(short, long)]
    pub filesystem: bool,

    /// Verify uploaded files by CRC-32
    #[arg(long)]
    pub verify: bool,

    /// Debug logging and echo of filesystem operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Create a default .pyboarddev in the current directory and exit
    #[arg(long)]
    pub init_config: bool,

    /// List the serial ports found on this host and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Scripts to run, or the filesystem command and its arguments with -f
    #[arg(value_name = "FILES", trailing_var_arg = true, allow_hyphen_values = true)]
    pub files: Vec<String>,
}

impl Cli {
    pub fn soft_reset(&self) -> bool {
        !self.no_soft_reset
    }

    pub fn follow_mode(&self) -> Option<bool> {
        if self.follow {
            Some(true)
        } else if self.no_follow {
            Some(false)
        } else {
            None
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            soft_reset: self.soft_reset(),
            follow: self.follow_mode(),
            command: self.command.clone(),
            files: self.files.clone(),
            filesystem: self.filesystem,
            verbose: self.verbose,
            verify: self.verify,
            progress: true,
        }
    }

    /// Resolve the connection: command line / environment first, then `config`.
    pub fn connection(&self, config: &DeviceConfig) -> (String, u32) {
        let device = self
            .device
            .clone()
            .or_else(|| config.device().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string());
        let baudrate = self.baudrate.unwrap_or(config.baudrate);
        (device, baudrate)
    }
}

/// Install the stderr log subscriber; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Load `.pyboarddev` from the working directory, falling back to defaults.
pub fn load_project_config() -> DeviceConfig {
    match env::current_dir() {
        Ok(dir) => load_project_config_from(&dir),
        Err(_) => DeviceConfig::default(),
    }
}

/// Load `.pyboarddev` from `dir`; a malformed file is logged and ignored.
pub fn load_project_config_from(dir: &Path) -> DeviceConfig {
    DeviceConfig::load(dir).unwrap_or_else(|e| {
        tracing::warn!("Ignoring .pyboarddev: {}", e);
        DeviceConfig::default()
    })
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<SessionOutcome> {
    let mut stdout = io::stdout();

    if cli.init_config {
        commands::init_config(&env::current_dir()?, &mut stdout)?;
        return Ok(SessionOutcome::Success);
    }

    if cli.list_ports {
        commands::list_ports(&available_ports()?, &mut stdout)?;
        return Ok(SessionOutcome::Success);
    }

    if cli.filesystem && cli.files.is_empty() {
        bail!("-f/--filesystem needs a command, e.g. 'ls :'");
    }

    let config = load_project_config();
    let (device, baudrate) = cli.connection(&config);
    debug!("Connecting to {} at {} baud", device, baudrate);

    let mut pyb = Pyboard::open(&device, baudrate, cli.wait)?;
    commands::run_session(&mut pyb, &cli.session_options(), &mut stdout)
}

/// Library entry point: parse `args` (program name first) and run.
pub fn main_with_args<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            error!("{:#}", err);
            let code = err
                .downcast_ref::<PyboardError>()
                .map_or(1, PyboardError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpy_common::DEFAULT_BAUDRATE;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mpy-remote"]).unwrap();
        assert!(cli.soft_reset());
        assert_eq!(cli.follow_mode(), None);
        assert_eq!(cli.wait, 0);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_filesystem_args_keep_hyphen_values() {
        let cli = Cli::try_parse_from(["mpy-remote", "-f", "cp", "-r", "src", ":"]).unwrap();
        assert!(cli.filesystem);
        assert_eq!(cli.files, ["cp", "-r", "src", ":"]);
    }

    #[test]
    fn test_soft_reset_last_flag_wins() {
        let cli = Cli::try_parse_from(["mpy-remote", "--no-soft-reset"]).unwrap();
        assert!(!cli.soft_reset());
        let cli = Cli::try_parse_from(["mpy-remote", "--no-soft-reset", "--soft-reset"]).unwrap();
        assert!(cli.soft_reset());
    }

    #[test]
    fn test_list_ports_flag() {
        let cli = Cli::try_parse_from(["mpy-remote", "--list-ports"]).unwrap();
        assert!(cli.list_ports);
        assert!(!Cli::try_parse_from(["mpy-remote"]).unwrap().list_ports);
    }

    #[test]
    fn test_follow_flags() {
        let cli = Cli::try_parse_from(["mpy-remote", "--follow"]).unwrap();
        assert_eq!(cli.follow_mode(), Some(true));
        let cli = Cli::try_parse_from(["mpy-remote", "--no-follow"]).unwrap();
        assert_eq!(cli.follow_mode(), Some(false));
    }

    #[test]
    fn test_connection_prefers_command_line() {
        let config = DeviceConfig {
            device: "COM5".to_string(),
            baudrate: 9600,
        };
        let cli = Cli::try_parse_from(["mpy-remote", "-d", "/dev/ttyUSB1", "-b", "57600"]).unwrap();
        assert_eq!(cli.connection(&config), ("/dev/ttyUSB1".to_string(), 57600));
    }

    #[test]
    fn test_connection_falls_back_to_config_then_default() {
        let cli = Cli {
            device: None,
            baudrate: None,
            ..Cli::try_parse_from(["mpy-remote"]).unwrap()
        };
        let config = DeviceConfig {
            device: "COM5".to_string(),
            baudrate: 9600,
        };
        assert_eq!(cli.connection(&config), ("COM5".to_string(), 9600));
        assert_eq!(
            cli.connection(&DeviceConfig::default()),
            (DEFAULT_DEVICE.to_string(), DEFAULT_BAUDRATE)
        );
    }
}
