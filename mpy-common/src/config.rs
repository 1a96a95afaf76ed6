// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Project configuration stored as JSON in `.pyboarddev`.
//!
//! The file sits in the project directory and names the board's serial
//! device and baud rate. Missing fields fall back to the defaults, so a file
//! containing only `{"device": "/dev/ttyUSB0"}` is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::DEFAULT_BAUDRATE;

pub const CONFIG_FILE_NAME: &str = ".pyboarddev";
pub const CONFIG_VERSION: u32 = 1;

const CONFIG_HELP: &str = "Set 'device' to the board's serial port (e.g. COM5, /dev/ttyACM0) and 'baudrate' to its console speed.";

/// Connection settings for one board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub device: String,
    pub baudrate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baudrate: DEFAULT_BAUDRATE,
        }
    }
}

impl DeviceConfig {
    /// The configured device, if one was set.
    pub fn device(&self) -> Option<&str> {
        Some(self.device.as_str()).filter(|d| !d.is_empty())
    }

    /// Load `.pyboarddev` from `dir`, returning defaults when it does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_from(&dir.join(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.baudrate == 0 {
            return Err(Error::config("baudrate must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigMeta {
    pub version: u32,
    pub help: String,
}

/// On-disk layout of a freshly created configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub meta: ConfigMeta,
    #[serde(flatten)]
    pub settings: DeviceConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            meta: ConfigMeta {
                version: CONFIG_VERSION,
                help: CONFIG_HELP.to_string(),
            },
            settings: DeviceConfig::default(),
        }
    }
}

/// Result of [`create_default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PathBuf),
    /// Left untouched.
    AlreadyExists(PathBuf),
}

/// Write a default `.pyboarddev` into `dir` unless one already exists.
pub fn create_default(dir: &Path) -> Result<CreateOutcome> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(CreateOutcome::AlreadyExists(path));
    }

    let content = serde_json::to_string_pretty(&ConfigFile::default())?;
    fs::write(&path, content)?;
    Ok(CreateOutcome::Created(path))
}
