// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the `.pyboarddev` configuration file.

use std::fs;

use mpy_common::config::{create_default, CreateOutcome, DeviceConfig, CONFIG_FILE_NAME};
use mpy_common::{Error, DEFAULT_BAUDRATE};
use tempfile::TempDir;

#[test]
fn test_load_missing_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let config = DeviceConfig::load(dir.path()).unwrap();
    assert_eq!(config, DeviceConfig::default());
    assert_eq!(config.baudrate, DEFAULT_BAUDRATE);
    assert_eq!(config.device(), None);
}

#[test]
fn test_load_merges_over_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{"device": "/dev/ttyUSB0"}"#,
    )
    .unwrap();

    let config = DeviceConfig::load(dir.path()).unwrap();
    assert_eq!(config.device(), Some("/dev/ttyUSB0"));
    assert_eq!(config.baudrate, 115_200);
}

#[test]
fn test_load_ignores_meta_section() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{"meta": {"version": 1, "help": "x"}, "device": "COM5", "baudrate": 9600}"#,
    )
    .unwrap();

    let config = DeviceConfig::load(dir.path()).unwrap();
    assert_eq!(config.device(), Some("COM5"));
    assert_eq!(config.baudrate, 9600);
}

#[test]
fn test_load_malformed_json_is_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "{ device: ").unwrap();
    assert!(matches!(
        DeviceConfig::load(dir.path()),
        Err(Error::Json(_))
    ));
}

#[test]
fn test_load_rejects_zero_baudrate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"baudrate": 0}"#).unwrap();
    assert!(matches!(
        DeviceConfig::load(dir.path()),
        Err(Error::Config { .. })
    ));
}

#[test]
fn test_create_default_then_already_exists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    assert_eq!(
        create_default(dir.path()).unwrap(),
        CreateOutcome::Created(path.clone())
    );
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"meta\""));
    assert!(written.contains("\"baudrate\": 115200"));

    fs::write(&path, r#"{"device": "keep"}"#).unwrap();
    assert_eq!(
        create_default(dir.path()).unwrap(),
        CreateOutcome::AlreadyExists(path.clone())
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"device": "keep"}"#);
}

#[test]
fn test_created_file_loads_as_defaults() {
    let dir = TempDir::new().unwrap();
    create_default(dir.path()).unwrap();
    assert_eq!(
        DeviceConfig::load(dir.path()).unwrap(),
        DeviceConfig::default()
    );
}
