// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use mpy_common::CONFIG_FILE_NAME;
use mpy_wrapper::REMOTE_FILES_DIR;

fn mpy_wrapper(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mpy-wrapper").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PYBOARD_DEVICE")
        .env_remove("PYBOARD_BAUDRATE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_arguments_reach_mpy_remote() {
    let dir = TempDir::new().unwrap();
    mpy_wrapper(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MicroPython"))
        .stdout(predicate::str::contains("--filesystem"));

    assert!(dir.path().join(REMOTE_FILES_DIR).is_dir());
}

#[test]
fn test_forwarded_init_config() {
    let dir = TempDir::new().unwrap();
    mpy_wrapper(&dir)
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    assert!(dir.path().join(CONFIG_FILE_NAME).is_file());
}

#[test]
fn test_diagnostic_without_board() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{"device": "/nonexistent/ttyDIAG0"}"#,
    )
    .unwrap();

    mpy_wrapper(&dir)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("/nonexistent/ttyDIAG0"));

    assert!(dir.path().join(REMOTE_FILES_DIR).is_dir());
}
