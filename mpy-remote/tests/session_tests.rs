// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end session flows as driven by the command line.

use std::fs;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::TempDir;

use mpy_common::{ReplMode, CONFIG_FILE_NAME};
use mpy_remote::commands::{init_config, list_ports, run_session, SessionOptions, SessionOutcome};
use mpy_remote::fs::CRC32;
use mpy_remote::mock::{MockBoard, MockReply};
use mpy_remote::{PortEntry, Pyboard};

fn session(board: &MockBoard) -> Pyboard<MockBoard> {
    Pyboard::new(board.clone()).with_timeout(Duration::from_millis(300))
}

fn fs_options(args: &[&str]) -> SessionOptions {
    SessionOptions {
        soft_reset: true,
        filesystem: true,
        files: args.iter().map(|s| s.to_string()).collect(),
        ..SessionOptions::default()
    }
}

fn run(board: &MockBoard, opts: &SessionOptions) -> (anyhow::Result<SessionOutcome>, String) {
    let mut pyb = session(board);
    let mut out = Vec::new();
    let result = run_session(&mut pyb, opts, &mut out);
    (result, String::from_utf8_lossy(&out).into_owned())
}

// =============================================================================
// Scripts
// =============================================================================

#[test]
fn test_command_output_and_exit() {
    let board = MockBoard::new().on_exec("print('hi')", MockReply::stdout("hi\r\n"));
    let opts = SessionOptions {
        soft_reset: true,
        command: Some("print('hi')".to_string()),
        ..SessionOptions::default()
    };

    let (result, out) = run(&board, &opts);
    assert_eq!(result.unwrap(), SessionOutcome::Success);
    assert_eq!(out, "hi\r\n");
    assert_eq!(board.soft_resets(), 1);
    assert_eq!(board.mode(), ReplMode::Friendly);
}

#[test]
fn test_command_exception_is_remote_failure() {
    let board = MockBoard::new().on_exec(
        "1/0",
        MockReply::exception("Traceback (most recent call last):\r\nZeroDivisionError: divide by zero\r\n"),
    );
    let opts = SessionOptions {
        command: Some("1/0".to_string()),
        ..SessionOptions::default()
    };

    let (result, out) = run(&board, &opts);
    let outcome = result.unwrap();
    assert_eq!(outcome, SessionOutcome::RemoteFailure);
    assert_eq!(outcome.exit_code(), 1);
    assert!(out.contains("ZeroDivisionError"));
    assert_eq!(board.mode(), ReplMode::Friendly);
    assert_eq!(board.soft_resets(), 0);
}

#[test]
fn test_script_files_run_in_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.py");
    let second = dir.path().join("second.py");
    fs::write(&first, "print('one')\n").unwrap();
    fs::write(&second, "print('two')\n").unwrap();

    let board = MockBoard::new()
        .on_exec("'one'", MockReply::stdout("one\r\n"))
        .on_exec("'two'", MockReply::stdout("two\r\n"));
    let opts = SessionOptions {
        files: vec![
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ],
        ..SessionOptions::default()
    };

    let (result, out) = run(&board, &opts);
    assert_eq!(result.unwrap(), SessionOutcome::Success);
    assert_eq!(out, "one\r\ntwo\r\n");
    assert_eq!(board.history().len(), 2);
}

#[test]
fn test_missing_script_file_is_error() {
    let board = MockBoard::new();
    let opts = SessionOptions {
        files: vec!["/definitely/not/here.py".to_string()],
        ..SessionOptions::default()
    };

    let (result, _) = run(&board, &opts);
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read"));
}

// =============================================================================
// Follow mode
// =============================================================================

#[test]
fn test_follow_without_command() {
    let board = MockBoard::new();
    board.push_output(b"tick\r\ntock\r\n\x04\x04");

    let (result, out) = run(&board, &SessionOptions::default());
    assert_eq!(result.unwrap(), SessionOutcome::Success);
    assert_eq!(out, "tick\r\ntock\r\n");
    assert!(board.written().is_empty());
}

#[test]
fn test_follow_reports_remote_error() {
    let board = MockBoard::new();
    board.push_output(b"\x04OSError: boom\r\n\x04");

    let (result, out) = run(&board, &SessionOptions::default());
    assert_eq!(result.unwrap(), SessionOutcome::RemoteFailure);
    assert!(out.contains("OSError: boom"));
}

// =============================================================================
// Filesystem commands
// =============================================================================

#[test]
fn test_fs_ls() {
    let board = MockBoard::new().on_exec(
        "os.ilistdir('/')",
        MockReply::stdout("           0 lib/\r\n         139 boot.py\r\n"),
    );

    let (result, out) = run(&board, &fs_options(&["ls", ":/"]));
    assert_eq!(result.unwrap(), SessionOutcome::Success);
    assert_eq!(out, "           0 lib/\r\n         139 boot.py\r\n");
    assert_eq!(board.mode(), ReplMode::Friendly);
}

#[test]
fn test_fs_verbose_echoes_operation() {
    let board = MockBoard::new();
    let opts = SessionOptions {
        verbose: true,
        ..fs_options(&["mkdir", ":lib"])
    };

    let (result, out) = run(&board, &opts);
    result.unwrap();
    assert_eq!(out, "mkdir :lib\n");
    assert!(board.history()[0].contains("os.mkdir('lib')"));
}

#[test]
fn test_fs_commands_route_to_their_operation() {
    let crc = CRC32.checksum(b"");
    let cases: [(&[&str], &str); 7] = [
        (&["ls", ":lib"], "os.ilistdir('lib')"),
        (&["cat", ":boot.py"], "with open('boot.py')"),
        (&["mkdir", ":lib"], "os.mkdir('lib')"),
        (&["rmdir", ":lib"], "os.rmdir('lib')"),
        (&["touch", ":new.py"], "open('new.py','a')"),
        (&["rm", ":old.py"], "os.remove('old.py')"),
        (&["hash", ":main.py"], "binascii.crc32"),
    ];

    for (args, expected) in cases {
        let board = MockBoard::new().on_exec("binascii.crc32", MockReply::stdout(crc.to_string()));
        let (result, _) = run(&board, &fs_options(args));
        result.unwrap();

        let history = board.history();
        assert_eq!(history.len(), 1, "{:?}", args);
        assert!(history[0].contains(expected), "{:?}: {}", args, history[0]);
    }
}

#[test]
fn test_fs_unknown_command_touches_nothing() {
    let board = MockBoard::new();

    let (result, _) = run(&board, &fs_options(&["frobnicate", ":x"]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("frobnicate"));
    assert!(board.written().is_empty());
}

#[test]
fn test_fs_error_leaves_raw_repl() {
    let board = MockBoard::new().on_exec("os.remove('gone.py')", MockReply::os_error(2));

    let (result, _) = run(&board, &fs_options(&["rm", ":gone.py"]));
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("gone.py: No such file or directory"));
    assert_eq!(board.mode(), ReplMode::Friendly);
}

#[test]
fn test_fs_hash() {
    let crc = CRC32.checksum(b"x = 1\n");
    let board = MockBoard::new().on_exec("binascii.crc32", MockReply::stdout(crc.to_string()));

    let (result, out) = run(&board, &fs_options(&["hash", ":main.py"]));
    result.unwrap();
    assert_eq!(out, format!("{:08x}  main.py\n", crc));
}

#[test]
fn test_fs_cp_upload_with_verify() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("main.py");
    fs::write(&local, b"x = 1\n").unwrap();

    let crc = CRC32.checksum(b"x = 1\n");
    let board = MockBoard::new().on_exec("binascii.crc32", MockReply::stdout(crc.to_string()));
    let local_arg = local.to_string_lossy().into_owned();
    let opts = SessionOptions {
        verify: true,
        ..fs_options(&["cp", &local_arg, ":main.py"])
    };

    let (result, _) = run(&board, &opts);
    result.unwrap();

    let history = board.history();
    assert!(history[0].contains("f=open('main.py','wb')"));
    let encoded = STANDARD.encode(b"x = 1\n");
    assert!(history.iter().any(|s| s.contains(&encoded)));
    assert!(history.last().unwrap().contains("binascii.crc32"));
}

#[test]
fn test_fs_cp_upload_verify_mismatch() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("main.py");
    fs::write(&local, b"x = 1\n").unwrap();

    let board = MockBoard::new().on_exec("binascii.crc32", MockReply::stdout("0"));
    let local_arg = local.to_string_lossy().into_owned();
    let opts = SessionOptions {
        verify: true,
        ..fs_options(&["cp", &local_arg, ":main.py"])
    };

    let (result, _) = run(&board, &opts);
    assert!(format!("{:#}", result.unwrap_err()).contains("verification failed"));
}

#[test]
fn test_fs_cp_download_into_directory() {
    let dir = TempDir::new().unwrap();
    let board = MockBoard::new().on_exec_sequence(
        "b2a_base64(r(256))",
        vec![
            MockReply::stdout(format!("{}\n", STANDARD.encode(b"import gc\n"))),
            MockReply::stdout("\n"),
        ],
    );
    let dest = format!("{}/", dir.path().display());

    let (result, _) = run(&board, &fs_options(&["cp", ":boot.py", &dest]));
    result.unwrap();
    assert_eq!(fs::read(dir.path().join("boot.py")).unwrap(), b"import gc\n");
}

#[test]
fn test_fs_cp_recursive_directory_with_trailing_slash() {
    let dir = TempDir::new().unwrap();
    let lib = dir.path().join("lib");
    fs::create_dir(&lib).unwrap();
    fs::write(lib.join("a.py"), b"a = 1\n").unwrap();

    let board = MockBoard::new();
    let src = format!("{}/", lib.display());

    let (result, _) = run(&board, &fs_options(&["cp", "-r", &src, ":"]));
    result.unwrap();

    let history = board.history();
    assert!(history[0].contains("os.mkdir('lib')"));
    assert!(history.iter().any(|s| s.contains("f=open('lib/a.py','wb')")));
    assert!(!history.iter().any(|s| s.contains("os.mkdir('')")));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_init_config_creates_then_keeps() {
    let dir = TempDir::new().unwrap();

    let mut out = Vec::new();
    let path = init_config(dir.path(), &mut out).unwrap();
    assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
    assert!(String::from_utf8_lossy(&out).contains("created"));

    fs::write(&path, "{\"device\": \"COM7\"}").unwrap();
    let mut out = Vec::new();
    init_config(dir.path(), &mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"device\": \"COM7\"}");
}

// =============================================================================
// Port listing
// =============================================================================

#[test]
fn test_list_ports_one_line_per_port() {
    let ports = vec![
        PortEntry {
            name: "/dev/ttyACM0".to_string(),
            description: Some("USB 2e8a:0005 Board in FS mode".to_string()),
        },
        PortEntry {
            name: "/dev/ttyS0".to_string(),
            description: None,
        },
    ];

    let mut out = Vec::new();
    list_ports(&ports, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "/dev/ttyACM0  USB 2e8a:0005 Board in FS mode\n/dev/ttyS0\n"
    );
}

#[test]
fn test_list_ports_empty() {
    let mut out = Vec::new();
    list_ports(&[], &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "No serial ports found.\n");
}
