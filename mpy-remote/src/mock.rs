// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory board emulation for tests.
//!
//! `MockBoard` speaks the console side of the protocol: friendly and raw
//! REPL, soft reboot, raw-paste with window flow control, and the banner
//! echo of firmware without raw-paste. Scripts are not interpreted; their
//! replies come from rules matched by substring, in insertion order.
//!
//! ```
//! use mpy_remote::mock::{MockBoard, MockReply};
//! use mpy_remote::Pyboard;
//!
//! let board = MockBoard::new().on_exec("os.getcwd()", MockReply::stdout("/flash"));
//! let mut pyb = Pyboard::new(board.clone());
//! pyb.enter_raw_repl(true).unwrap();
//! assert_eq!(pyb.exec("print(os.getcwd(), end='')").unwrap(), b"/flash");
//! assert_eq!(board.history().len(), 1);
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use mpy_common::protocol::{
    CTRL_A, CTRL_B, CTRL_C, CTRL_D, CTRL_E, EXEC_OK, FRIENDLY_PROMPT, RAW_PROMPT,
    RAW_REPL_BANNER,
};
use mpy_common::ReplMode;

use crate::transport::Link;

const FRIENDLY_BANNER: &[u8] =
    b"\r\nMicroPython v1.22.0 on 2024-01-01; MockBoard with mock\r\nType \"help()\" for more information.\r\n>>> ";

/// Output of one emulated script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockReply {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl MockReply {
    pub fn stdout(text: impl AsRef<[u8]>) -> Self {
        Self {
            stdout: text.as_ref().to_vec(),
            stderr: Vec::new(),
        }
    }

    /// A script that raised; `text` is the traceback.
    pub fn exception(text: impl AsRef<[u8]>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: text.as_ref().to_vec(),
        }
    }

    /// Traceback of an `OSError` with the given errno name, as the board prints it.
    pub fn os_error(errno: u32) -> Self {
        Self::exception(format!(
            "Traceback (most recent call last):\r\n  File \"<stdin>\", line 2, in <module>\r\nOSError: [Errno {}] {}\r\n",
            errno,
            match errno {
                2 => "ENOENT",
                17 => "EEXIST",
                _ => "EIO",
            }
        ))
    }
}

struct Rule {
    pattern: String,
    replies: VecDeque<MockReply>,
}

#[derive(Debug, Clone, Copy)]
struct Paste {
    window: usize,
    since_ack: usize,
}

enum PasteSupport {
    Window(u16),
    Unsupported,
    /// Firmware that answers the request with its raw banner.
    Legacy,
}

struct MockState {
    mode: ReplMode,
    paste_support: PasteSupport,
    paste: Option<Paste>,
    input: Vec<u8>,
    rx: VecDeque<u8>,
    rules: Vec<Rule>,
    history: Vec<String>,
    written: Vec<u8>,
    soft_resets: usize,
}

/// Emulated board that implements [`Link`]. Clones share state, so a test can
/// keep one clone for inspection while the session owns another.
#[derive(Clone)]
pub struct MockBoard {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBoard {
    /// A board in friendly REPL mode without raw-paste support.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                mode: ReplMode::Friendly,
                paste_support: PasteSupport::Unsupported,
                paste: None,
                input: Vec::new(),
                rx: VecDeque::new(),
                rules: Vec::new(),
                history: Vec::new(),
                written: Vec::new(),
                soft_resets: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept raw-paste with the given window increment.
    pub fn with_raw_paste(self, window: u16) -> Self {
        self.lock().paste_support = PasteSupport::Window(window);
        self
    }

    /// Behave like firmware that predates raw-paste.
    pub fn with_legacy_firmware(self) -> Self {
        self.lock().paste_support = PasteSupport::Legacy;
        self
    }

    /// Reply to scripts containing `pattern`.
    pub fn on_exec(self, pattern: &str, reply: MockReply) -> Self {
        self.on_exec_sequence(pattern, vec![reply])
    }

    /// Reply to successive scripts containing `pattern` with `replies` in
    /// order; the last reply repeats once the others are used up.
    pub fn on_exec_sequence(self, pattern: &str, replies: Vec<MockReply>) -> Self {
        self.lock().rules.push(Rule {
            pattern: pattern.to_string(),
            replies: replies.into(),
        });
        self
    }

    /// Scripts executed so far, in order.
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Every byte the host has written.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn mode(&self) -> ReplMode {
        self.lock().mode
    }

    pub fn soft_resets(&self) -> usize {
        self.lock().soft_resets
    }

    /// Queue unsolicited output, e.g. from a program running after a reset.
    pub fn push_output(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes.iter().copied());
    }
}

impl MockState {
    fn send(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    fn send_raw_banner(&mut self) {
        self.send(RAW_REPL_BANNER);
        self.send(RAW_PROMPT);
    }

    fn receive(&mut self, byte: u8) {
        if let Some(paste) = self.paste {
            self.receive_paste(byte, paste);
            return;
        }
        match self.mode {
            ReplMode::Friendly => self.receive_friendly(byte),
            ReplMode::Raw => self.receive_raw(byte),
        }
    }

    fn receive_friendly(&mut self, byte: u8) {
        match byte {
            CTRL_A => {
                self.mode = ReplMode::Raw;
                self.input.clear();
                self.send(b"\r\n");
                self.send_raw_banner();
            }
            CTRL_C => {
                self.send(b"\r\n");
                self.send(FRIENDLY_PROMPT);
            }
            CTRL_D => {
                self.soft_resets += 1;
                self.send(b"MPY: soft reboot\r\n");
                self.send(FRIENDLY_BANNER);
            }
            other => self.send(&[other]),
        }
    }

    fn receive_raw(&mut self, byte: u8) {
        match byte {
            CTRL_A if self.input.ends_with(&[CTRL_E, b'A']) => {
                let len = self.input.len() - 2;
                self.input.truncate(len);
                self.start_paste();
            }
            CTRL_A => {
                self.input.clear();
                self.send_raw_banner();
            }
            CTRL_B => {
                self.input.clear();
                self.mode = ReplMode::Friendly;
                self.send(FRIENDLY_BANNER);
            }
            CTRL_C => self.input.clear(),
            CTRL_D if self.input.is_empty() => {
                self.soft_resets += 1;
                self.send(EXEC_OK);
                self.send(b"\r\nMPY: soft reboot\r\n");
                self.send_raw_banner();
            }
            CTRL_D => {
                let script = std::mem::take(&mut self.input);
                self.send(EXEC_OK);
                self.run(&script);
            }
            other => self.input.push(other),
        }
    }

    fn start_paste(&mut self) {
        match self.paste_support {
            PasteSupport::Window(window) => {
                self.send(b"R\x01");
                self.send(&window.to_le_bytes());
                self.paste = Some(Paste {
                    window: usize::from(window),
                    since_ack: 0,
                });
            }
            PasteSupport::Unsupported => self.send(b"R\x00"),
            PasteSupport::Legacy => self.send_raw_banner(),
        }
    }

    fn receive_paste(&mut self, byte: u8, mut paste: Paste) {
        if byte == CTRL_D {
            self.paste = None;
            self.send(&[CTRL_D]);
            let script = std::mem::take(&mut self.input);
            self.run(&script);
            return;
        }

        self.input.push(byte);
        paste.since_ack += 1;
        if paste.since_ack >= paste.window {
            paste.since_ack -= paste.window;
            self.send(&[CTRL_A]);
        }
        self.paste = Some(paste);
    }

    fn run(&mut self, script: &[u8]) {
        let script = String::from_utf8_lossy(script).into_owned();
        let reply = self
            .rules
            .iter_mut()
            .find(|rule| script.contains(&rule.pattern))
            .and_then(|rule| {
                if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().cloned()
                }
            })
            .unwrap_or_default();
        self.history.push(script);

        self.send(&reply.stdout);
        self.send(&[CTRL_D]);
        self.send(&reply.stderr);
        self.send(&[CTRL_D]);
        self.send(RAW_PROMPT);
    }
}

impl Read for MockBoard {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if state.rx.is_empty() {
            drop(state);
            thread::sleep(Duration::from_millis(1));
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data from mock board"));
        }

        let count = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for MockBoard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        state.written.extend_from_slice(buf);
        for &byte in buf {
            state.receive(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Link for MockBoard {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        Ok(self.lock().rx.len() as u32)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some("mock".to_string())
    }
}
