// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Raw REPL protocol constants shared by the host client and the test board.
//!
//! A MicroPython board exposes two modes on its serial console: the friendly
//! REPL (echoing, `>>> ` prompt) and the raw REPL (no echo, `>` prompt). In raw
//! mode a script is sent followed by Ctrl-D; the board answers `OK`, then the
//! script's stdout, a Ctrl-D, its stderr (a traceback, if any), another Ctrl-D
//! and finally the `>` prompt.
//!
//! Newer firmware also supports raw-paste mode, a flow-controlled variant that
//! the host negotiates per script with [`RAW_PASTE_REQUEST`].

// --- Control bytes ---

pub const CTRL_A: u8 = 0x01;
pub const CTRL_B: u8 = 0x02;
pub const CTRL_C: u8 = 0x03;
pub const CTRL_D: u8 = 0x04;
pub const CTRL_E: u8 = 0x05;

// --- Host -> board sequences ---

/// Interrupt whatever program is running.
pub const INTERRUPT_SEQUENCE: &[u8] = b"\r\x03";
/// Switch to raw REPL.
pub const ENTER_RAW_SEQUENCE: &[u8] = b"\r\x01";
/// Leave raw REPL for the friendly REPL.
pub const EXIT_RAW_SEQUENCE: &[u8] = b"\r\x02";
/// Ask the board to accept the next script in raw-paste mode.
pub const RAW_PASTE_REQUEST: &[u8] = b"\x05A\x01";

// --- Board -> host markers ---

pub const RAW_REPL_BANNER: &[u8] = b"raw REPL; CTRL-B to exit\r\n";
/// Tail of the banner plus prompt, used to re-sync after firmware that echoed
/// the raw-paste request instead of answering it.
pub const RAW_REPL_RESYNC: &[u8] = b"w REPL; CTRL-B to exit\r\n>";
pub const RAW_PROMPT: &[u8] = b">";
pub const FRIENDLY_PROMPT: &[u8] = b">>> ";
pub const SOFT_REBOOT: &[u8] = b"soft reboot\r\n";
pub const EXEC_OK: &[u8] = b"OK";
pub const EOF: &[u8] = b"\x04";

pub const RAW_PASTE_SUPPORTED: &[u8] = b"R\x01";
pub const RAW_PASTE_UNSUPPORTED: &[u8] = b"R\x00";

// --- Sizes and timing ---

pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Chunk size for scripts written in plain raw mode.
pub const RAW_WRITE_CHUNK: usize = 256;

/// Delay between plain raw-mode chunks in milliseconds.
pub const RAW_WRITE_DELAY_MS: u64 = 10;

/// Chunk size for file transfers (bytes of file content per exec).
pub const TRANSFER_CHUNK: usize = 256;

/// Idle timeout for one section of board output.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// REPL mode the board is currently in, as far as the host knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Friendly,
    Raw,
}

/// Board answer to [`RAW_PASTE_REQUEST`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPasteReply {
    /// `R\x01`: a little-endian window increment follows.
    Supported,
    /// `R\x00`: the board stays in raw mode, send the script the plain way.
    Unsupported,
    /// Old firmware that treated the request as input.
    Unrecognized,
}

impl RawPasteReply {
    pub fn classify(reply: &[u8]) -> Self {
        if reply == RAW_PASTE_SUPPORTED {
            Self::Supported
        } else if reply == RAW_PASTE_UNSUPPORTED {
            Self::Unsupported
        } else {
            Self::Unrecognized
        }
    }
}

/// Decode the raw-paste window increment sent right after `R\x01`.
pub fn window_increment(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Split a complete exec reply into (stdout, stderr).
///
/// Accepts `[OK]<stdout>\x04<stderr>\x04[>]`. Returns None when either
/// terminator is missing.
pub fn split_exec_output(frame: &[u8]) -> Option<(&[u8], &[u8])> {
    let body = frame.strip_prefix(EXEC_OK).unwrap_or(frame);
    let first = body.iter().position(|&b| b == CTRL_D)?;
    let (stdout, rest) = (&body[..first], &body[first + 1..]);
    let second = rest.iter().position(|&b| b == CTRL_D)?;
    Some((stdout, &rest[..second]))
}

/// Drop stray Ctrl-D bytes from board output before showing it to a user.
pub fn strip_eof(data: &[u8]) -> Vec<u8> {
    data.iter().copied().filter(|&b| b != CTRL_D).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_raw_paste_replies() {
        assert_eq!(RawPasteReply::classify(b"R\x01"), RawPasteReply::Supported);
        assert_eq!(RawPasteReply::classify(b"R\x00"), RawPasteReply::Unsupported);
        assert_eq!(RawPasteReply::classify(b"ra"), RawPasteReply::Unrecognized);
        assert_eq!(RawPasteReply::classify(b""), RawPasteReply::Unrecognized);
    }

    #[test]
    fn test_window_increment_is_little_endian() {
        assert_eq!(window_increment([0x80, 0x00]), 128);
        assert_eq!(window_increment([0x00, 0x01]), 256);
    }

    #[test]
    fn test_split_exec_output_with_ok_and_prompt() {
        let (out, err) = split_exec_output(b"OK/flash\x04\x04>").unwrap();
        assert_eq!(out, b"/flash");
        assert!(err.is_empty());
    }

    #[test]
    fn test_split_exec_output_with_traceback() {
        let frame = b"\x04Traceback (most recent call last):\r\nNameError\r\n\x04";
        let (out, err) = split_exec_output(frame).unwrap();
        assert!(out.is_empty());
        assert!(err.starts_with(b"Traceback"));
    }

    #[test]
    fn test_split_exec_output_missing_terminator() {
        assert!(split_exec_output(b"OKhello\x04partial").is_none());
        assert!(split_exec_output(b"OKhello").is_none());
    }

    #[test]
    fn test_strip_eof() {
        assert_eq!(strip_eof(b"a\x04b\x04"), b"ab");
    }

    #[test]
    fn test_banner_tail_matches_resync_marker() {
        let mut full = RAW_REPL_BANNER.to_vec();
        full.extend_from_slice(RAW_PROMPT);
        assert!(full.ends_with(RAW_REPL_RESYNC));
    }
}
