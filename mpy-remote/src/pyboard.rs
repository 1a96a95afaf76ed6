// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Raw REPL session with a board.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use mpy_common::protocol::{
    window_increment, CTRL_A, CTRL_D, ENTER_RAW_SEQUENCE, EOF, EXEC_OK, EXIT_RAW_SEQUENCE,
    FRIENDLY_PROMPT, INTERRUPT_SEQUENCE, RAW_PASTE_REQUEST, RAW_PROMPT, RAW_REPL_BANNER,
    RAW_REPL_RESYNC, RAW_WRITE_CHUNK, RAW_WRITE_DELAY_MS, SOFT_REBOOT,
};
use mpy_common::{RawPasteReply, ReplMode, DEFAULT_TIMEOUT_MS};

use crate::error::{PyboardError, Result};
use crate::transport::{Link, SerialLink};

/// Receives board output as it arrives instead of having it accumulated.
pub type DataConsumer<'a> = &'a mut dyn FnMut(&[u8]);

/// A session with one board over a [`Link`].
pub struct Pyboard<L: Link> {
    link: L,
    mode: ReplMode,
    use_raw_paste: bool,
    timeout: Duration,
}

impl Pyboard<SerialLink> {
    /// Open a serial board, waiting up to `wait_secs` seconds for the device.
    pub fn open(device: &str, baudrate: u32, wait_secs: u64) -> Result<Self> {
        Ok(Self::new(SerialLink::open_with_wait(device, baudrate, wait_secs)?))
    }
}

impl<L: Link> Pyboard<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            mode: ReplMode::Friendly,
            use_raw_paste: true,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Override the idle timeout used for protocol handshakes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> ReplMode {
        self.mode
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Release the link, closing the connection.
    pub fn close(self) -> L {
        self.link
    }

    /// Read until the received data ends with `ending`.
    ///
    /// Gives up after `timeout` without any new byte (`None` waits forever) and
    /// returns what was read so far; callers check the ending. With a consumer,
    /// bytes are handed over as they arrive (minus the terminator) and only the
    /// last byte is returned, so `ending` must then be a single byte.
    pub fn read_until(
        &mut self,
        min_num_bytes: usize,
        ending: &[u8],
        timeout: Option<Duration>,
        mut consumer: Option<DataConsumer<'_>>,
    ) -> Result<Vec<u8>> {
        debug_assert!(consumer.is_none() || ending.len() == 1);

        let mut data = Vec::new();
        let mut received = 0usize;
        let mut last_rx = Instant::now();
        let mut byte = [0u8; 1];

        loop {
            if received >= min_num_bytes && data.ends_with(ending) {
                break;
            }

            match self.link.read(&mut byte) {
                Ok(1) => {
                    received += 1;
                    last_rx = Instant::now();
                    match consumer.as_deref_mut() {
                        Some(consume) => {
                            data.clear();
                            data.push(byte[0]);
                            if !data.ends_with(ending) {
                                consume(&byte[..]);
                            }
                        }
                        None => data.push(byte[0]),
                    }
                    continue;
                }
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
                Err(e) => return Err(e.into()),
            }

            if let Some(timeout) = timeout {
                if last_rx.elapsed() >= timeout {
                    break;
                }
            }
        }

        Ok(data)
    }

    /// Read up to `count` bytes, stopping early on timeout.
    fn read_exact_timeout(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(count);
        let mut byte = [0u8; 1];
        let deadline = Instant::now() + self.timeout;

        while data.len() < count && Instant::now() < deadline {
            match self.link.read(&mut byte) {
                Ok(1) => data.push(byte[0]),
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(data)
    }

    fn expect_ending(&mut self, ending: &[u8], what: &str) -> Result<()> {
        let data = self.read_until(1, ending, Some(self.timeout), None)?;
        if !data.ends_with(ending) {
            debug!(
                "Expected {:?}, got {:?}",
                String::from_utf8_lossy(ending),
                String::from_utf8_lossy(&data)
            );
            return Err(PyboardError::protocol(format!("could not {}", what)));
        }
        Ok(())
    }

    /// Interrupt the running program and switch the board to raw REPL.
    ///
    /// With `soft_reset` the interpreter is restarted first, so each run starts
    /// from a clean heap (`boot.py` output shows up before the banner).
    pub fn enter_raw_repl(&mut self, soft_reset: bool) -> Result<()> {
        self.link.write_all(INTERRUPT_SEQUENCE)?;
        self.link.drain()?;
        self.link.write_all(ENTER_RAW_SEQUENCE)?;

        if soft_reset {
            let mut banner = RAW_REPL_BANNER.to_vec();
            banner.extend_from_slice(RAW_PROMPT);
            self.expect_ending(&banner, "enter raw repl")?;

            self.link.write_all(&[CTRL_D])?;
            self.expect_ending(SOFT_REBOOT, "enter raw repl")?;
            debug!("Soft reboot done");
        }

        self.expect_ending(RAW_REPL_BANNER, "enter raw repl")?;
        self.mode = ReplMode::Raw;
        debug!("Entered raw REPL");
        Ok(())
    }

    /// Drop back to the friendly REPL and wait for its prompt.
    pub fn exit_raw_repl(&mut self) -> Result<()> {
        self.link.drain()?;
        self.link.write_all(EXIT_RAW_SEQUENCE)?;
        self.mode = ReplMode::Friendly;
        self.expect_ending(FRIENDLY_PROMPT, "exit raw repl")?;
        debug!("Exited raw REPL");
        Ok(())
    }

    /// Send a script to the board without waiting for its output.
    pub fn exec_raw_no_follow(&mut self, command: impl AsRef<[u8]>) -> Result<()> {
        let command = command.as_ref();

        // Every exec starts at the raw prompt.
        let prompt = self.read_until(1, RAW_PROMPT, Some(self.timeout), None)?;
        if !prompt.ends_with(RAW_PROMPT) {
            return Err(PyboardError::Timeout("raw REPL prompt"));
        }

        if self.use_raw_paste {
            self.link.write_all(RAW_PASTE_REQUEST)?;
            let reply = self.read_exact_timeout(2)?;
            match RawPasteReply::classify(&reply) {
                RawPasteReply::Supported => return self.raw_paste_write(command),
                RawPasteReply::Unsupported => {
                    debug!("Raw-paste not supported, using plain raw mode");
                    self.use_raw_paste = false;
                }
                RawPasteReply::Unrecognized => {
                    // Firmware predates raw-paste and printed the banner again.
                    self.expect_ending(RAW_REPL_RESYNC, "enter raw repl")?;
                    self.use_raw_paste = false;
                }
            }
        }

        for chunk in command.chunks(RAW_WRITE_CHUNK) {
            self.link.write_all(chunk)?;
            thread::sleep(Duration::from_millis(RAW_WRITE_DELAY_MS));
        }
        self.link.write_all(EOF)?;

        let reply = self.read_exact_timeout(2)?;
        if reply != EXEC_OK {
            return Err(PyboardError::protocol(format!(
                "could not exec command (response: {:?})",
                String::from_utf8_lossy(&reply)
            )));
        }
        Ok(())
    }

    /// Write a script in raw-paste mode, honouring the board's flow control.
    fn raw_paste_write(&mut self, command: &[u8]) -> Result<()> {
        let header = self.read_exact_timeout(2)?;
        let increment = match header.as_slice() {
            [lo, hi] => window_increment([*lo, *hi]) as usize,
            _ => return Err(PyboardError::Timeout("raw-paste window size")),
        };
        debug!(
            "Raw-paste: {} bytes, window increment {}",
            command.len(),
            increment
        );

        let mut window_remain = increment;
        let mut sent = 0;
        while sent < command.len() {
            while window_remain == 0 || self.link.bytes_to_read()? > 0 {
                let flow = self.read_exact_timeout(1)?;
                match flow.first() {
                    Some(&CTRL_A) => window_remain += increment,
                    Some(&CTRL_D) => {
                        // Board aborted the paste; acknowledge and let follow() collect the error.
                        self.link.write_all(EOF)?;
                        return Ok(());
                    }
                    Some(other) => {
                        return Err(PyboardError::protocol(format!(
                            "unexpected read during raw paste: {:#04x}",
                            other
                        )))
                    }
                    None => return Err(PyboardError::Timeout("raw-paste flow control")),
                }
            }

            let end = (sent + window_remain).min(command.len());
            self.link.write_all(&command[sent..end])?;
            window_remain -= end - sent;
            sent = end;
        }

        self.link.write_all(EOF)?;
        let data = self.read_until(1, EOF, Some(self.timeout), None)?;
        if !data.ends_with(EOF) {
            return Err(PyboardError::protocol(format!(
                "could not complete raw paste: {:?}",
                String::from_utf8_lossy(&data)
            )));
        }
        Ok(())
    }

    /// Collect the output of the running script as (stdout, stderr).
    pub fn follow(
        &mut self,
        timeout: Option<Duration>,
        consumer: Option<DataConsumer<'_>>,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut stdout = self.read_until(1, EOF, timeout, consumer)?;
        if !stdout.ends_with(EOF) {
            return Err(PyboardError::Timeout("first EOF reception"));
        }
        stdout.pop();

        let mut stderr = self.read_until(1, EOF, timeout, None)?;
        if !stderr.ends_with(EOF) {
            return Err(PyboardError::Timeout("second EOF reception"));
        }
        stderr.pop();

        Ok((stdout, stderr))
    }

    /// Run a script and return (stdout, stderr) without judging the result.
    pub fn exec_raw(
        &mut self,
        command: impl AsRef<[u8]>,
        timeout: Option<Duration>,
        consumer: Option<DataConsumer<'_>>,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        self.exec_raw_no_follow(command)?;
        self.follow(timeout, consumer)
    }

    /// Run a script and return its stdout; a traceback becomes an error.
    pub fn exec(&mut self, command: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let timeout = Some(self.timeout);
        let (stdout, stderr) = self.exec_raw(command, timeout, None)?;
        if !stderr.is_empty() {
            return Err(PyboardError::Exception { stdout, stderr });
        }
        Ok(stdout)
    }

    /// Like [`Pyboard::exec`], streaming stdout into `consumer`.
    pub fn exec_with_consumer(
        &mut self,
        command: impl AsRef<[u8]>,
        consumer: DataConsumer<'_>,
    ) -> Result<()> {
        let timeout = Some(self.timeout);
        let (stdout, stderr) = self.exec_raw(command, timeout, Some(consumer))?;
        if !stderr.is_empty() {
            return Err(PyboardError::Exception { stdout, stderr });
        }
        Ok(())
    }

    /// Run a script and stream its stdout into `out`.
    pub fn exec_to_writer(&mut self, command: impl AsRef<[u8]>, out: &mut dyn Write) -> Result<()> {
        let mut write_error = None;
        let mut sink = |bytes: &[u8]| {
            if write_error.is_none() {
                if let Err(e) = out.write_all(bytes) {
                    write_error = Some(e);
                }
            }
        };
        self.exec_with_consumer(command, &mut sink)?;

        if let Some(e) = write_error {
            return Err(e.into());
        }
        out.flush()?;
        Ok(())
    }

    /// Evaluate a Python expression and return its printed form.
    pub fn eval(&mut self, expression: &str) -> Result<String> {
        let out = self.exec(format!("print({})", expression))?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    /// Run a local script file on the board.
    pub fn execfile(&mut self, path: &Path) -> Result<Vec<u8>> {
        let script = fs::read(path)?;
        self.exec(script)
    }
}
