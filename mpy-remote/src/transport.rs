// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport layer for board communication.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use tracing::{debug, info};

use crate::error::{PyboardError, Result};

/// Read timeout of the port. Reads poll at this interval; overall timeouts
/// are enforced by the session on top of it.
pub const POLL_INTERVAL_MS: u64 = 10;

/// A byte link to a board.
pub trait Link: Read + Write {
    /// Number of bytes that can be read without blocking.
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    fn timeout(&self) -> Duration;

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Human readable name of the link, if any.
    fn name(&self) -> Option<String> {
        None
    }

    /// Discard any pending input.
    fn drain(&mut self) -> io::Result<()> {
        let mut buf = [0u8; 64];
        loop {
            let n = self.bytes_to_read()? as usize;
            if n == 0 {
                return Ok(());
            }
            let len = n.min(buf.len());
            self.read(&mut buf[..len])?;
        }
    }
}

/// A serial port present on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    /// Name to pass as `--device`.
    pub name: String,
    pub description: Option<String>,
}

impl From<SerialPortInfo> for PortEntry {
    fn from(info: SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let mut text = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
                if let Some(product) = usb.product.or(usb.manufacturer) {
                    text.push(' ');
                    text.push_str(&product);
                }
                Some(text)
            }
            SerialPortType::BluetoothPort => Some("Bluetooth".to_string()),
            SerialPortType::PciPort => Some("PCI".to_string()),
            SerialPortType::Unknown => None,
        };
        Self {
            name: info.port_name,
            description,
        }
    }
}

/// Serial ports on this host, sorted by name.
pub fn available_ports() -> Result<Vec<PortEntry>> {
    let mut ports: Vec<PortEntry> = serialport::available_ports()
        .map_err(PyboardError::Enumerate)?
        .into_iter()
        .map(PortEntry::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} serial ports", ports.len());
    Ok(ports)
}

/// Serial port link to a board.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open `device` at `baudrate`.
    pub fn open(device: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(device, baudrate)
            .timeout(Duration::from_millis(POLL_INTERVAL_MS))
            .open()
            .map_err(|source| PyboardError::Access {
                device: device.to_string(),
                source,
            })?;
        debug!("Opened {} at {} baud", device, baudrate);
        Ok(Self { port })
    }

    /// Open `device`, retrying once per second for up to `wait_secs` seconds.
    pub fn open_with_wait(device: &str, baudrate: u32, wait_secs: u64) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::open(device, baudrate) {
                Ok(link) => return Ok(link),
                Err(e) if attempt >= wait_secs => return Err(e),
                Err(e) => {
                    if attempt == 0 {
                        info!("Waiting {} seconds for {}", wait_secs, device);
                    }
                    debug!("Open attempt {} failed: {}", attempt + 1, e);
                }
            }
            attempt += 1;
            thread::sleep(Duration::from_secs(1));
        }
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialLink {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port.bytes_to_read().map_err(io::Error::from)
    }

    fn timeout(&self) -> Duration {
        self.port.timeout()
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::from)
    }

    fn name(&self) -> Option<String> {
        self.port.name()
    }
}
