//! The byte-level channel to the box.
//!
//! The driver only ever needs three things from a serial port: read one
//! byte without blocking for long, write one control byte, and throw away
//! whatever is sitting in the buffers. [`Transport`] is that capability, and
//! [`Connector`] is how we find and open one. Real hardware goes through
//! [`SerialConnector`], tests and dry runs go through
//! [`dummy_box`](crate::dummy_box).

use log::debug;
use serial2::SerialPort;
use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::Duration,
};

/// A half-duplex, byte-oriented channel to an SRBox.
///
/// Closing is dropping.
pub trait Transport: Send {
    /// Read a single byte. `Ok(None)` means the read timed out with nothing
    /// available, which is the normal idle case at a zero timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write a single control byte.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Discard both the input and output buffers.
    fn discard_buffers(&mut self) -> io::Result<()>;
}

/// Enumerates and opens ports.
pub trait Connector {
    /// The transport this connector opens.
    type Transport: Transport + 'static;

    /// Every port the OS reports, in its order.
    fn available_ports(&self) -> io::Result<Vec<PathBuf>>;

    /// Open `port` at `baud_rate`, with `read_timeout` applied to single
    /// byte reads.
    fn open(&self, port: &Path, baud_rate: u32, read_timeout: Duration)
        -> io::Result<Self::Transport>;
}

/// Opens real serial ports through [`serial2`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Transport = SerialPort;

    fn available_ports(&self) -> io::Result<Vec<PathBuf>> {
        SerialPort::available_ports()
    }

    fn open(
        &self,
        port: &Path,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> io::Result<SerialPort> {
        let mut serial = SerialPort::open(port, baud_rate)?;
        serial.set_read_timeout(read_timeout)?;
        debug!("Opened {} at {} baud", port.display(), baud_rate);
        Ok(serial)
    }
}

impl Transport for SerialPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match Read::read(self, &mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if is_timeout(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        Write::write_all(self, &[byte])
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        SerialPort::discard_buffers(self)
    }
}

/// Read one byte through a transport shared with other threads, holding the
/// lock for that read only. When nothing came in, sleep for `idle` before
/// handing control back to the poll loop.
pub(crate) fn poll_shared<T: Transport>(
    transport: &Mutex<T>,
    idle: Duration,
) -> io::Result<Option<u8>> {
    let byte = transport
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .read_byte()?;
    if byte.is_none() && !idle.is_zero() {
        spin_sleep::sleep(idle);
    }
    Ok(byte)
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
