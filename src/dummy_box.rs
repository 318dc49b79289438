//! A stand-in for the real box, for tests and for running the CLI without
//! hardware plugged in.
//!
//! A [`DummyTransport`] either plays back a fixed script of status bytes or
//! streams a randomly changing button state the way a participant mashing
//! buttons would, at the box's rate of one byte every 1.25 ms. Like the real
//! box it only reports while streaming, i.e. between a [`BEGIN_STREAMING`]
//! and an [`END_STREAMING`] byte. Whatever the driver writes ends up in a
//! shared [`DummyLog`], which we can keep a handle to after the transport
//! itself has been moved into an [`SrBox`](crate::srbox::SrBox).

use crate::protocol::{ButtonSet, BEGIN_STREAMING, END_STREAMING};
use crate::transport::{Connector, Transport};
use rand::prelude::*;
use std::{
    collections::VecDeque,
    io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

/// The real box streams roughly 800 status bytes a second.
const STREAM_INTERVAL: Duration = Duration::from_micros(1250);

/// What has been done to a [`DummyTransport`].
#[derive(Debug, Default)]
pub struct DummyLog {
    /// Every byte written, oldest first.
    pub written: Vec<u8>,
    /// How many times the buffers were discarded.
    pub discards: usize,
    /// How many bytes were served to the driver.
    pub served: usize,
}

#[derive(Debug)]
enum Source {
    Script(VecDeque<u8>),
    Random {
        rng: StdRng,
        buttons: u8,
        held: u8,
        change_chance: f64,
        next_at: Instant,
    },
    Unplugged,
}

/// A scripted or random SRBox.
#[derive(Debug)]
pub struct DummyTransport {
    source: Source,
    streaming: bool,
    log: Arc<Mutex<DummyLog>>,
    writes_fail: Arc<AtomicBool>,
}

impl DummyTransport {
    /// Serve `bytes` one per read while streaming, then time out forever.
    ///
    /// The script models what arrives after the buffers are flushed, so
    /// discarding does not eat into it.
    pub fn scripted(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self::with_source(Source::Script(bytes.into_iter().collect()))
    }

    /// Stream a held-button level that switches to a new random combination
    /// of `buttons` with probability `change_chance` on each read.
    pub fn random(buttons: ButtonSet, change_chance: f64) -> Self {
        Self::random_from(StdRng::from_entropy(), buttons, change_chance)
    }

    /// Like [`DummyTransport::random`], but reproducible.
    pub fn seeded(seed: u64, buttons: ButtonSet, change_chance: f64) -> Self {
        Self::random_from(StdRng::seed_from_u64(seed), buttons, change_chance)
    }

    /// Every read fails, as if the cable had been pulled.
    pub fn unplugged() -> Self {
        Self::with_source(Source::Unplugged)
    }

    fn random_from(rng: StdRng, buttons: ButtonSet, change_chance: f64) -> Self {
        Self::with_source(Source::Random {
            rng,
            buttons: buttons.bits(),
            held: 0,
            change_chance: change_chance.clamp(0.0, 1.0),
            next_at: Instant::now(),
        })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            streaming: false,
            log: Arc::new(Mutex::new(DummyLog::default())),
            writes_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle on the log that stays valid after the transport is moved.
    pub fn log(&self) -> Arc<Mutex<DummyLog>> {
        Arc::clone(&self.log)
    }

    /// A switch that, once set, makes every write and discard fail. Like
    /// [`DummyTransport::log`] it can be flipped after the transport has
    /// been handed over.
    pub fn write_fault(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.writes_fail)
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.writes_fail.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "dummy box refuses writes",
            ));
        }
        Ok(())
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        match &mut self.source {
            Source::Script(bytes) => Ok(bytes.pop_front()),
            Source::Random {
                rng,
                buttons,
                held,
                change_chance,
                next_at,
            } => {
                let now = Instant::now();
                if now < *next_at {
                    return Ok(None);
                }
                *next_at = now + STREAM_INTERVAL;
                if rng.gen_bool(*change_chance) {
                    *held = rng.gen::<u8>() & *buttons;
                }
                Ok(Some(*held))
            }
            Source::Unplugged => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "dummy box unplugged",
            )),
        }
    }
}

impl Transport for DummyTransport {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.streaming && !matches!(self.source, Source::Unplugged) {
            return Ok(None);
        }
        let byte = self.next_byte()?;
        if byte.is_some() {
            self.log.lock().unwrap_or_else(PoisonError::into_inner).served += 1;
        }
        Ok(byte)
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.check_writable()?;
        match byte {
            BEGIN_STREAMING => self.streaming = true,
            END_STREAMING => self.streaming = false,
            _ => {}
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .written
            .push(byte);
        Ok(())
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        self.check_writable()?;
        self.log.lock().unwrap_or_else(PoisonError::into_inner).discards += 1;
        Ok(())
    }
}

/// A fake port list for exercising discovery.
///
/// Every port in `ports` is listed; the ones in `refusing` fail to open.
/// Opened ports get a scripted transport built from `script`.
#[derive(Debug, Clone, Default)]
pub struct DummyConnector {
    ports: Vec<PathBuf>,
    refusing: Vec<PathBuf>,
    script: Vec<u8>,
}

impl DummyConnector {
    /// A connector listing `ports`, all of which open.
    pub fn new<P: Into<PathBuf>>(ports: impl IntoIterator<Item = P>) -> Self {
        Self {
            ports: ports.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Make `port` fail to open.
    pub fn refuse(mut self, port: impl Into<PathBuf>) -> Self {
        self.refusing.push(port.into());
        self
    }

    /// Bytes served by every transport this connector opens.
    pub fn script(mut self, bytes: impl IntoIterator<Item = u8>) -> Self {
        self.script = bytes.into_iter().collect();
        self
    }
}

impl Connector for DummyConnector {
    type Transport = DummyTransport;

    fn available_ports(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self.ports.clone())
    }

    fn open(
        &self,
        port: &Path,
        _baud_rate: u32,
        _read_timeout: Duration,
    ) -> io::Result<DummyTransport> {
        if self.refusing.iter().any(|p| p == port) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is busy", port.display()),
            ));
        }
        Ok(DummyTransport::scripted(self.script.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_only_served_while_streaming() {
        let mut dummy = DummyTransport::scripted([0x01, 0x02]);
        let log = dummy.log();

        assert_eq!(dummy.read_byte().unwrap(), None);
        dummy.write_byte(BEGIN_STREAMING).unwrap();
        assert_eq!(dummy.read_byte().unwrap(), Some(0x01));
        dummy.write_byte(END_STREAMING).unwrap();
        assert_eq!(dummy.read_byte().unwrap(), None);
        dummy.write_byte(BEGIN_STREAMING).unwrap();
        assert_eq!(dummy.read_byte().unwrap(), Some(0x02));
        assert_eq!(dummy.read_byte().unwrap(), None);

        let log = log.lock().unwrap();
        assert_eq!(log.written, vec![BEGIN_STREAMING, END_STREAMING, BEGIN_STREAMING]);
        assert_eq!(log.served, 2);
    }

    #[test]
    fn random_box_only_presses_allowed_buttons() {
        let allowed = ButtonSet::from_buttons([2, 4]).unwrap();
        let mut dummy = DummyTransport::seeded(7, allowed, 0.5);
        dummy.write_byte(BEGIN_STREAMING).unwrap();

        let mut served = 0;
        while served < 50 {
            if let Some(byte) = dummy.read_byte().unwrap() {
                assert_eq!(byte & !allowed.bits(), 0);
                served += 1;
            }
        }
    }

    #[test]
    fn unplugged_box_fails_reads() {
        let mut dummy = DummyTransport::unplugged();
        assert!(dummy.read_byte().is_err());
    }

    #[test]
    fn write_fault_fails_writes_and_discards() {
        let mut dummy = DummyTransport::scripted([0x01]);
        let log = dummy.log();
        dummy.write_byte(BEGIN_STREAMING).unwrap();

        dummy.write_fault().store(true, Ordering::Release);
        assert!(dummy.write_byte(END_STREAMING).is_err());
        assert!(dummy.discard_buffers().is_err());
        assert_eq!(dummy.read_byte().unwrap(), Some(0x01));

        let log = log.lock().unwrap();
        assert_eq!(log.written, vec![BEGIN_STREAMING]);
        assert_eq!(log.discards, 0);
    }

    #[test]
    fn refusing_ports_fail_to_open() {
        let connector = DummyConnector::new(["/dev/ttyS0", "/dev/ttyS1"]).refuse("/dev/ttyS0");
        assert_eq!(connector.available_ports().unwrap().len(), 2);
        assert!(connector
            .open(Path::new("/dev/ttyS0"), 19200, Duration::ZERO)
            .is_err());
        assert!(connector
            .open(Path::new("/dev/ttyS1"), 19200, Duration::ZERO)
            .is_ok());
    }
}
