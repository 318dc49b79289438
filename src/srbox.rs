//! The [`SrBox`] handle: one per physical box, owning its transport.
//!
//! The handle drives the lights and the input session directly and offers
//! two ways of collecting responses:
//!
//! - [`SrBox::wait_for_keys`] blocks the calling thread until a qualifying
//!   press or a timeout.
//! - [`SrBox::start_recording`] / [`SrBox::get_keys`] poll on a background
//!   thread while the caller does something else, like drawing frames.
//!
//! Only one of them may poll at a time. While a recording runs it owns the
//! input session, and anything else that would poll or switch the session
//! fails with [`SrBoxError::RecorderAlreadyActive`]. Light writes still go
//! through since they never read.

use crate::clock::Clock;
use crate::config::BoxSettings;
use crate::discovery::open_port;
use crate::error::{Result, SrBoxError};
use crate::lights::LightVector;
use crate::protocol::{decode_keys, ButtonSet, BUTTON_COUNT};
use crate::recorder::{filter, CapturedEvent, RecordParams, Recorder};
use crate::session::{InputSession, InputState};
use crate::transport::{poll_shared, Connector, SerialConnector, Transport};
use log::{debug, info, warn};
use serial2::SerialPort;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

/// A connected SRBox.
pub struct SrBox<T: Transport + 'static> {
    port: PathBuf,
    settings: BoxSettings,
    // `None` once closed.
    transport: Option<Arc<Mutex<T>>>,
    session: InputSession,
    lights: LightVector,
    recorder: Option<Recorder>,
}

impl SrBox<SerialPort> {
    /// Connect to a box over a real serial port, probing every port when
    /// `settings.port` is `None`.
    pub fn open(settings: &BoxSettings) -> Result<Self> {
        Self::connect(&SerialConnector, settings)
    }
}

impl<T: Transport + 'static> SrBox<T> {
    /// Connect through any [`Connector`].
    pub fn connect<C>(connector: &C, settings: &BoxSettings) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        let (port, transport) = open_port(
            connector,
            settings.port.as_deref(),
            settings.baud_rate,
            settings.read_timeout(),
        )?;
        Self::from_transport(port, transport, settings.clone())
    }

    /// Wrap a transport that is already open.
    ///
    /// The lights are in an unknown state at power-up, so they are all
    /// switched off here.
    pub fn from_transport(
        port: impl Into<PathBuf>,
        transport: T,
        settings: BoxSettings,
    ) -> Result<Self> {
        let mut srbox = Self {
            port: port.into(),
            settings,
            transport: Some(Arc::new(Mutex::new(transport))),
            session: InputSession::new(),
            lights: LightVector::new(),
            recorder: None,
        };
        srbox.update_lights()?;
        info!("Connected to SRBox on {}", srbox.port.display());
        Ok(srbox)
    }

    /// The port the box was found on.
    pub fn port(&self) -> &Path {
        &self.port
    }

    /// The settings the box was opened with.
    pub fn settings(&self) -> &BoxSettings {
        &self.settings
    }

    /// Whether the box is streaming.
    pub fn input_state(&self) -> InputState {
        self.session.state()
    }

    /// Whether [`SrBox::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Whether a recording is attached, finished or not, that has not been
    /// drained with [`SrBox::get_keys`] yet.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// The in-memory light vector, which may be ahead of the hardware.
    pub fn lights(&self) -> &LightVector {
        &self.lights
    }

    // ---- lights ----

    /// Switch light `index` (`1..=5`). Nothing is sent unless `update`.
    pub fn set_light(&mut self, index: u8, on: bool, update: bool) -> Result<()> {
        self.shared()?;
        self.lights.set(index, on)?;
        if update {
            self.update_lights()?;
        }
        Ok(())
    }

    /// Set all five lights. Nothing is sent unless `update`.
    pub fn set_lights(&mut self, lights: [bool; BUTTON_COUNT], update: bool) -> Result<()> {
        self.shared()?;
        self.lights.set_all(lights);
        if update {
            self.update_lights()?;
        }
        Ok(())
    }

    /// Send the light vector to the box as a single status byte.
    pub fn update_lights(&mut self) -> Result<()> {
        let transport = self.shared()?;
        let status = self.lights.status_byte();
        transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_byte(status)?;
        debug!("Lights -> {:#010b}", status);
        Ok(())
    }

    /// Blink `lights` every `interval` for `duration`, then leave them off.
    ///
    /// Blocks for the whole `duration`.
    pub fn blink_lights(
        &mut self,
        lights: &[u8],
        interval: Duration,
        duration: Duration,
    ) -> Result<()> {
        self.shared()?;
        for &light in lights {
            self.lights.get(light)?;
        }

        let start = Instant::now();
        let mut toggled_at = start;
        let mut on = true;
        while start.elapsed() < duration {
            if toggled_at.elapsed() >= interval {
                for &light in lights {
                    self.lights.set(light, on)?;
                }
                self.update_lights()?;
                toggled_at = Instant::now();
                on = !on;
            }
            let until_toggle = interval.saturating_sub(toggled_at.elapsed());
            let until_done = duration.saturating_sub(start.elapsed());
            spin_sleep::sleep(until_toggle.min(until_done));
        }

        for &light in lights {
            self.lights.set(light, false)?;
        }
        self.update_lights()
    }

    // ---- input session ----

    /// Flush the buffers and put the box into streaming mode.
    pub fn start_input(&mut self) -> Result<()> {
        self.ensure_not_recording()?;
        self.begin_streaming()
    }

    /// Flush the buffers and take the box out of streaming mode. Safe to
    /// call when already idle.
    pub fn stop_input(&mut self) -> Result<()> {
        self.ensure_not_recording()?;
        self.end_streaming()
    }

    /// Release the port. Any recording still running is stopped and its
    /// events thrown away. Every call after this, including another
    /// `close()`, fails with [`SrBoxError::DeviceClosed`].
    pub fn close(&mut self) -> Result<()> {
        let Some(transport) = self.transport.take() else {
            return Err(SrBoxError::DeviceClosed);
        };
        if let Some(recorder) = self.recorder.take() {
            match recorder.finish() {
                Ok(events) => warn!("Closing with {} undrained events", events.len()),
                Err(e) => warn!("Recorder failed while closing: {}", e),
            }
        }

        let flushed = self
            .session
            .close(&mut *transport.lock().unwrap_or_else(PoisonError::into_inner));
        info!("Closed SRBox on {}", self.port.display());
        Ok(flushed?)
    }

    // ---- responses ----

    /// Block until one of `allowed` (any button if `None`) is pressed, or
    /// `timeout` runs out.
    ///
    /// `Ok(None)` means nobody pressed anything that counts, which is a
    /// perfectly normal outcome and not an error. The event is stamped with
    /// `clock.now()` if a clock is given, otherwise with the time since this
    /// call started. The session is left idle either way.
    pub fn wait_for_keys(
        &mut self,
        allowed: Option<ButtonSet>,
        timeout: Option<Duration>,
        clock: Option<&dyn Clock>,
    ) -> Result<Option<CapturedEvent>> {
        let transport = self.shared()?;
        self.ensure_not_recording()?;
        let started = Instant::now();
        if !self.session.is_streaming() {
            self.begin_streaming()?;
        }

        let poll_interval = self.settings.poll_interval();
        while timeout.map_or(true, |t| started.elapsed() < t) {
            let Some(raw) = poll_shared(&transport, poll_interval)? else {
                continue;
            };
            let buttons = filter(decode_keys(raw), allowed);
            if buttons.is_empty() {
                continue;
            }

            let timestamp = clock.map_or_else(|| started.elapsed(), |c| c.now());
            self.end_streaming()?;
            debug!("Got {} after {:?}", buttons, started.elapsed());
            return Ok(Some(CapturedEvent {
                timestamp: Some(timestamp),
                buttons,
            }));
        }

        debug!("No response within {:?}", timeout);
        self.end_streaming()?;
        Ok(None)
    }

    /// Start recording presses of `allowed` (any button if `None`) in the
    /// background, for at most `max_duration`. Returns straight away.
    pub fn start_recording(
        &mut self,
        allowed: Option<ButtonSet>,
        timestamped: bool,
        max_duration: Option<Duration>,
    ) -> Result<()> {
        let transport = self.shared()?;
        self.ensure_not_recording()?;
        if !self.session.is_streaming() {
            self.begin_streaming()?;
        }

        let params = RecordParams {
            allowed,
            timestamped,
            max_duration,
            poll_interval: self.settings.poll_interval(),
        };
        self.recorder = Some(Recorder::spawn(transport, params)?);
        Ok(())
    }

    /// [`SrBox::start_recording`] with the time limit from the settings.
    pub fn start_recording_with_defaults(
        &mut self,
        allowed: Option<ButtonSet>,
        timestamped: bool,
    ) -> Result<()> {
        let max_duration = self.settings.max_record_duration();
        self.start_recording(allowed, timestamped, max_duration)
    }

    /// Stop the recording, return the session to idle and hand over every
    /// event recorded, oldest first.
    pub fn get_keys(&mut self) -> Result<Vec<CapturedEvent>> {
        self.shared()?;
        let recorder = self.recorder.take().ok_or(SrBoxError::NoActiveRecording)?;
        if recorder.is_finished() {
            debug!("Recorder had already stopped on its own");
        }

        let events = recorder.finish();
        let stopped = self.end_streaming();
        let events = events?;
        stopped?;
        Ok(events)
    }

    // ---- internals ----

    fn shared(&self) -> Result<Arc<Mutex<T>>> {
        self.transport
            .as_ref()
            .map(Arc::clone)
            .ok_or(SrBoxError::DeviceClosed)
    }

    fn ensure_not_recording(&self) -> Result<()> {
        match self.recorder {
            Some(_) => Err(SrBoxError::RecorderAlreadyActive),
            None => Ok(()),
        }
    }

    fn begin_streaming(&mut self) -> Result<()> {
        let transport = self.shared()?;
        let mut guard = transport.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.session.start(&mut *guard)?)
    }

    fn end_streaming(&mut self) -> Result<()> {
        let transport = self.shared()?;
        let mut guard = transport.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.session.stop(&mut *guard)?)
    }
}

impl<T: Transport + 'static> Drop for SrBox<T> {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                warn!("Failed to close SRBox on {}: {}", self.port.display(), e);
            }
        }
    }
}
