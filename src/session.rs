//! Whether the box is streaming button state or sitting idle.
//!
//! Polling only means something while the box is streaming. The capture
//! strategies move the session into [`InputState::Streaming`] before they
//! poll and back to [`InputState::Idle`] when they are done; nothing
//! switches on its own.

use crate::protocol::{BEGIN_STREAMING, END_STREAMING};
use crate::transport::Transport;
use log::debug;
use std::io;

/// The two states of the input session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    /// The box is not reporting button state.
    #[default]
    Idle,
    /// The box reports its button state on every read.
    Streaming,
}

/// Tracks the input session and performs its transitions on a transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSession {
    state: InputState,
}

impl InputSession {
    /// A fresh, idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Whether the box is currently streaming.
    pub fn is_streaming(&self) -> bool {
        self.state == InputState::Streaming
    }

    /// Flush stale bytes and tell the box to start streaming.
    pub fn start(&mut self, transport: &mut dyn Transport) -> io::Result<()> {
        transport.discard_buffers()?;
        transport.write_byte(BEGIN_STREAMING)?;
        debug!("Input session {:?} -> Streaming", self.state);
        self.state = InputState::Streaming;
        Ok(())
    }

    /// Flush and tell the box to stop streaming. Stopping an idle session
    /// writes nothing.
    pub fn stop(&mut self, transport: &mut dyn Transport) -> io::Result<()> {
        if self.state == InputState::Idle {
            return Ok(());
        }
        transport.discard_buffers()?;
        transport.write_byte(END_STREAMING)?;
        debug!("Input session Streaming -> Idle");
        self.state = InputState::Idle;
        Ok(())
    }

    /// Flush and force the session idle ahead of releasing the transport.
    ///
    /// The session ends up idle even if the flush fails.
    pub fn close(&mut self, transport: &mut dyn Transport) -> io::Result<()> {
        self.state = InputState::Idle;
        transport.discard_buffers()
    }
}
