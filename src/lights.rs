//! The in-memory copy of the box's five lights.
//!
//! Changing a light here does not touch the hardware, the whole vector is
//! sent as one status byte when [`SrBox::update_lights`] is called. That way
//! switching several lights in a row costs a single write.
//!
//! [`SrBox::update_lights`]: crate::srbox::SrBox::update_lights

use crate::error::{Result, SrBoxError};
use crate::protocol::{BUTTON_COUNT, LIGHT_CODES, LIGHT_STATUS_BASE};

/// Which of the five lights are on, light 1 first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightVector {
    lights: [bool; BUTTON_COUNT],
}

impl LightVector {
    /// All lights off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch light `index` (`1..=5`) on or off.
    pub fn set(&mut self, index: u8, on: bool) -> Result<()> {
        let slot = Self::slot(index)?;
        self.lights[slot] = on;
        Ok(())
    }

    /// Replace every light at once.
    pub fn set_all(&mut self, lights: [bool; BUTTON_COUNT]) {
        self.lights = lights;
    }

    /// Whether light `index` (`1..=5`) is on.
    pub fn get(&self, index: u8) -> Result<bool> {
        Ok(self.lights[Self::slot(index)?])
    }

    /// Every light, light 1 first.
    pub fn as_array(&self) -> [bool; BUTTON_COUNT] {
        self.lights
    }

    /// The status byte that makes the hardware match this vector.
    pub fn status_byte(&self) -> u8 {
        self.lights
            .iter()
            .zip(LIGHT_CODES)
            .filter(|&(&on, _)| on)
            .fold(LIGHT_STATUS_BASE, |status, (_, code)| status | code)
    }

    fn slot(index: u8) -> Result<usize> {
        match index as usize {
            i @ 1..=BUTTON_COUNT => Ok(i - 1),
            _ => Err(SrBoxError::InvalidLight(index)),
        }
    }
}
