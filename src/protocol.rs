//! The SRBox wire protocol, and the key decoder that turns status bytes into
//! [`ButtonSet`]s.
//!
//! Every byte on the wire is a single command or status:
//!
//! - `0b1010_0000` written to the box starts streaming button state.
//! - `0b0010_0000` written to the box stops streaming.
//! - `0b0110_0000 | lights` written to the box sets the five lights, where
//!   bit `i` lights lamp `i + 1`.
//! - Every byte read back while streaming has bit `i` set when button
//!   `i + 1` is held. The upper three bits are not ours and are ignored.

use crate::error::{Result, SrBoxError};
use std::fmt;

/// Number of buttons (and lights) on the box.
pub const BUTTON_COUNT: usize = 5;

/// Baud rate the box talks at.
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Control byte that puts the box into streaming mode.
pub const BEGIN_STREAMING: u8 = 0b1010_0000;

/// Control byte that takes the box out of streaming mode.
pub const END_STREAMING: u8 = 0b0010_0000;

/// Fixed high bits of every light status byte.
pub const LIGHT_STATUS_BASE: u8 = 0b0110_0000;

/// Bit code of each button, button 1 first.
pub const BUTTON_CODES: [u8; BUTTON_COUNT] = [0b00001, 0b00010, 0b00100, 0b01000, 0b10000];

/// Bit code of each light, light 1 first.
pub const LIGHT_CODES: [u8; BUTTON_COUNT] = [0b00001, 0b00010, 0b00100, 0b01000, 0b10000];

const BUTTON_MASK: u8 = 0b1_1111;

/// A set of buttons, numbered `1..=5` like the labels on the box.
///
/// Stored as the same five-bit mask the box sends, so it is `Copy` and
/// iterates in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    /// No buttons.
    pub const EMPTY: ButtonSet = ButtonSet(0);

    /// All five buttons.
    pub const ALL: ButtonSet = ButtonSet(BUTTON_MASK);

    /// Build a set from button indices, rejecting anything outside `1..=5`.
    pub fn from_buttons(buttons: impl IntoIterator<Item = u8>) -> Result<Self> {
        buttons.into_iter().try_fold(Self::EMPTY, |set, button| {
            if (1..=BUTTON_COUNT as u8).contains(&button) {
                Ok(ButtonSet(set.0 | BUTTON_CODES[button as usize - 1]))
            } else {
                Err(SrBoxError::InvalidButton(button))
            }
        })
    }

    /// The raw five-bit mask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// No buttons at all.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// How many buttons are in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether `button` is in the set.
    pub fn contains(self, button: u8) -> bool {
        self.iter().any(|b| b == button)
    }

    /// Buttons present in both sets.
    pub fn intersection(self, other: ButtonSet) -> ButtonSet {
        ButtonSet(self.0 & other.0)
    }

    /// Buttons present in either set.
    pub fn union(self, other: ButtonSet) -> ButtonSet {
        ButtonSet(self.0 | other.0)
    }

    /// The button indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        BUTTON_CODES
            .iter()
            .enumerate()
            .filter(move |&(_, &code)| self.0 & code != 0)
            .map(|(i, _)| i as u8 + 1)
    }

    /// The button indices in ascending order, collected.
    pub fn to_vec(self) -> Vec<u8> {
        self.iter().collect()
    }
}

impl fmt::Display for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|b| b.to_string()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Decode a status byte read from the box into the buttons being held.
///
/// Zero decodes to the empty set, which is the box's idle reading and never
/// a press.
pub fn decode_keys(raw: u8) -> ButtonSet {
    ButtonSet(raw & BUTTON_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_matches_bits_for_every_byte() {
        for raw in 0..=u8::MAX {
            let expected: Vec<u8> = (0..5u8)
                .filter(|i| raw & (1u8 << i) != 0)
                .map(|i| i + 1)
                .collect();
            assert_eq!(decode_keys(raw).to_vec(), expected, "raw byte {:#010b}", raw);
        }
    }

    #[test]
    fn zero_and_status_bits_decode_to_nothing() {
        assert!(decode_keys(0).is_empty());
        assert!(decode_keys(0b1110_0000).is_empty());
        assert_eq!(decode_keys(0b1010_0001).to_vec(), vec![1]);
    }

    #[test]
    fn from_buttons_rejects_unknown_buttons() {
        assert_eq!(ButtonSet::from_buttons([1, 5]).unwrap().bits(), 0b10001);
        assert!(matches!(
            ButtonSet::from_buttons([0]),
            Err(SrBoxError::InvalidButton(0))
        ));
        assert!(matches!(
            ButtonSet::from_buttons([2, 6]),
            Err(SrBoxError::InvalidButton(6))
        ));
    }

    #[test]
    fn set_operations() {
        let left = ButtonSet::from_buttons([1, 2]).unwrap();
        let right = ButtonSet::from_buttons([2, 3]).unwrap();
        assert_eq!(left.intersection(right).to_vec(), vec![2]);
        assert_eq!(left.union(right).to_vec(), vec![1, 2, 3]);
        assert_eq!(left.union(right).len(), 3);
        assert!(left.contains(1));
        assert!(!left.contains(3));
        assert_eq!(ButtonSet::ALL.len(), BUTTON_COUNT);
    }

    #[test]
    fn display_lists_buttons() {
        assert_eq!(ButtonSet::from_buttons([5, 1]).unwrap().to_string(), "{1, 5}");
        assert_eq!(ButtonSet::EMPTY.to_string(), "{}");
    }
}
