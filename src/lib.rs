//! A driver for the 5-button serial response box (SRBox) used to collect
//! participant responses in reaction-time experiments.
//!
//! The box sits on a serial port and speaks a one-byte protocol: we write a
//! control byte to start or stop streaming or to set its five lights, and
//! while streaming it answers every read with a bitmask of the buttons being
//! held. This crate finds the box, drives that protocol, and turns the
//! stream of levels into presses, either by blocking until one arrives
//! ([`srbox::SrBox::wait_for_keys`]) or by recording on a background thread
//! while the caller keeps drawing frames ([`srbox::SrBox::start_recording`]).
//!
//! ```no_run
//! use srbox::{config::BoxSettings, protocol::ButtonSet, srbox::SrBox};
//! use std::time::Duration;
//!
//! let mut srbox = SrBox::open(&BoxSettings::default())?;
//! let left_or_right = ButtonSet::from_buttons([1, 5])?;
//! match srbox.wait_for_keys(Some(left_or_right), Some(Duration::from_secs(5)), None)? {
//!     Some(press) => println!("pressed {}", press),
//!     None => println!("no response"),
//! }
//! # Ok::<(), srbox::error::SrBoxError>(())
//! ```

#![warn(missing_docs)]
pub mod args;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod dummy_box;
pub mod error;
pub mod lights;
pub mod pattern;
pub mod protocol;
pub mod recorder;
pub mod session;
pub mod srbox;
pub mod transport;
