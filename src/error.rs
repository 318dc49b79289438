//! The errors an [`SrBox`](crate::srbox::SrBox) can hand back to experiment
//! code.
//!
//! A participant not answering is not in here on purpose: a timed out
//! [`wait_for_keys`](crate::srbox::SrBox::wait_for_keys) returns `Ok(None)`.

use std::{borrow::Cow, error::Error, fmt, io};

/// Everything that can go wrong while talking to the box.
#[derive(Debug)]
pub enum SrBoxError {
    /// No serial port could be opened while constructing the box.
    DeviceNotFound,

    /// The box was used after [`close()`](crate::srbox::SrBox::close).
    DeviceClosed,

    /// A recording is running and owns the input session.
    RecorderAlreadyActive,

    /// [`get_keys()`](crate::srbox::SrBox::get_keys) was called with no
    /// recording running.
    NoActiveRecording,

    /// The recorder thread panicked and could not be joined.
    RecorderPanicked,

    /// A button index outside `1..=5`.
    InvalidButton(u8),

    /// A light index outside `1..=5`.
    InvalidLight(u8),

    /// Reading from or writing to the serial port failed, usually because
    /// the box was unplugged.
    TransportFault(io::Error),
}

impl fmt::Display for SrBoxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SrBoxError as SE;
        let msg = match self {
            SE::DeviceNotFound => Cow::from("could not connect to an SRBox"),
            SE::DeviceClosed => Cow::from("the SRBox has been closed"),
            SE::RecorderAlreadyActive => {
                Cow::from("a recording is already running, call get_keys() first")
            }
            SE::NoActiveRecording => {
                Cow::from("start_recording() must be called before keys are available")
            }
            SE::RecorderPanicked => Cow::from("the recorder thread panicked"),
            SE::InvalidButton(b) => Cow::from(format!("no such button: {}", b)),
            SE::InvalidLight(l) => Cow::from(format!("no such light: {}", l)),
            SE::TransportFault(error) => Cow::from(format!("transport fault: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl Error for SrBoxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SrBoxError::TransportFault(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for SrBoxError {
    fn from(value: io::Error) -> Self {
        Self::TransportFault(value)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, SrBoxError>;
