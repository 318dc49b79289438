//! Connection and polling settings, stored as a small [ron] file so a lab
//! machine can pin its port once and forget about it:
//!
//! ```text
//! (port:Some("/dev/ttyUSB0"),baud_rate:19200,read_timeout_ms:0,poll_interval_us:0,max_record_secs:Some(30.0))
//! ```
//!
//! Every field is optional in the file; missing ones take the defaults.

use crate::protocol::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

/// How to reach the box and how hard to poll it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BoxSettings {
    /// Port to open. `None` probes every port the OS lists.
    pub port: Option<PathBuf>,

    /// Line speed; the box only speaks 19200.
    pub baud_rate: u32,

    /// Timeout on single byte reads. Zero makes every read non-blocking.
    pub read_timeout_ms: u64,

    /// Sleep between reads that came back empty. Zero busy-polls, which is
    /// what you want when reaction times matter.
    pub poll_interval_us: u64,

    /// Longest a background recording runs before it stops on its own.
    /// `None` records until stopped.
    pub max_record_secs: Option<f64>,
}

impl Default for BoxSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: 0,
            poll_interval_us: 0,
            max_record_secs: Some(30.0),
        }
    }
}

/// Why a settings file could not be loaded or saved.
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when io fails when reading or writing files.
    IoError(std::io::Error),

    /// Returned when serialization of the settings fails.
    RonError(ron::Error),

    /// Returned when deserialization of the settings fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ConfigError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ConfigError::RonError(error) => Cow::from(format!("ron error: {}", error)),
            ConfigError::RonSpannedError(error) => {
                Cow::from(format!("ron spanning error: {}", error))
            }
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl BoxSettings {
    /// Defaults, but pinned to `port`.
    pub fn with_port(port: impl Into<PathBuf>) -> Self {
        Self {
            port: Some(port.into()),
            ..Self::default()
        }
    }

    /// [`BoxSettings::read_timeout_ms`] as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// [`BoxSettings::poll_interval_us`] as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// [`BoxSettings::max_record_secs`] as a [`Duration`]. Negative or
    /// non-finite values mean no limit.
    pub fn max_record_duration(&self) -> Option<Duration> {
        self.max_record_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Read settings from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut handle = File::open(path).map_err(ConfigError::IoError)?;
        Self::from_reader(&mut handle)
    }

    /// Read settings from the [Read]able object provided.
    pub fn from_reader(reader: &mut impl Read) -> Result<Self, ConfigError> {
        let mut raw_text = Vec::new();
        reader
            .read_to_end(&mut raw_text)
            .map_err(ConfigError::IoError)?;

        ron::de::from_bytes(&raw_text).map_err(ConfigError::RonSpannedError)
    }

    /// Write settings out to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut handle = File::create(path).map_err(ConfigError::IoError)?;
        self.to_writer(&mut handle)
    }

    /// Write settings out to the [Write]able object provided.
    pub fn to_writer(&self, writer: &mut impl Write) -> Result<(), ConfigError> {
        let text = ron::ser::to_string(self).map_err(ConfigError::RonError)?;
        writer
            .write_all(text.as_bytes())
            .map_err(ConfigError::IoError)
    }
}
