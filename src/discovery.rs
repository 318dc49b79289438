//! Finding the port the box is plugged into.
//!
//! With no port given we try every port the OS lists, in order, and keep the
//! first one that opens. There is no retrying here; if the box is not there
//! the caller gets [`SrBoxError::DeviceNotFound`] and decides what to do.

use crate::error::{Result, SrBoxError};
use crate::transport::Connector;
use log::{debug, info, warn};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Probe every available port and return the first that opens.
pub fn discover<C: Connector>(
    connector: &C,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<(PathBuf, C::Transport)> {
    let ports = connector.available_ports().map_err(|e| {
        warn!("Failed to enumerate serial ports: {}", e);
        SrBoxError::DeviceNotFound
    })?;

    for port in ports {
        match connector.open(&port, baud_rate, read_timeout) {
            Ok(transport) => {
                info!("Found SRBox candidate at {}", port.display());
                return Ok((port, transport));
            }
            Err(e) => debug!("Probe of {} failed: {}", port.display(), e),
        }
    }

    Err(SrBoxError::DeviceNotFound)
}

/// Open `port` if one is given, otherwise [`discover`] one.
pub fn open_port<C: Connector>(
    connector: &C,
    port: Option<&Path>,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<(PathBuf, C::Transport)> {
    let Some(port) = port else {
        return discover(connector, baud_rate, read_timeout);
    };

    match connector.open(port, baud_rate, read_timeout) {
        Ok(transport) => Ok((port.to_path_buf(), transport)),
        Err(e) => {
            warn!("Could not open {}: {}", port.display(), e);
            Err(SrBoxError::DeviceNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_box::DummyConnector;

    #[test]
    fn first_port_that_opens_wins() {
        let connector = DummyConnector::new(["/dev/ttyS0", "/dev/ttyS1", "/dev/ttyS2"])
            .refuse("/dev/ttyS0");

        let (port, _) = discover(&connector, 19200, Duration::ZERO).unwrap();
        assert_eq!(port, PathBuf::from("/dev/ttyS1"));
    }

    #[test]
    fn no_ports_is_device_not_found() {
        let connector = DummyConnector::new(Vec::<PathBuf>::new());
        assert!(matches!(
            discover(&connector, 19200, Duration::ZERO),
            Err(SrBoxError::DeviceNotFound)
        ));
    }

    #[test]
    fn every_port_refusing_is_device_not_found() {
        let connector = DummyConnector::new(["/dev/ttyS0", "/dev/ttyS1"])
            .refuse("/dev/ttyS0")
            .refuse("/dev/ttyS1");
        assert!(matches!(
            discover(&connector, 19200, Duration::ZERO),
            Err(SrBoxError::DeviceNotFound)
        ));
    }

    #[test]
    fn explicit_port_skips_enumeration() {
        // Not even listed, but opened anyway.
        let connector = DummyConnector::new(["/dev/ttyS0"]);
        let (port, _) = open_port(
            &connector,
            Some(Path::new("/dev/ttyUSB3")),
            19200,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(port, PathBuf::from("/dev/ttyUSB3"));
    }

    #[test]
    fn explicit_port_that_fails_is_device_not_found() {
        let connector = DummyConnector::new(["/dev/ttyS0"]).refuse("/dev/ttyS0");
        assert!(matches!(
            open_port(&connector, Some(Path::new("/dev/ttyS0")), 19200, Duration::ZERO),
            Err(SrBoxError::DeviceNotFound)
        ));
    }
}
