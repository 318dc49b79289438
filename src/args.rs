//! Commandline argument parser using clap for the srbox bench tool

use crate::pattern::{parse_buttons, parse_lights};
use crate::protocol::{ButtonSet, BUTTON_COUNT};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Talk to an SRBox from the command line
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct BoxArgs {
    #[command(subcommand, long_about)]
    /// What to do with the box
    pub command: CommandTask,

    /// Settings file to load, in ron
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Serial port of the box. Every port is probed if left out
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<PathBuf>,

    /// Line speed, the box only speaks 19200
    #[arg(short = 'b', long = "baud", global = true)]
    pub baud_rate: Option<u32>,

    /// Talk to a simulated box instead of real hardware
    #[arg(long, global = true)]
    pub dummy: bool,
}

/// The tasks the tool can perform
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// List the serial ports the OS knows about
    #[command(about)]
    Ports,

    /// Wait for a single press and report it
    #[command(about)]
    Wait(WaitCommand),

    /// Record presses in the background for a while
    #[command(about)]
    Record(RecordCommand),

    /// Set the five lights
    #[command(about)]
    Lights(LightsCommand),

    /// Blink some of the lights
    #[command(about)]
    Blink(BlinkCommand),
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
#[allow(missing_docs)]
pub struct WaitCommand {
    /// Buttons that count as a response, like 1,5 or 1-3. Any if left out
    #[arg(short = 'k', long = "keys", value_parser = parse_buttons)]
    pub keys: Option<ButtonSet>,

    /// Give up after this many seconds. Waits forever if left out
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
#[allow(missing_docs)]
pub struct RecordCommand {
    /// Buttons to record, like 1,5 or 1-3. Any if left out
    #[arg(short = 'k', long = "keys", value_parser = parse_buttons)]
    pub keys: Option<ButtonSet>,

    /// How long to record for, in seconds
    #[arg(short = 's', long = "secs", default_value_t = 5.0)]
    pub secs: f64,

    /// Leave timestamps off and only report which buttons were used
    #[arg(long)]
    pub no_timestamps: bool,
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
#[allow(missing_docs)]
pub struct LightsCommand {
    /// Five 0/1 characters, light 1 first, like 10001
    #[arg(value_parser = parse_lights)]
    pub pattern: [bool; BUTTON_COUNT],
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
#[allow(missing_docs)]
pub struct BlinkCommand {
    /// Lights to blink, like 1,5 or 1-3
    #[arg(short = 'l', long = "lights", value_parser = parse_buttons)]
    pub lights: ButtonSet,

    /// Seconds between toggles
    #[arg(short = 'i', long = "interval", default_value_t = 0.25)]
    pub interval: f64,

    /// Seconds to blink for
    #[arg(short = 'd', long = "duration", default_value_t = 1.0)]
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_with_keys_and_timeout() {
        let args = BoxArgs::parse_from(["srbox", "--dummy", "wait", "-k", "1,5", "-t", "2.5"]);
        assert!(args.dummy);
        match args.command {
            CommandTask::Wait(WaitCommand { keys, timeout }) => {
                assert_eq!(keys.map(ButtonSet::to_vec), Some(vec![1, 5]));
                assert_eq!(timeout, Some(2.5));
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn lights_pattern() {
        let args = BoxArgs::parse_from(["srbox", "lights", "01010", "--port", "/dev/ttyUSB0"]);
        assert_eq!(args.port, Some(PathBuf::from("/dev/ttyUSB0")));
        match args.command {
            CommandTask::Lights(LightsCommand { pattern }) => {
                assert_eq!(pattern, [false, true, false, true, false]);
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn bad_keys_are_rejected() {
        assert!(BoxArgs::try_parse_from(["srbox", "wait", "-k", "7"]).is_err());
    }
}
