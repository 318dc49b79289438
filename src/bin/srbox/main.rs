//! Bench tool for checking an SRBox: list ports, wait for a press, record
//! for a while, or play with the lights.

use clap::Parser;
use log::{debug, info};
use serial2::SerialPort;
use srbox::{
    args::{
        BlinkCommand, BoxArgs,
        CommandTask::{self, Blink, Lights, Ports, Record, Wait},
        LightsCommand, RecordCommand, WaitCommand,
    },
    config::BoxSettings,
    dummy_box::DummyTransport,
    protocol::ButtonSet,
    recorder::distinct_buttons,
    srbox::SrBox,
    transport::Transport,
};
use std::{error::Error, thread::sleep, time::Duration};

// Example:
// cargo run --bin srbox -- --port /dev/ttyUSB0 wait --keys 1,5 --timeout 10
// cargo run --bin srbox -- --dummy record --secs 3

type BoxResult<T> = Result<T, Box<dyn Error>>;

fn main() -> BoxResult<()> {
    env_logger::init();
    let args = BoxArgs::parse();

    let mut settings = match &args.config {
        Some(path) => BoxSettings::from_path(path)?,
        None => BoxSettings::default(),
    };
    if let Some(port) = args.port {
        settings.port = Some(port);
    }
    if let Some(baud_rate) = args.baud_rate {
        settings.baud_rate = baud_rate;
    }
    debug!("Using {:?}", settings);

    if let Ports = args.command {
        return list_ports();
    }

    if args.dummy {
        info!("Using a simulated box");
        let transport = DummyTransport::random(ButtonSet::ALL, 0.01);
        let mut srbox = SrBox::from_transport("dummy", transport, settings)?;
        run(&mut srbox, args.command)
    } else {
        let mut srbox = SrBox::open(&settings)?;
        run(&mut srbox, args.command)
    }
}

fn list_ports() -> BoxResult<()> {
    let available_ports = SerialPort::available_ports()?;
    println!("Available devices:");
    for port in available_ports {
        println!("\t{}", port.to_string_lossy());
    }
    Ok(())
}

fn run<T: Transport + 'static>(srbox: &mut SrBox<T>, command: CommandTask) -> BoxResult<()> {
    match command {
        Ports => list_ports()?,

        Wait(WaitCommand { keys, timeout }) => {
            let timeout = timeout.map(secs).transpose()?;
            println!("Waiting for a press on {}...", srbox.port().display());
            match srbox.wait_for_keys(keys, timeout, None)? {
                Some(event) => println!("Pressed {}", event),
                None => println!("No response"),
            }
        }

        Record(RecordCommand {
            keys,
            secs: duration,
            no_timestamps,
        }) => {
            let duration = secs(duration)?;
            srbox.start_recording(keys, !no_timestamps, Some(duration))?;
            println!("Recording for {:?}...", duration);
            sleep(duration);
            let events = srbox.get_keys()?;
            if no_timestamps {
                println!("Buttons used: {}", distinct_buttons(&events));
            } else {
                for event in &events {
                    println!("{}", event);
                }
                println!("{} presses", events.len());
            }
        }

        Lights(LightsCommand { pattern }) => {
            srbox.set_lights(pattern, true)?;
        }

        Blink(BlinkCommand {
            lights,
            interval,
            duration,
        }) => {
            srbox.blink_lights(&lights.to_vec(), secs(interval)?, secs(duration)?)?;
        }
    }

    srbox.close()?;
    Ok(())
}

fn secs(secs: f64) -> BoxResult<Duration> {
    Ok(Duration::try_from_secs_f64(secs)?)
}
