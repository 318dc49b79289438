//! Background recording of button presses.
//!
//! The recorder polls the box on its own thread so that the presentation
//! loop can keep drawing frames while responses come in. It reports edges,
//! not levels: the box repeats the held state on every read, so a reading
//! equal to the one before it is dropped and a held button yields a single
//! event.
//!
//! The thread owns its event buffer and hands it back through its
//! [`JoinHandle`]. Stopping is cooperative; the thread checks a shared flag
//! at the top of every poll, so it stops within one read.

use crate::error::{Result, SrBoxError};
use crate::protocol::{decode_keys, ButtonSet};
use crate::transport::{poll_shared, Transport};
use log::{debug, info};
use std::{
    fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// A press of one or more buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedEvent {
    /// When the press was read. `None` for untimestamped recordings.
    pub timestamp: Option<Duration>,
    /// The buttons down at that moment, after filtering.
    pub buttons: ButtonSet,
}

impl fmt::Display for CapturedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(t) => write!(f, "{} @ {:.4}s", self.buttons, t.as_secs_f64()),
            None => write!(f, "{}", self.buttons),
        }
    }
}

/// Every button that shows up in `events`.
///
/// Untimestamped recordings are mostly asked "which buttons were used at
/// all", which is this.
pub fn distinct_buttons(events: &[CapturedEvent]) -> ButtonSet {
    events
        .iter()
        .fold(ButtonSet::EMPTY, |seen, event| seen.union(event.buttons))
}

/// What a recording keeps and for how long.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordParams {
    pub allowed: Option<ButtonSet>,
    pub timestamped: bool,
    pub max_duration: Option<Duration>,
    pub poll_interval: Duration,
}

/// A running recorder thread.
#[derive(Debug)]
pub(crate) struct Recorder {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<io::Result<Vec<CapturedEvent>>>,
}

impl Recorder {
    /// Start polling `transport` on a new thread. The input session must
    /// already be streaming.
    pub fn spawn<T: Transport + 'static>(
        transport: Arc<Mutex<T>>,
        params: RecordParams,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let th_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("srbox-recorder".to_owned())
            .spawn(move || record(&transport, &th_stop, params))?;

        info!("Recorder started");
        Ok(Self { stop, handle })
    }

    /// Whether the thread has already stopped on its own, because it ran
    /// out of time or the transport failed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Tell the thread to stop, wait for it, and take what it recorded.
    pub fn finish(self) -> Result<Vec<CapturedEvent>> {
        self.stop.store(true, Ordering::Release);
        let events = self
            .handle
            .join()
            .map_err(|_| SrBoxError::RecorderPanicked)??;
        info!("Recorder stopped with {} events", events.len());
        Ok(events)
    }
}

fn record<T: Transport>(
    transport: &Mutex<T>,
    stop: &AtomicBool,
    params: RecordParams,
) -> io::Result<Vec<CapturedEvent>> {
    let start = Instant::now();
    let mut events = Vec::new();
    let mut last_raw = 0u8;

    while !stop.load(Ordering::Acquire) {
        if params.max_duration.is_some_and(|max| start.elapsed() >= max) {
            debug!("Recorder hit its time limit");
            break;
        }

        let Some(raw) = poll_shared(transport, params.poll_interval)? else {
            continue;
        };
        let read_at = start.elapsed();
        if raw == last_raw {
            continue;
        }
        last_raw = raw;

        let buttons = filter(decode_keys(raw), params.allowed);
        if buttons.is_empty() {
            continue;
        }
        debug!("Recorded {} at {:?}", buttons, read_at);
        events.push(CapturedEvent {
            timestamp: params.timestamped.then_some(read_at),
            buttons,
        });
    }

    Ok(events)
}

/// Keep only the allowed buttons, if there is a filter at all.
pub(crate) fn filter(buttons: ButtonSet, allowed: Option<ButtonSet>) -> ButtonSet {
    match allowed {
        Some(allowed) => buttons.intersection(allowed),
        None => buttons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_box::DummyTransport;
    use crate::protocol::BEGIN_STREAMING;

    fn streaming(bytes: impl IntoIterator<Item = u8>) -> Arc<Mutex<DummyTransport>> {
        let mut dummy = DummyTransport::scripted(bytes);
        dummy.write_byte(BEGIN_STREAMING).unwrap();
        Arc::new(Mutex::new(dummy))
    }

    fn params() -> RecordParams {
        RecordParams {
            allowed: None,
            timestamped: true,
            max_duration: Some(Duration::from_millis(100)),
            poll_interval: Duration::ZERO,
        }
    }

    fn buttons(bs: &[u8]) -> ButtonSet {
        ButtonSet::from_buttons(bs.iter().copied()).unwrap()
    }

    #[test]
    fn held_buttons_coalesce_into_one_event() {
        let transport = streaming([0x01, 0x01, 0x01, 0x00, 0x02]);
        let stop = AtomicBool::new(false);

        let events = record(&transport, &stop, params()).unwrap();

        let pressed: Vec<ButtonSet> = events.iter().map(|e| e.buttons).collect();
        assert_eq!(pressed, vec![buttons(&[1]), buttons(&[2])]);
        assert!(events[0].timestamp.unwrap() <= events[1].timestamp.unwrap());
    }

    #[test]
    fn releases_are_not_events() {
        let transport = streaming([0x00, 0x04, 0x00, 0x04, 0x00]);
        let stop = AtomicBool::new(false);

        let events = record(&transport, &stop, params()).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.buttons == buttons(&[3])));
    }

    #[test]
    fn filtered_out_presses_still_update_the_last_reading() {
        // 2 is not allowed, but going 1 -> 1+2 -> 1 is still three changes,
        // each of which leaves button 1 after filtering.
        let transport = streaming([0x01, 0x03, 0x01, 0x02]);
        let stop = AtomicBool::new(false);
        let params = RecordParams {
            allowed: Some(buttons(&[1])),
            ..params()
        };

        let events = record(&transport, &stop, params).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(distinct_buttons(&events), buttons(&[1]));
    }

    #[test]
    fn untimestamped_events_have_no_timestamp() {
        let transport = streaming([0x10]);
        let stop = AtomicBool::new(false);
        let params = RecordParams {
            timestamped: false,
            ..params()
        };

        let events = record(&transport, &stop, params).unwrap();
        assert_eq!(
            events,
            vec![CapturedEvent {
                timestamp: None,
                buttons: buttons(&[5]),
            }]
        );
    }

    #[test]
    fn raised_stop_flag_ends_the_loop_immediately() {
        let transport = streaming([0x01]);
        let stop = AtomicBool::new(true);
        let params = RecordParams {
            max_duration: None,
            ..params()
        };

        assert!(record(&transport, &stop, params).unwrap().is_empty());
    }

    #[test]
    fn spawned_recorder_stops_when_finished() {
        let transport = streaming([0x08, 0x08, 0x18]);
        let params = RecordParams {
            max_duration: None,
            ..params()
        };

        let recorder = Recorder::spawn(transport, params).unwrap();
        thread::sleep(Duration::from_millis(20));
        let events = recorder.finish().unwrap();

        let pressed: Vec<ButtonSet> = events.iter().map(|e| e.buttons).collect();
        assert_eq!(pressed, vec![buttons(&[4]), buttons(&[4, 5])]);
    }

    #[test]
    fn transport_faults_surface_on_finish() {
        let transport = Arc::new(Mutex::new(DummyTransport::unplugged()));
        let recorder = Recorder::spawn(transport, params()).unwrap();

        // The fault only shows up once the thread has polled, so let it die
        // on its own before asking it to stop.
        let deadline = Instant::now() + Duration::from_secs(1);
        while !recorder.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(recorder.is_finished());
        assert!(matches!(
            recorder.finish(),
            Err(SrBoxError::TransportFault(_))
        ));
    }

    #[test]
    fn display_shows_buttons_and_time() {
        let event = CapturedEvent {
            timestamp: Some(Duration::from_millis(532)),
            buttons: buttons(&[1, 5]),
        };
        assert_eq!(event.to_string(), "{1, 5} @ 0.5320s");
    }
}
