//! Time sources for stamping responses.

use std::time::{Duration, Instant};

/// Anything that can say how long it has been since its epoch.
///
/// Experiment code typically keeps one per trial and resets it when the
/// stimulus goes up, so reaction times come out relative to stimulus onset.
pub trait Clock: Send + Sync {
    /// Time since this clock's epoch.
    fn now(&self) -> Duration;
}

/// A [`Clock`] on the monotonic system timer.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// A clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Move the epoch to now.
    pub fn reset(&mut self) {
        self.epoch = Instant::now();
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn reset_moves_the_epoch() {
        let mut clock = MonotonicClock::new();
        sleep(Duration::from_millis(20));
        assert!(clock.now() >= Duration::from_millis(20));

        clock.reset();
        assert!(clock.now() < Duration::from_millis(20));
    }
}
