//! Host-side time: the millisecond clock handed to the screens and the
//! delay the panel init sequence waits on.
//!
//! These use `std::time` and `std::thread`, which the firmware replaces with
//! `embassy_time`.

use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

/// How long the splash stays up before the first screen starts.
pub const SPLASH_TIME: Duration = Duration::from_millis(1000);

/// Milliseconds since the simulator started.
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self { Self { start: Instant::now() } }

    pub fn now_ms(&self) -> u64 { self.start.elapsed().as_millis() as u64 }
}

/// Blocking delay on the host thread.
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
