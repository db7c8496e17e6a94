//! Pause policy between remote batch calls.

use std::thread;
use std::time::Duration;

/// Called once after every batch call, whether it succeeded or not.
pub trait Pacer {
    fn pause(&mut self);
}

/// Blocks for a fixed interval after each call.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Pacer for FixedInterval {
    fn pause(&mut self) {
        tracing::trace!("pacing for {:?}", self.interval);
        thread::sleep(self.interval);
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&mut self) {}
}

/// Pacer for a configured interval; zero disables pacing.
pub fn from_interval(interval: Duration) -> Box<dyn Pacer> {
    if interval.is_zero() {
        Box::new(NoPacing)
    } else {
        Box::new(FixedInterval::new(interval))
    }
}
