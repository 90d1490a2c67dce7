use std::cell::Cell;
use web_time::{Duration, Instant};

/// Source of "now" for timers and animations.
pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you drive by hand. Time never moves unless told to.
#[derive(Debug)]
pub struct ManualClock {
    t: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self { t: Cell::new(start) }
    }

    /// Moves the clock to `t`. Going backwards is ignored.
    pub fn set(&self, t: Instant) {
        if t > self.t.get() {
            self.t.set(t);
        }
    }

    pub fn advance(&self, d: Duration) {
        self.t.set(self.t.get() + d);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}
