use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Description of a logic update emitted by a tick source.
///
/// `next_ms` is the absolute host-clock time the next logic update is
/// scheduled to occur; `interval_ms` is the nominal period between updates.
/// Both are in the same time base as the [`Clock`] the render loop reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    pub next_ms: f64,
    pub interval_ms: f64,
}

/// Host clock seam. Keeping the current time behind a trait makes the
/// interpolation math reproducible from explicit inputs.
pub trait Clock {
    /// Current host time in milliseconds.
    fn now_ms(&self) -> f64;
}

/// Monotonic clock measured in milliseconds since construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for tests and offline drivers. Cloning shares
/// the underlying cell, so a driver can advance time while a loop reads it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
