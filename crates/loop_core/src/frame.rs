use std::cell::RefCell;
use std::time::Duration;

/// Per-frame callback. Returning `true` asks the source for another frame;
/// `false` ends the chain.
pub type FrameCallback = Box<dyn FnMut() -> bool>;

/// Period of the timer fallback, approximating a 60 Hz refresh rate.
pub const FALLBACK_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Normalized frame-scheduling capability.
///
/// `schedule_frame` arranges for `callback` to run once at the next
/// opportunity the host considers "one frame"; it never invokes the
/// callback synchronously. Re-arming is driven entirely by the callback's
/// return value. There is no guaranteed wall-clock cadence even from the
/// timer fallback, so downstream code must not assume a fixed period.
pub trait FrameSource {
    fn schedule_frame(&self, callback: FrameCallback);
}

/// Pick the display refresh interval from host-reported rates, evaluated
/// in the given priority order. Rates are in millihertz, as winit reports
/// them; the first usable candidate wins. Falls back silently to
/// [`FALLBACK_FRAME_INTERVAL`] when nothing is reported.
pub fn select_refresh_interval<I>(candidates: I) -> Duration
where
    I: IntoIterator<Item = Option<u32>>,
{
    for millihertz in candidates.into_iter().flatten() {
        if millihertz > 0 {
            return Duration::from_secs_f64(1000.0 / millihertz as f64);
        }
    }
    FALLBACK_FRAME_INTERVAL
}

/// Frame source for hosts that already deliver one callback per display
/// refresh (winit redraw events, or a test driver). The host calls
/// [`RedrawFrameSource::frame`] once per refresh; the armed callback fires
/// and is re-armed when it asks for another frame.
#[derive(Default)]
pub struct RedrawFrameSource {
    armed: RefCell<Option<FrameCallback>>,
}

impl RedrawFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.borrow().is_some()
    }

    /// Invoke the armed callback once, if any. The slot is emptied before
    /// the call so the callback may schedule a replacement; an existing
    /// replacement wins over re-arming.
    pub fn frame(&self) {
        let Some(mut callback) = self.armed.borrow_mut().take() else {
            return;
        };
        if callback() {
            let mut slot = self.armed.borrow_mut();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }
}

impl FrameSource for RedrawFrameSource {
    fn schedule_frame(&self, callback: FrameCallback) {
        *self.armed.borrow_mut() = Some(callback);
    }
}

/// Fixed-period fallback for hosts without a refresh-aligned primitive.
///
/// [`TimerFrameSource::drive`] blocks the calling thread, sleeping one
/// period between invocations, until the callback halts the chain (or
/// nothing is armed). Cooperative: the callback is the only way out.
pub struct TimerFrameSource {
    interval: Duration,
    armed: RefCell<Option<FrameCallback>>,
}

impl TimerFrameSource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            armed: RefCell::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the armed callback at the fixed period until it returns `false`
    /// and no replacement was scheduled during its invocation.
    pub fn drive(&self) {
        loop {
            std::thread::sleep(self.interval);
            let Some(mut callback) = self.armed.borrow_mut().take() else {
                return;
            };
            if callback() {
                let mut slot = self.armed.borrow_mut();
                if slot.is_none() {
                    *slot = Some(callback);
                }
            } else if self.armed.borrow().is_none() {
                return;
            }
        }
    }
}

impl Default for TimerFrameSource {
    fn default() -> Self {
        Self::new(FALLBACK_FRAME_INTERVAL)
    }
}

impl FrameSource for TimerFrameSource {
    fn schedule_frame(&self, callback: FrameCallback) {
        *self.armed.borrow_mut() = Some(callback);
    }
}
