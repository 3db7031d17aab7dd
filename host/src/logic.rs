use loop_core::events::{EventRegistry, ListenerId};
use loop_core::render_loop::{TickSource, TICK};
use loop_core::time::TickInfo;
use std::cell::Cell;

// Catch-up clamp: after a stall longer than this, resynchronize to the
// current time instead of replaying the whole backlog.
const MAX_CATCHUP_MS: f64 = 250.0;

/// Fixed-timestep logic scheduler. `pump` runs every update that is due and
/// then announces the next deadline on its `"tick"` channel, which is what
/// the render loop interpolates against.
pub struct LogicLoop {
    events: EventRegistry<TickInfo>,
    interval_ms: f64,
    next_update_ms: Cell<f64>,
}

impl LogicLoop {
    pub fn new(interval_ms: f64, start_ms: f64) -> Self {
        Self {
            events: EventRegistry::new(),
            interval_ms,
            next_update_ms: Cell::new(start_ms + interval_ms),
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Run due updates at `now_ms`, calling `update` once per step with the
    /// fixed delta. Emits a tick only when at least one update ran.
    pub fn pump(&self, now_ms: f64, mut update: impl FnMut(f64)) {
        if now_ms - self.next_update_ms.get() > MAX_CATCHUP_MS {
            tracing::warn!(
                "logic stalled {:.0}ms, resynchronizing",
                now_ms - self.next_update_ms.get()
            );
            self.next_update_ms.set(now_ms);
        }

        let mut updates = 0u32;
        while now_ms >= self.next_update_ms.get() {
            update(self.interval_ms);
            self.next_update_ms
                .set(self.next_update_ms.get() + self.interval_ms);
            updates += 1;
        }

        if updates > 0 {
            self.events.emit(
                TICK,
                &TickInfo {
                    next_ms: self.next_update_ms.get(),
                    interval_ms: self.interval_ms,
                },
            );
        }
    }
}

impl TickSource for LogicLoop {
    fn on(&self, event: &str, callback: Box<dyn FnMut(&TickInfo)>) -> ListenerId {
        self.events.on(event, callback)
    }

    fn off(&self, event: &str, listener: ListenerId) {
        self.events.off(event, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn capture_ticks(logic: &LogicLoop) -> Rc<RefCell<Vec<TickInfo>>> {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = ticks.clone();
        logic.on(TICK, Box::new(move |tick| sink.borrow_mut().push(*tick)));
        ticks
    }

    #[test]
    fn runs_every_due_update_and_announces_the_next_deadline() {
        let logic = LogicLoop::new(16.0, 0.0);
        let ticks = capture_ticks(&logic);

        let mut updates = 0u32;
        logic.pump(40.0, |dt| {
            assert_eq!(dt, 16.0);
            updates += 1;
        });

        // Updates due at 16 and 32 ran; the next is due at 48.
        assert_eq!(updates, 2);
        assert_eq!(
            *ticks.borrow(),
            vec![TickInfo {
                next_ms: 48.0,
                interval_ms: 16.0
            }]
        );
    }

    #[test]
    fn silent_when_no_update_is_due() {
        let logic = LogicLoop::new(16.0, 0.0);
        let ticks = capture_ticks(&logic);

        logic.pump(15.0, |_| panic!("no update due yet"));
        assert!(ticks.borrow().is_empty());
    }

    #[test]
    fn long_stall_resynchronizes_instead_of_replaying_the_backlog() {
        let logic = LogicLoop::new(16.0, 0.0);
        let ticks = capture_ticks(&logic);

        let mut updates = 0u32;
        logic.pump(10_000.0, |_| updates += 1);

        assert_eq!(updates, 1);
        assert_eq!(
            *ticks.borrow(),
            vec![TickInfo {
                next_ms: 10_016.0,
                interval_ms: 16.0
            }]
        );
    }
}
