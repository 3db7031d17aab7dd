use crate::events::{EventRegistry, ListenerId};
use crate::frame::FrameSource;
use crate::time::{Clock, TickInfo};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Channel emitted once per completed `run()`, no meaningful payload.
pub const RUN: &str = "run";
/// Channel emitted once per completed `stop()`, no meaningful payload.
pub const STOP: &str = "stop";
/// Channel emitted once per render frame, carrying the interpolation factor.
pub const TICK: &str = "tick";

/// Payload delivered to [`RenderLoop`] subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopEvent {
    Run,
    Stop,
    /// Fraction of the logic interval still remaining before the next
    /// scheduled logic update, in `[0, 1]` for a well-formed tick source.
    Tick { interpolation: f64 },
}

/// Source of logic-tick notifications on the `"tick"` channel. The render
/// loop holds a reference to one of these for its whole lifetime; it never
/// owns the source's scheduling.
pub trait TickSource {
    fn on(&self, event: &str, callback: Box<dyn FnMut(&TickInfo)>) -> ListenerId;
    fn off(&self, event: &str, listener: ListenerId);
}

impl TickSource for EventRegistry<TickInfo> {
    fn on(&self, event: &str, callback: Box<dyn FnMut(&TickInfo)>) -> ListenerId {
        EventRegistry::on(self, event, callback)
    }

    fn off(&self, event: &str, listener: ListenerId) {
        EventRegistry::off(self, event, listener);
    }
}

/// Fraction of the logic interval remaining before the next scheduled
/// logic update. `0.0` when no tick has been seen since the loop started,
/// or when the update is already due or overdue. Pure: depends only on
/// the last tick and the current time.
pub fn interpolation(last_tick: Option<&TickInfo>, now_ms: f64) -> f64 {
    let Some(tick) = last_tick else {
        return 0.0;
    };
    let remaining = tick.next_ms - now_ms;
    if remaining > 0.0 {
        remaining / tick.interval_ms
    } else {
        0.0
    }
}

struct LoopInner {
    events: EventRegistry<LoopEvent>,
    last_tick: RefCell<Option<TickInfo>>,
    running: Cell<bool>,
    tick_listener: Cell<Option<ListenerId>>,
    logic: Rc<dyn TickSource>,
    frames: Rc<dyn FrameSource>,
    clock: Rc<dyn Clock>,
}

impl LoopInner {
    // Per-frame callback handed to the frame source. A frame already in
    // flight when stop() runs still completes; it simply observes the flag
    // and declines re-arming on its next invocation.
    fn frame(&self) -> bool {
        if !self.running.get() {
            return false;
        }
        let factor = interpolation(self.last_tick.borrow().as_ref(), self.clock.now_ms());
        self.events.emit(
            TICK,
            &LoopEvent::Tick {
                interpolation: factor,
            },
        );
        true
    }
}

/// Render-loop scheduler: republishes logic ticks to its own subscribers
/// once per display frame, with an interpolation factor so renderers can
/// draw smoothly between logic updates.
///
/// Cloning yields another handle to the same loop, so a subscriber can
/// keep one and call [`RenderLoop::stop`] from inside a callback.
#[derive(Clone)]
pub struct RenderLoop {
    inner: Rc<LoopInner>,
}

impl RenderLoop {
    /// Bind the loop to its collaborators. The bindings are fixed for the
    /// loop's lifetime; only the running state changes after this.
    pub fn new(
        logic: Rc<dyn TickSource>,
        frames: Rc<dyn FrameSource>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                events: EventRegistry::new(),
                last_tick: RefCell::new(None),
                running: Cell::new(false),
                tick_listener: Cell::new(None),
                logic,
                frames,
                clock,
            }),
        }
    }

    /// Subscribe to `"run"`, `"stop"` or `"tick"`. Registrations persist
    /// across run/stop cycles and are only removed by explicit `off` calls.
    pub fn on(&self, event: &str, callback: impl FnMut(&LoopEvent) + 'static) -> ListenerId {
        self.inner.events.on(event, callback)
    }

    pub fn off(&self, event: &str, listener: ListenerId) {
        self.inner.events.off(event, listener);
    }

    pub fn off_event(&self, event: &str) {
        self.inner.events.off_event(event);
    }

    pub fn off_all(&self) {
        self.inner.events.off_all();
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Most recent logic tick observed since the loop was last started.
    pub fn last_tick(&self) -> Option<TickInfo> {
        *self.inner.last_tick.borrow()
    }

    /// Start the loop. No-op when already running. Subscribes to the logic
    /// source, emits `"run"`, and schedules the per-frame callback.
    pub fn run(&self) {
        if self.inner.running.get() {
            return;
        }
        let inner = self.inner.clone();
        let listener = self.inner.logic.on(
            TICK,
            Box::new(move |tick| {
                *inner.last_tick.borrow_mut() = Some(*tick);
            }),
        );
        self.inner.tick_listener.set(Some(listener));
        self.inner.running.set(true);
        tracing::debug!("render loop started");
        self.inner.events.emit(RUN, &LoopEvent::Run);

        let inner = self.inner.clone();
        self.inner
            .frames
            .schedule_frame(Box::new(move || inner.frame()));
    }

    /// Stop the loop. No-op when not running. Unsubscribes from the logic
    /// source, forgets the last tick, and emits `"stop"`. The frame chain
    /// ends cooperatively on its next invocation.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        if let Some(listener) = self.inner.tick_listener.take() {
            self.inner.logic.off(TICK, listener);
        }
        *self.inner.last_tick.borrow_mut() = None;
        self.inner.running.set(false);
        tracing::debug!("render loop stopped");
        self.inner.events.emit(STOP, &LoopEvent::Stop);
    }
}
