use loop_core::events::EventRegistry;
use loop_core::frame::RedrawFrameSource;
use loop_core::render_loop::{interpolation, LoopEvent, RenderLoop, TICK};
use loop_core::time::{ManualClock, TickInfo};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn no_tick_yields_zero() {
    assert_eq!(interpolation(None, 990.0), 0.0);
}

#[test]
fn due_or_overdue_update_yields_zero() {
    let tick = TickInfo {
        next_ms: 1000.0,
        interval_ms: 16.0,
    };
    // Exactly due.
    assert_eq!(interpolation(Some(&tick), 1000.0), 0.0);
    // Overdue.
    assert_eq!(interpolation(Some(&tick), 1004.0), 0.0);
}

#[test]
fn factor_is_fraction_of_interval_remaining() {
    let tick = TickInfo {
        next_ms: 1000.0,
        interval_ms: 16.0,
    };
    assert_eq!(interpolation(Some(&tick), 992.0), 0.5);
    assert_eq!(interpolation(Some(&tick), 996.0), 0.25);
    // A tick observed the instant it was scheduled: whole interval left.
    assert_eq!(interpolation(Some(&tick), 984.0), 1.0);
}

// End-to-end scenario: logic tick {next: 1000, interval: 16} arrives at
// host time 990; a frame at 992 interpolates to 0.5; a later frame at 1004
// with no fresh tick yields 0; stop + run resets to 0 until a new tick.
#[test]
fn frames_interpolate_between_logic_ticks() {
    let logic = Rc::new(EventRegistry::<TickInfo>::new());
    let frames = Rc::new(RedrawFrameSource::new());
    let clock = ManualClock::new(990.0);
    let render_loop = RenderLoop::new(logic.clone(), frames.clone(), Rc::new(clock.clone()));

    let factors: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = factors.clone();
    render_loop.on(TICK, move |event| {
        if let LoopEvent::Tick { interpolation } = event {
            sink.borrow_mut().push(*interpolation);
        }
    });

    render_loop.run();
    logic.emit(
        TICK,
        &TickInfo {
            next_ms: 1000.0,
            interval_ms: 16.0,
        },
    );

    clock.set(992.0);
    frames.frame();
    assert_eq!(*factors.borrow(), vec![0.5]);

    clock.set(1004.0);
    frames.frame();
    assert_eq!(*factors.borrow(), vec![0.5, 0.0]);

    // Restarting discards the stale tick; interpolation starts from zero.
    render_loop.stop();
    render_loop.run();
    clock.set(1010.0);
    frames.frame();
    assert_eq!(*factors.borrow(), vec![0.5, 0.0, 0.0]);
}

proptest! {
    #[test]
    fn factor_matches_clamped_ratio(
        next_ms in 0.0f64..1e9,
        interval_ms in 1e-3f64..1e4,
        offset_ms in -1e4f64..1e4,
    ) {
        let now_ms = next_ms + offset_ms;
        let tick = TickInfo { next_ms, interval_ms };
        let factor = interpolation(Some(&tick), now_ms);
        let expected = ((next_ms - now_ms) / interval_ms).max(0.0);
        prop_assert_eq!(factor, expected);
        prop_assert!(factor >= 0.0);
    }

    #[test]
    fn factor_never_increases_as_time_advances(
        next_ms in 0.0f64..1e9,
        interval_ms in 1e-3f64..1e4,
        now_ms in 0.0f64..1e9,
        delta_ms in 0.0f64..1e6,
    ) {
        // Later frames against the same tick sit no further from the
        // upcoming update than earlier ones.
        let tick = TickInfo { next_ms, interval_ms };
        let earlier = interpolation(Some(&tick), now_ms);
        let later = interpolation(Some(&tick), now_ms + delta_ms);
        prop_assert!(later <= earlier);
    }
}
