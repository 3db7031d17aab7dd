mod logic;

use crate::logic::LogicLoop;
use anyhow::Result;
use loop_core::frame::{select_refresh_interval, RedrawFrameSource, TimerFrameSource};
use loop_core::render_loop::{LoopEvent, RenderLoop, TICK};
use loop_core::time::{Clock, SystemClock};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, Level};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

// 30 Hz logic under a display-rate render loop, so interpolation is visible.
const LOGIC_INTERVAL_MS: f64 = 1000.0 / 30.0;
const DEMO_SPEED: f64 = 0.05; // units per millisecond
const LOG_EVERY_FRAMES: u32 = 120;
const HEADLESS_FRAMES: u32 = 300;

struct App {
    window: Option<Arc<Window>>,
    frames: Rc<RedrawFrameSource>,
    logic: Rc<LogicLoop>,
    render_loop: RenderLoop,
    clock: Rc<SystemClock>,
    position: Rc<Cell<f64>>,
}

impl App {
    fn new() -> Self {
        let clock = Rc::new(SystemClock::new());
        let logic = Rc::new(LogicLoop::new(LOGIC_INTERVAL_MS, clock.now_ms()));
        let frames = Rc::new(RedrawFrameSource::new());
        let render_loop = RenderLoop::new(logic.clone(), frames.clone(), clock.clone());
        let position = Rc::new(Cell::new(0.0f64));

        attach_demo_renderer(&render_loop, logic.clone(), position.clone());

        Self {
            window: None,
            frames,
            logic,
            render_loop,
            clock,
            position,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attributes = WindowAttributes::default()
                .with_title("Framepulse Demo")
                .with_inner_size(PhysicalSize::new(640, 360));

            match event_loop.create_window(window_attributes) {
                Ok(window) => {
                    // Probe the display refresh capability once, in priority
                    // order; the fallback interval is used silently if the
                    // backend reports nothing.
                    let refresh = select_refresh_interval([
                        window
                            .current_monitor()
                            .and_then(|monitor| monitor.refresh_rate_millihertz()),
                        event_loop
                            .primary_monitor()
                            .and_then(|monitor| monitor.refresh_rate_millihertz()),
                    ]);
                    info!("display refresh interval: {:?}", refresh);
                    self.window = Some(Arc::new(window));
                    self.render_loop.run();
                }
                Err(e) => {
                    tracing::error!("Failed to create window: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                self.render_loop.stop();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.frames.frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let position = self.position.clone();
        self.logic.pump(self.clock.now_ms(), |dt| {
            position.set(position.get() + DEMO_SPEED * dt);
        });

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Subscribe a log-only "renderer": it reads the interpolation factor each
/// frame and reports the smoothed position at a sampled cadence.
fn attach_demo_renderer(render_loop: &RenderLoop, logic: Rc<LogicLoop>, position: Rc<Cell<f64>>) {
    let frame_count = Cell::new(0u32);
    render_loop.on(TICK, move |event| {
        if let LoopEvent::Tick { interpolation } = event {
            frame_count.set(frame_count.get() + 1);
            if frame_count.get() % LOG_EVERY_FRAMES == 0 {
                // Interpolate backward from the upcoming logic state.
                let step = DEMO_SPEED * logic.interval_ms();
                let smoothed = position.get() + (1.0 - interpolation) * step;
                debug!(
                    "frame {}: interpolation={:.3} position={:.2}",
                    frame_count.get(),
                    interpolation,
                    smoothed
                );
            }
        }
    });
}

/// Timer-fallback mode: no window, no refresh-aligned primitive. The logic
/// source is pumped from inside the tick subscriber and the loop stops
/// itself after a fixed number of frames.
fn run_headless() -> Result<()> {
    info!("running headless with the timer fallback");

    let clock = Rc::new(SystemClock::new());
    let logic = Rc::new(LogicLoop::new(LOGIC_INTERVAL_MS, clock.now_ms()));
    let frames = Rc::new(TimerFrameSource::default());
    let render_loop = RenderLoop::new(logic.clone(), frames.clone(), clock.clone());

    let position = Rc::new(Cell::new(0.0f64));
    attach_demo_renderer(&render_loop, logic.clone(), position.clone());

    let remaining = Cell::new(HEADLESS_FRAMES);
    let handle = render_loop.clone();
    let pump_clock = clock.clone();
    render_loop.on(TICK, move |_| {
        logic.pump(pump_clock.now_ms(), |dt| {
            position.set(position.get() + DEMO_SPEED * dt);
        });
        remaining.set(remaining.get() - 1);
        if remaining.get() == 0 {
            handle.stop();
        }
    });

    render_loop.run();
    frames.drive();

    info!("headless run finished after {} frames", HEADLESS_FRAMES);
    Ok(())
}

fn main() -> Result<()> {
    let headless = std::env::args().skip(1).any(|arg| arg == "--headless");

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    info!("Framepulse starting...");

    if headless {
        return run_headless();
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
