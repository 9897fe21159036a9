use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui::{Pos2, Rect};
use tracing::debug;

use crate::config::ViewConfig;
use crate::coordinator::{CoordinatorStats, LayoutCoordinator};
use crate::error::ConfigError;
use crate::layout::{DefaultLayoutEngine, LayoutEngine, LayoutMode, PlacedLink};
use crate::port::{Fired, HeadlessPlatform, HostSignal, Platform, SurfaceMetrics, Task};
use crate::scheduler::{FrameDriver, FrameOutcome, FrameScheduler, SchedulerPhase};
use crate::snapshot::Snapshot;
use crate::viewport::{Camera, PointerEvent, ViewTransform, ViewportState, WheelEvent};

/// Everything a renderer gets for one frame.
pub struct FrameView<'a> {
    pub snapshot: &'a Snapshot,
    pub positions: &'a HashMap<String, Pos2>,
    pub links: &'a [PlacedLink],
    pub transform: ViewTransform,
    pub surface: SurfaceMetrics,
    pub timestamp_ms: f64,
}

pub trait Renderer {
    fn draw(&mut self, frame: &FrameView<'_>) -> FrameOutcome;

    fn invalidate_resources(&mut self) {}
}

impl<F> Renderer for F
where
    F: FnMut(&FrameView<'_>) -> FrameOutcome,
{
    fn draw(&mut self, frame: &FrameView<'_>) -> FrameOutcome {
        self(frame)
    }
}

/// Composition root: wires the scheduler, layout coordinator and camera to
/// one platform and exposes them as a single view.
///
/// Every entry point runs to completion, then turns any wake requested by
/// the coordinator or camera into one `wake_up` on the scheduler.
pub struct GraphView<P: Platform> {
    platform: Rc<P>,
    config: ViewConfig,
    scheduler: FrameScheduler,
    coordinator: LayoutCoordinator,
    camera: Camera,
    renderer: Box<dyn Renderer>,
    animating: Box<dyn Fn() -> bool>,
    wake_requested: Rc<Cell<bool>>,
    disposed: bool,
}

impl<P: Platform> GraphView<P> {
    pub fn new(
        platform: Rc<P>,
        config: ViewConfig,
        engine: Box<dyn LayoutEngine>,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut coordinator = LayoutCoordinator::new(engine, config.layout.mode);
        let camera = Camera::new(config.camera);

        let wake_requested = Rc::new(Cell::new(false));
        for slot in [coordinator.wake_slot(), camera.on_change()] {
            let flag = Rc::clone(&wake_requested);
            slot.install(move || flag.set(true));
        }

        coordinator.attach(&*platform);
        let mut view = Self {
            scheduler: FrameScheduler::new(config.scheduler),
            platform,
            config,
            coordinator,
            camera,
            renderer,
            animating: Box::new(|| false),
            wake_requested,
            disposed: false,
        };
        view.ensure_render_loop();
        Ok(view)
    }

    pub fn with_default_engine(
        platform: Rc<P>,
        config: ViewConfig,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ConfigError> {
        let engine = DefaultLayoutEngine::new(config.layout.force_iterations);
        Self::new(platform, config, Box::new(engine), renderer)
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn coordinator(&self) -> &LayoutCoordinator {
        &self.coordinator
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    pub fn positions(&self) -> &HashMap<String, Pos2> {
        self.coordinator.positions()
    }

    pub fn links(&self) -> &[PlacedLink] {
        self.coordinator.links()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.coordinator.bounds()
    }

    pub fn viewport(&self) -> ViewportState {
        self.camera.state()
    }

    pub fn transform(&self) -> ViewTransform {
        self.camera.transform()
    }

    pub fn set_animation_predicate(&mut self, predicate: impl Fn() -> bool + 'static) {
        self.animating = Box::new(predicate);
        self.wake_up();
    }

    pub fn ensure_render_loop(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.ensure_render_loop(&*self.platform);
    }

    pub fn wake_up(&mut self) {
        self.scheduler.wake_up(&*self.platform);
    }

    pub fn stop_render_loop(&mut self) {
        self.scheduler.stop_render_loop(&*self.platform);
    }

    pub fn render_once(&mut self, timestamp_ms: f64) -> FrameOutcome {
        let surface = self.surface();
        let mut driver = ViewDriver {
            coordinator: &self.coordinator,
            camera: &self.camera,
            renderer: &mut *self.renderer,
            animating: &*self.animating,
            surface,
        };
        self.scheduler.render_once(timestamp_ms, &mut driver)
    }

    pub fn set_snapshot(&mut self, snapshot: impl Into<Rc<Snapshot>>) {
        if self.disposed {
            return;
        }
        self.coordinator
            .observe_snapshot(&*self.platform, snapshot.into());
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if self.disposed {
            return;
        }
        self.coordinator.set_mode(&*self.platform, mode);
    }

    /// Relayout on the next tick, coalesced with every other trigger of
    /// that tick.
    pub fn request_relayout(&mut self) {
        if self.disposed {
            return;
        }
        self.coordinator.request_relayout(&*self.platform);
    }

    pub fn request_relayout_debounced(&mut self, delay_ms: f64) {
        if self.disposed {
            return;
        }
        self.coordinator
            .request_relayout_debounced(&*self.platform, delay_ms);
    }

    pub fn request_resize_and_layout(&mut self) {
        if self.disposed {
            return;
        }
        self.coordinator.request_resize_and_layout(&*self.platform);
    }

    pub fn reset_layout_key_cache(&mut self) {
        self.coordinator.reset_layout_key_cache();
    }

    pub fn on_host_signal(&mut self, signal: HostSignal) {
        if self.disposed {
            return;
        }
        self.coordinator.on_host_signal(&*self.platform, signal);
    }

    pub fn pin_node(&mut self, id: &str, position: Pos2) {
        self.coordinator.pin_node(&mut self.camera, id, position);
        self.flush_wake();
    }

    pub fn unpin_node(&mut self, id: &str) {
        if self.disposed {
            return;
        }
        self.coordinator.unpin_node(&*self.platform, id);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.flush_wake();
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.camera.world_to_screen(world)
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        self.camera.screen_to_world(screen)
    }

    pub fn client_to_screen(&self, client: Pos2) -> Pos2 {
        self.camera.client_to_screen(client)
    }

    pub fn on_pointer_down(&mut self, event: PointerEvent) -> bool {
        if self.disposed {
            return false;
        }
        let started = self.camera.on_pointer_down(&*self.platform, event);
        self.flush_wake();
        started
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) -> bool {
        let panned = self.camera.on_pointer_move(event);
        self.flush_wake();
        panned
    }

    pub fn on_pointer_up(&mut self, event: PointerEvent) {
        self.camera.on_pointer_up(&*self.platform, event);
    }

    pub fn on_pointer_cancel(&mut self, event: PointerEvent) {
        self.camera.on_pointer_cancel(&*self.platform, event);
    }

    pub fn on_wheel(&mut self, event: WheelEvent) {
        if self.disposed {
            return;
        }
        self.camera.on_wheel(&*self.platform, event);
    }

    /// Routes a due frame or timer to its owner.
    pub fn dispatch(&mut self, fired: Fired) {
        let platform = &*self.platform;
        match fired {
            Fired::Frame {
                handle,
                timestamp_ms,
            } => {
                let surface = self.surface();
                let mut driver = ViewDriver {
                    coordinator: &self.coordinator,
                    camera: &self.camera,
                    renderer: &mut *self.renderer,
                    animating: &*self.animating,
                    surface,
                };
                self.scheduler
                    .on_frame(platform, handle, timestamp_ms, &mut driver);
            }
            Fired::Timer { handle, task } => match task {
                Task::IdlePoll => {
                    self.scheduler.on_timer(platform, handle);
                }
                Task::LayoutTick | Task::RelayoutDebounce => {
                    self.coordinator
                        .on_timer(platform, &mut self.camera, handle, task);
                }
                Task::WheelFlush => {
                    self.camera.on_wheel_timer(handle);
                }
            },
        }
        self.flush_wake();
    }

    /// Stops the loop, cancels every pending timer and unregisters every
    /// host listener. The view stays inert afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let platform = &*self.platform;
        self.scheduler.stop_render_loop(platform);
        self.coordinator.detach(platform);
        self.camera.dispose(platform);
        self.coordinator.wake_slot().clear();
        self.camera.on_change().clear();
        self.wake_requested.set(false);
        self.disposed = true;
        debug!("graph view disposed");
    }

    fn surface(&self) -> SurfaceMetrics {
        self.coordinator
            .watcher()
            .committed()
            .unwrap_or_else(|| self.platform.measure_surface())
    }

    fn flush_wake(&mut self) {
        if self.wake_requested.replace(false) {
            self.scheduler.wake_up(&*self.platform);
        }
    }
}

impl GraphView<HeadlessPlatform> {
    /// Fires the next due entry, if any.
    pub fn step(&mut self) -> Option<Fired> {
        let fired = self.platform.pop_next()?;
        self.dispatch(fired);
        Some(fired)
    }

    /// Fires everything due up to `until_ms`, then moves the clock there.
    pub fn run_until(&mut self, until_ms: f64) {
        while self
            .platform
            .next_due_ms()
            .is_some_and(|due| due <= until_ms)
        {
            if self.step().is_none() {
                break;
            }
        }
        self.platform.set_now(until_ms);
    }
}

struct ViewDriver<'a> {
    coordinator: &'a LayoutCoordinator,
    camera: &'a Camera,
    renderer: &'a mut dyn Renderer,
    animating: &'a dyn Fn() -> bool,
    surface: SurfaceMetrics,
}

impl FrameDriver for ViewDriver<'_> {
    fn is_animating(&self) -> bool {
        (self.animating)()
    }

    fn surface_pixels(&self) -> (u32, u32) {
        self.surface.pixel_size()
    }

    fn invalidate_resources(&mut self) {
        self.renderer.invalidate_resources();
    }

    fn draw(&mut self, timestamp_ms: f64) -> FrameOutcome {
        let Some(snapshot) = self.coordinator.snapshot() else {
            return FrameOutcome::NotReady;
        };
        if !self.coordinator.has_layout() {
            return FrameOutcome::NotReady;
        }
        self.renderer.draw(&FrameView {
            snapshot,
            positions: self.coordinator.positions(),
            links: self.coordinator.links(),
            transform: self.camera.transform(),
            surface: self.surface,
            timestamp_ms,
        })
    }
}
