//! Pan/zoom camera: world and screen transforms, bounds-aware clamping, the
//! background pan gesture and batched wheel zoom.
//!
//! Screen coordinates are surface-local, with the origin at the surface's
//! top-left corner. Client coordinates are the host's window coordinates.

mod clamp;
mod gesture;
mod wheel;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::config::CameraConfig;
use crate::notify::CallbackSlot;
use crate::port::Platform;

pub use clamp::{AxisFit, bounds_of, centering_pan, clamp_pan, content_fits};
pub use gesture::{PanGesture, PointerEvent};
pub use wheel::WheelEvent;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub pan: Vec2,
    pub zoom: f32,
}

/// Snapshot of the camera handed to renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// Centre of the viewport in screen coordinates.
    pub center: Pos2,
    pub pan: Vec2,
    pub zoom: f32,
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.center + self.pan + world.to_vec2() * self.zoom
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen - self.center - self.pan) / self.zoom).to_pos2()
    }
}

pub struct Camera {
    config: CameraConfig,
    state: ViewportState,
    viewport: Vec2,
    origin: Pos2,
    bounds: Option<Rect>,
    gesture: Option<PanGesture>,
    wheel: wheel::WheelBatch,
    on_change: CallbackSlot,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            state: ViewportState {
                pan: Vec2::ZERO,
                zoom: config.initial_zoom,
            },
            viewport: Vec2::ZERO,
            origin: Pos2::ZERO,
            bounds: None,
            gesture: None,
            wheel: wheel::WheelBatch::default(),
            on_change: CallbackSlot::new(),
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn gesture(&self) -> Option<PanGesture> {
        self.gesture
    }

    /// Fired after every pan or zoom the camera applies on its own.
    pub fn on_change(&self) -> &CallbackSlot {
        &self.on_change
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            center: (self.viewport * 0.5).to_pos2(),
            pan: self.state.pan,
            zoom: self.state.zoom,
        }
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.transform().world_to_screen(world)
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        self.transform().screen_to_world(screen)
    }

    pub fn client_to_screen(&self, client: Pos2) -> Pos2 {
        (client - self.origin).to_pos2()
    }

    pub fn content_fits(&self) -> AxisFit {
        content_fits(self.bounds, self.state.zoom, self.viewport)
    }

    pub fn set_viewport(&mut self, size: Vec2, origin: Pos2) {
        self.viewport = size;
        self.origin = origin;
        self.clamp();
    }

    /// Moves the surface without touching pan or zoom.
    pub fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        self.bounds = bounds;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.state.pan = clamp_pan(
            self.state.pan,
            self.bounds,
            self.state.zoom,
            self.viewport,
            self.config.edge_padding,
        );
    }

    pub fn reset(&mut self) {
        self.state = ViewportState {
            pan: Vec2::ZERO,
            zoom: self.config.initial_zoom,
        };
        self.clamp();
        self.on_change.fire();
    }

    /// Cancels the pending wheel flush and releases any captured pointer.
    pub fn dispose(&mut self, platform: &dyn Platform) {
        self.end_gesture(platform);
        self.cancel_wheel(platform);
    }
}
