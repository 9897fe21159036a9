//! Host abstraction: deferred callbacks, surface measurement and host
//! change subscriptions.
//!
//! Nothing here calls back into the core. A host records what was scheduled
//! and, when a frame or timer comes due, hands a [`Fired`] value to
//! [`GraphView::dispatch`](crate::view::GraphView::dispatch) on the same
//! thread.

mod headless;
mod native;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::error::PortError;

pub use headless::{HeadlessPlatform, Listener};
pub use native::EguiPlatform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

/// Which component a timer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    IdlePoll,
    LayoutTick,
    RelayoutDebounce,
    WheelFlush,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fired {
    Frame { handle: Handle, timestamp_ms: f64 },
    Timer { handle: Handle, task: Task },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Registration style for pixel-density change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerStyle {
    Modern,
    Legacy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostSignal {
    WindowResize,
    ElementResize,
    Visibility,
    DevicePixelRatio,
}

/// Logical size and placement of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMetrics {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
    pub visible: bool,
    /// Top-left corner of the surface in client coordinates.
    pub origin: Pos2,
}

impl SurfaceMetrics {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self {
            width,
            height,
            dpr,
            visible: true,
            origin: Pos2::ZERO,
        }
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.dpr > 0.0 { self.dpr } else { 1.0 };
        (
            (self.width * scale).round().max(0.0) as u32,
            (self.height * scale).round().max(0.0) as u32,
        )
    }

    pub fn is_measurable(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }

    /// Whether a layout would see a different surface. Moving the surface
    /// without resizing it is not a change.
    pub fn differs_from(&self, other: &Self) -> bool {
        self.width.round() != other.width.round()
            || self.height.round() != other.height.round()
            || self.dpr != other.dpr
    }
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

pub trait Platform {
    fn now_ms(&self) -> f64;

    fn schedule_frame(&self) -> Handle;
    fn cancel_frame(&self, handle: Handle);

    /// A zero delay fires on the next scheduling tick, after everything
    /// already queued for that tick.
    fn schedule_timer(&self, task: Task, delay_ms: f64) -> Handle;
    fn cancel_timer(&self, handle: Handle);

    fn measure_surface(&self) -> SurfaceMetrics;

    fn observe_resize(&self) -> Result<ListenerToken, PortError>;
    fn observe_visibility(&self) -> Result<ListenerToken, PortError>;
    /// Subscribes to the surface leaving pixel density `dpr`.
    fn watch_resolution(&self, dpr: f32, style: ListenerStyle)
    -> Result<ListenerToken, PortError>;
    fn unobserve(&self, token: ListenerToken);

    fn capture_pointer(&self, pointer: PointerId);
    fn release_pointer(&self, pointer: PointerId);
}
