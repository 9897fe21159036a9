use eframe::egui::Pos2;
use tracing::{debug, trace};

use crate::port::{Platform, PointerId};

use super::{Camera, centering_pan};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    /// Client coordinates.
    pub position: Pos2,
}

impl PointerEvent {
    pub fn new(pointer: PointerId, position: Pos2) -> Self {
        Self { pointer, position }
    }
}

/// Background pan in progress. Starts as a candidate and becomes active
/// once the pointer travels past the pan threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGesture {
    pub pointer: PointerId,
    /// Screen position where the pointer went down.
    pub start: Pos2,
    /// Screen position of the last applied move; only meaningful when active.
    pub last: Pos2,
    pub active: bool,
    pub lock_x: Option<f32>,
    pub lock_y: Option<f32>,
}

impl Camera {
    /// Starts a candidate pan. Returns `false` when the content is fully
    /// visible, in which case dragging the background does nothing.
    pub fn on_pointer_down(&mut self, platform: &dyn Platform, event: PointerEvent) -> bool {
        // The previous gesture may never have seen its pointer-up.
        self.end_gesture(platform);

        let fit = self.content_fits();
        if fit.both() {
            trace!(pointer = ?event.pointer, "content fully visible; ignoring pan");
            return false;
        }

        let screen = self.client_to_screen(event.position);
        let centred = centering_pan(self.bounds, self.state.zoom);
        self.gesture = Some(PanGesture {
            pointer: event.pointer,
            start: screen,
            last: screen,
            active: false,
            lock_x: fit.x.then_some(centred.x),
            lock_y: fit.y.then_some(centred.y),
        });
        platform.capture_pointer(event.pointer);
        true
    }

    /// Applies a pan step. Returns `true` when the pan changed.
    pub fn on_pointer_move(&mut self, event: PointerEvent) -> bool {
        let Some(mut gesture) = self.gesture else {
            return false;
        };
        if gesture.pointer != event.pointer {
            return false;
        }

        let screen = self.client_to_screen(event.position);
        if !gesture.active {
            let threshold = self.config.pan_threshold_px;
            if (screen - gesture.start).length_sq() <= threshold * threshold {
                return false;
            }
            // Restart from the crossing point rather than jumping by the
            // distance already travelled.
            gesture.active = true;
            gesture.last = screen;
            self.gesture = Some(gesture);
            debug!(pointer = ?event.pointer, "pan started");
            return false;
        }

        let delta = screen - gesture.last;
        gesture.last = screen;
        self.gesture = Some(gesture);

        let before = self.state.pan;
        let mut pan = before + delta;
        if let Some(x) = gesture.lock_x {
            pan.x = x;
        }
        if let Some(y) = gesture.lock_y {
            pan.y = y;
        }
        self.state.pan = pan;
        self.clamp();

        if self.state.pan == before {
            return false;
        }
        self.on_change.fire();
        true
    }

    pub fn on_pointer_up(&mut self, platform: &dyn Platform, event: PointerEvent) {
        if self
            .gesture
            .is_some_and(|gesture| gesture.pointer == event.pointer)
        {
            self.end_gesture(platform);
        }
    }

    pub fn on_pointer_cancel(&mut self, platform: &dyn Platform, event: PointerEvent) {
        self.on_pointer_up(platform, event);
    }

    pub(super) fn end_gesture(&mut self, platform: &dyn Platform) {
        if let Some(gesture) = self.gesture.take() {
            platform.release_pointer(gesture.pointer);
        }
    }
}
