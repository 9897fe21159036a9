use eframe::egui::Pos2;
use tracing::trace;

use crate::port::{Handle, Platform, Task};

use super::Camera;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    /// Scroll amount in wheel units; positive scrolls down and zooms out.
    pub delta: f32,
    /// Client coordinates of the pointer.
    pub position: Pos2,
}

impl WheelEvent {
    pub fn new(delta: f32, position: Pos2) -> Self {
        Self { delta, position }
    }
}

#[derive(Debug, Default)]
pub(super) struct WheelBatch {
    net: f32,
    anchor: Option<Pos2>,
    events: u32,
    timer: Option<Handle>,
}

impl Camera {
    /// Accumulates a wheel event; the batch is applied once when the
    /// `WheelFlush` timer fires.
    pub fn on_wheel(&mut self, platform: &dyn Platform, event: WheelEvent) {
        let net = self.wheel.net + event.delta;
        if !net.is_finite() || !event.position.is_finite() {
            trace!(delta = event.delta, "non-finite wheel input dropped");
            return;
        }
        let anchor = self.client_to_screen(event.position);
        let batch = &mut self.wheel;
        batch.net = net;
        batch.anchor = Some(anchor);
        batch.events += 1;
        if batch.timer.is_none() {
            batch.timer = Some(platform.schedule_timer(Task::WheelFlush, 0.0));
        }
    }

    pub fn on_wheel_timer(&mut self, handle: Handle) -> bool {
        if self.wheel.timer != Some(handle) {
            trace!(?handle, "stale wheel flush ignored");
            return false;
        }
        self.wheel.timer = None;
        self.flush_wheel();
        true
    }

    /// Applies the accumulated delta, keeping the world point under the
    /// pointer fixed. Notifies even when clamping absorbed the whole change.
    fn flush_wheel(&mut self) {
        let batch = std::mem::take(&mut self.wheel);
        if batch.events == 0 {
            return;
        }

        let max_step = self.config.max_wheel_step;
        let factor = (-batch.net * self.config.wheel_sensitivity)
            .exp()
            .clamp(1.0 / max_step, max_step);
        let zoom = (self.state.zoom * factor).clamp(self.config.zoom_min, self.config.zoom_max);

        let transform = self.transform();
        let anchor = batch.anchor.unwrap_or(transform.center);
        let world = transform.screen_to_world(anchor);

        self.state.zoom = zoom;
        self.state.pan = anchor - transform.center - world.to_vec2() * zoom;
        self.clamp();

        trace!(events = batch.events, net = batch.net, zoom, "wheel batch applied");
        self.on_change.fire();
    }

    pub(super) fn cancel_wheel(&mut self, platform: &dyn Platform) {
        if let Some(handle) = self.wheel.timer.take() {
            platform.cancel_timer(handle);
        }
        self.wheel = WheelBatch::default();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use eframe::egui::{Rect, pos2, vec2};

    use super::*;
    use crate::config::CameraConfig;
    use crate::port::{Fired, HeadlessPlatform};

    fn camera() -> (Camera, Rc<Cell<u32>>) {
        let mut camera = Camera::new(CameraConfig::default());
        camera.set_viewport(vec2(800.0, 600.0), Pos2::ZERO);
        camera.set_bounds(Some(Rect::from_min_max(
            pos2(-5000.0, -5000.0),
            pos2(5000.0, 5000.0),
        )));
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        camera
            .on_change()
            .install(move || counter.set(counter.get() + 1));
        (camera, hits)
    }

    fn flush(platform: &HeadlessPlatform, camera: &mut Camera) {
        while let Some(Fired::Timer { handle, .. }) = platform.pop_timer() {
            camera.on_wheel_timer(handle);
        }
    }

    #[test]
    fn events_in_one_tick_apply_once() {
        let platform = HeadlessPlatform::default();
        let (mut camera, hits) = camera();

        for _ in 0..3 {
            camera.on_wheel(&platform, WheelEvent::new(-100.0, pos2(400.0, 300.0)));
        }
        assert_eq!(platform.pending_timers_for(Task::WheelFlush), 1);

        flush(&platform, &mut camera);

        let expected = (300.0f32 * 0.0018).exp();
        assert!((camera.state().zoom - expected).abs() < 1e-4);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn anchor_point_stays_under_pointer() {
        let platform = HeadlessPlatform::default();
        let (mut camera, _) = camera();
        let pointer = pos2(610.0, 140.0);
        let world = camera.screen_to_world(pointer);

        camera.on_wheel(&platform, WheelEvent::new(-250.0, pointer));
        flush(&platform, &mut camera);

        assert!(camera.state().zoom > 1.0);
        assert!((camera.world_to_screen(world) - pointer).length() < 1e-2);
    }

    #[test]
    fn zoom_absorbed_by_clamp_still_notifies() {
        let platform = HeadlessPlatform::default();
        let (mut camera, hits) = camera();
        camera.state.zoom = camera.config.zoom_max;

        camera.on_wheel(&platform, WheelEvent::new(-400.0, pos2(400.0, 300.0)));
        flush(&platform, &mut camera);

        assert_eq!(camera.state().zoom, camera.config.zoom_max);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn single_batch_step_is_bounded() {
        let platform = HeadlessPlatform::default();
        let (mut camera, _) = camera();

        camera.on_wheel(&platform, WheelEvent::new(100_000.0, pos2(400.0, 300.0)));
        flush(&platform, &mut camera);

        assert!((camera.state().zoom - 0.25).abs() < 1e-6);
    }

    #[test]
    fn non_finite_deltas_are_dropped() {
        let platform = HeadlessPlatform::default();
        let (mut camera, hits) = camera();
        let before = camera.state();

        camera.on_wheel(&platform, WheelEvent::new(f32::NAN, pos2(400.0, 300.0)));
        camera.on_wheel(&platform, WheelEvent::new(f32::INFINITY, pos2(400.0, 300.0)));
        camera.on_wheel(&platform, WheelEvent::new(-10.0, pos2(f32::NAN, 0.0)));
        assert_eq!(platform.pending_timers(), 0);

        camera.on_wheel(&platform, WheelEvent::new(f32::MAX, pos2(400.0, 300.0)));
        camera.on_wheel(&platform, WheelEvent::new(f32::MAX, pos2(400.0, 300.0)));
        flush(&platform, &mut camera);

        assert!(camera.state().zoom.is_finite());
        assert!(camera.state().pan.x.is_finite() && camera.state().pan.y.is_finite());
        assert!(camera.state().zoom < before.zoom);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn stale_or_cancelled_flush_is_ignored() {
        let platform = HeadlessPlatform::default();
        let (mut camera, hits) = camera();

        camera.on_wheel(&platform, WheelEvent::new(-50.0, pos2(0.0, 0.0)));
        camera.cancel_wheel(&platform);
        assert_eq!(platform.pending_timers(), 0);
        assert!(!camera.on_wheel_timer(Handle(999)));
        assert_eq!(hits.get(), 0);
        assert_eq!(camera.state().zoom, 1.0);
    }
}
