mod common;

use eframe::egui::{Pos2, pos2};

use trustline_canvas::config::ViewConfig;
use trustline_canvas::layout::LayoutMode;
use trustline_canvas::port::{HeadlessPlatform, PointerId, SurfaceMetrics, Task};
use trustline_canvas::scheduler::SchedulerPhase;
use trustline_canvas::viewport::{PointerEvent, WheelEvent, centering_pan};

use common::{rig, snapshot};

const MOUSE: PointerId = PointerId(1);

fn ring_config() -> ViewConfig {
    let mut config = ViewConfig::default();
    config.layout.mode = LayoutMode::Ring;
    config
}

#[test]
fn drag_never_moves_a_fitting_axis() {
    let mut rig = rig(HeadlessPlatform::default(), ring_config());
    // two ring nodes sit on the vertical axis: no width, 504 px tall
    rig.view.set_snapshot(snapshot(&["A", "B"], &[("A", "B")]));
    rig.view.run_until(100.0);

    rig.view.on_wheel(WheelEvent::new(-300.0, pos2(400.0, 300.0)));
    rig.view.run_until(200.0);
    let zoom = rig.view.viewport().zoom;
    assert!(zoom > 1.5);

    let fit = rig.view.camera().content_fits();
    assert!(fit.x && !fit.y);
    let locked_x = centering_pan(rig.view.bounds(), zoom).x;

    assert!(rig.view.on_pointer_down(PointerEvent::new(MOUSE, pos2(400.0, 300.0))));
    for step in 1..=20u8 {
        let step = f32::from(step);
        rig.view
            .on_pointer_move(PointerEvent::new(MOUSE, pos2(400.0 + step * 25.0, 300.0 + step * 5.0)));
        assert_eq!(rig.view.viewport().pan.x, locked_x);
    }
    assert_ne!(rig.view.viewport().pan.y, 0.0);
    rig.view.on_pointer_up(PointerEvent::new(MOUSE, pos2(900.0, 400.0)));
    assert!(rig.view.platform().captured_pointers().is_empty());
}

#[test]
fn fully_visible_graph_ignores_background_drag() {
    let mut rig = rig(HeadlessPlatform::default(), ViewConfig::default());
    rig.view.set_snapshot(snapshot(&["A", "B", "C"], &[("A", "B")]));
    rig.view.run_until(100.0);
    let before = rig.view.viewport();

    assert!(!rig.view.on_pointer_down(PointerEvent::new(MOUSE, pos2(10.0, 10.0))));
    assert!(!rig.view.on_pointer_move(PointerEvent::new(MOUSE, pos2(300.0, 200.0))));
    assert_eq!(rig.view.viewport(), before);
}

#[test]
fn wheel_burst_applies_once() {
    let mut rig = rig(HeadlessPlatform::default(), ViewConfig::default());
    rig.view.set_snapshot(snapshot(&["A", "B"], &[("A", "B")]));
    rig.view.run_until(10_000.0);

    for _ in 0..3 {
        rig.view.on_wheel(WheelEvent::new(50.0, pos2(200.0, 100.0)));
    }
    assert_eq!(rig.view.platform().pending_timers_for(Task::WheelFlush), 1);
    rig.view.step();

    let expected = (-150.0f32 * 0.0018).exp();
    assert!((rig.view.viewport().zoom - expected).abs() < 1e-4);
    assert_eq!(rig.view.platform().pending_timers_for(Task::WheelFlush), 0);
}

#[test]
fn clamped_zoom_still_wakes_a_deep_idle_loop() {
    let mut config = ViewConfig::default();
    config.camera.initial_zoom = config.camera.zoom_max;
    let mut rig = rig(HeadlessPlatform::default(), config);
    rig.view.set_snapshot(snapshot(&["A", "B"], &[("A", "B")]));
    rig.view.run_until(10_000.0);
    assert_eq!(rig.view.phase(), SchedulerPhase::DeepIdle);

    for _ in 0..4 {
        rig.view.on_wheel(WheelEvent::new(-120.0, pos2(400.0, 300.0)));
    }
    rig.view.step();

    assert_eq!(rig.view.viewport().zoom, 6.0);
    assert_eq!(rig.view.phase(), SchedulerPhase::Active);
    assert_eq!(rig.view.platform().pending_frames(), 1);
}

#[test]
fn client_coordinates_follow_the_surface_origin() {
    let mut surface = SurfaceMetrics::new(800.0, 600.0, 1.0);
    surface.origin = pos2(280.0, 40.0);
    let mut rig = rig(HeadlessPlatform::new(surface), ViewConfig::default());
    rig.view.run_until(50.0);

    assert_eq!(rig.view.client_to_screen(pos2(280.0, 40.0)), Pos2::ZERO);
    let centre = rig.view.client_to_screen(pos2(680.0, 340.0));
    assert_eq!(rig.view.screen_to_world(centre), Pos2::ZERO);
    assert_eq!(rig.view.world_to_screen(Pos2::ZERO), centre);
}

#[test]
fn non_finite_wheel_input_leaves_the_camera_alone() {
    let mut rig = rig(HeadlessPlatform::default(), ViewConfig::default());
    rig.view.set_snapshot(snapshot(&["A", "B"], &[("A", "B")]));
    rig.view.run_until(100.0);
    let before = rig.view.viewport();

    rig.view.on_wheel(WheelEvent::new(f32::NAN, pos2(400.0, 300.0)));
    rig.view.run_until(200.0);

    assert_eq!(rig.view.viewport(), before);
    assert_eq!(rig.view.platform().pending_timers_for(Task::WheelFlush), 0);
}
