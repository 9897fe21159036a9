use eframe::egui::{self, Event, MouseWheelUnit, PointerButton, Rect, Ui};

use trustline_canvas::port::PointerId;
use trustline_canvas::viewport::{PointerEvent, WheelEvent};

use super::ViewModel;

const MOUSE: PointerId = PointerId(0);
const WHEEL_LINE_PX: f32 = 40.0;

impl ViewModel {
    /// Replays this update's raw pointer and wheel events into the view.
    pub(super) fn forward_input(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let events = ui.input(|input| input.events.clone());
        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: true,
                    ..
                } if rect.contains(pos) => {
                    self.pointer_down = true;
                    self.interaction_hold.set(true);
                    self.view.on_pointer_down(PointerEvent::new(MOUSE, pos));
                }
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } => self.release_pointer(pos, false),
                Event::PointerMoved(pos) if self.pointer_down => {
                    self.view.on_pointer_move(PointerEvent::new(MOUSE, pos));
                }
                Event::PointerGone => {
                    let last = ui
                        .input(|input| input.pointer.latest_pos())
                        .unwrap_or_else(|| rect.center());
                    self.release_pointer(last, true);
                }
                Event::MouseWheel { unit, delta, .. } if response.hovered() => {
                    let scale = match unit {
                        MouseWheelUnit::Point => 1.0,
                        MouseWheelUnit::Line => WHEEL_LINE_PX,
                        MouseWheelUnit::Page => rect.height(),
                    };
                    let pos = ui
                        .input(|input| input.pointer.hover_pos())
                        .unwrap_or_else(|| rect.center());
                    // egui reports scrolling up as positive; the camera zooms
                    // out on positive deltas.
                    self.view.on_wheel(WheelEvent::new(-delta.y * scale, pos));
                }
                _ => {}
            }
        }
    }

    fn release_pointer(&mut self, pos: egui::Pos2, cancelled: bool) {
        if !self.pointer_down {
            return;
        }
        self.pointer_down = false;
        self.interaction_hold.set(false);

        let event = PointerEvent::new(MOUSE, pos);
        if cancelled {
            self.view.on_pointer_cancel(event);
        } else {
            self.view.on_pointer_up(event);
        }
        // Let the loop notice the hold ended.
        self.view.wake_up();
    }
}
