use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::PortError;

use super::{
    Fired, Handle, ListenerStyle, ListenerToken, Platform, PointerId, SurfaceMetrics, Task,
};

const FRAME_INTERVAL_MS: f64 = 16.0;

/// Registered host subscription, as seen by [`HeadlessPlatform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Listener {
    Resize,
    Visibility,
    Resolution { dpr: f32, style: ListenerStyle },
}

#[derive(Clone, Copy, Debug)]
struct Queued {
    handle: Handle,
    task: Option<Task>,
    due_ms: f64,
}

#[derive(Default)]
struct Capabilities {
    deny_resolution: bool,
    deny_resize: bool,
    deny_visibility: bool,
    legacy_resolution_only: bool,
}

struct HeadlessState {
    now_ms: f64,
    next_id: u64,
    frames: Vec<Queued>,
    timers: Vec<Queued>,
    surface: SurfaceMetrics,
    listeners: HashMap<ListenerToken, Listener>,
    capabilities: Capabilities,
    captured: Vec<PointerId>,
    frames_requested: usize,
    timers_requested: usize,
}

/// Deterministic host with a virtual clock, for tests and offline runs.
///
/// Frames come due one frame interval after being requested; timers after
/// their delay. Entries due at the same instant fire in request order.
pub struct HeadlessPlatform {
    state: RefCell<HeadlessState>,
}

impl HeadlessPlatform {
    pub fn new(surface: SurfaceMetrics) -> Self {
        Self {
            state: RefCell::new(HeadlessState {
                now_ms: 0.0,
                next_id: 1,
                frames: Vec::new(),
                timers: Vec::new(),
                surface,
                listeners: HashMap::new(),
                capabilities: Capabilities::default(),
                captured: Vec::new(),
                frames_requested: 0,
                timers_requested: 0,
            }),
        }
    }

    pub fn set_now(&self, now_ms: f64) {
        let mut state = self.state.borrow_mut();
        state.now_ms = state.now_ms.max(now_ms);
    }

    pub fn set_surface(&self, surface: SurfaceMetrics) {
        self.state.borrow_mut().surface = surface;
    }

    pub fn deny_resolution_queries(&self) {
        self.state.borrow_mut().capabilities.deny_resolution = true;
    }

    pub fn deny_resize_observer(&self) {
        self.state.borrow_mut().capabilities.deny_resize = true;
    }

    pub fn deny_visibility_observer(&self) {
        self.state.borrow_mut().capabilities.deny_visibility = true;
    }

    pub fn legacy_resolution_only(&self) {
        self.state.borrow_mut().capabilities.legacy_resolution_only = true;
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn pending_timers_for(&self, task: Task) -> usize {
        self.state
            .borrow()
            .timers
            .iter()
            .filter(|timer| timer.task == Some(task))
            .count()
    }

    pub fn frames_requested(&self) -> usize {
        self.state.borrow().frames_requested
    }

    pub fn timers_requested(&self) -> usize {
        self.state.borrow().timers_requested
    }

    pub fn listeners(&self) -> Vec<Listener> {
        self.state.borrow().listeners.values().copied().collect()
    }

    pub fn captured_pointers(&self) -> Vec<PointerId> {
        self.state.borrow().captured.clone()
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        let state = self.state.borrow();
        state
            .frames
            .iter()
            .chain(state.timers.iter())
            .map(|entry| entry.due_ms)
            .reduce(f64::min)
    }

    /// Pops the earliest due entry and moves the clock to its due time.
    pub fn pop_next(&self) -> Option<Fired> {
        let mut state = self.state.borrow_mut();
        let frame = earliest(&state.frames);
        let timer = earliest(&state.timers);

        let take_frame = match (frame, timer) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(f), Some(t)) => {
                let (f, t) = (state.frames[f], state.timers[t]);
                (f.due_ms, f.handle) <= (t.due_ms, t.handle)
            }
        };

        let entry = if take_frame {
            state.frames.remove(frame?)
        } else {
            state.timers.remove(timer?)
        };
        state.now_ms = state.now_ms.max(entry.due_ms);

        Some(match entry.task {
            None => Fired::Frame {
                handle: entry.handle,
                timestamp_ms: state.now_ms,
            },
            Some(task) => Fired::Timer {
                handle: entry.handle,
                task,
            },
        })
    }

    /// Runs the pending frame at exactly `timestamp_ms`, ignoring its nominal
    /// due time.
    pub fn pop_frame_at(&self, timestamp_ms: f64) -> Option<Fired> {
        let mut state = self.state.borrow_mut();
        let index = earliest(&state.frames)?;
        let entry = state.frames.remove(index);
        state.now_ms = state.now_ms.max(timestamp_ms);
        Some(Fired::Frame {
            handle: entry.handle,
            timestamp_ms: state.now_ms,
        })
    }

    /// Pops the earliest timer, skipping any frames queued before it.
    pub fn pop_timer(&self) -> Option<Fired> {
        let mut state = self.state.borrow_mut();
        let index = earliest(&state.timers)?;
        let entry = state.timers.remove(index);
        state.now_ms = state.now_ms.max(entry.due_ms);
        entry.task.map(|task| Fired::Timer {
            handle: entry.handle,
            task,
        })
    }

    fn register(&self, listener: Listener) -> ListenerToken {
        let mut state = self.state.borrow_mut();
        let token = ListenerToken(state.next_id);
        state.next_id += 1;
        state.listeners.insert(token, listener);
        token
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(SurfaceMetrics::new(800.0, 600.0, 1.0))
    }
}

fn earliest(entries: &[Queued]) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.due_ms
                .total_cmp(&b.due_ms)
                .then_with(|| a.handle.cmp(&b.handle))
        })
        .map(|(index, _)| index)
}

impl Platform for HeadlessPlatform {
    fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }

    fn schedule_frame(&self) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = Handle(state.next_id);
        state.next_id += 1;
        let due_ms = state.now_ms + FRAME_INTERVAL_MS;
        state.frames.push(Queued {
            handle,
            task: None,
            due_ms,
        });
        state.frames_requested += 1;
        handle
    }

    fn cancel_frame(&self, handle: Handle) {
        self.state
            .borrow_mut()
            .frames
            .retain(|entry| entry.handle != handle);
    }

    fn schedule_timer(&self, task: Task, delay_ms: f64) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = Handle(state.next_id);
        state.next_id += 1;
        let due_ms = state.now_ms + delay_ms.max(0.0);
        state.timers.push(Queued {
            handle,
            task: Some(task),
            due_ms,
        });
        state.timers_requested += 1;
        handle
    }

    fn cancel_timer(&self, handle: Handle) {
        self.state
            .borrow_mut()
            .timers
            .retain(|entry| entry.handle != handle);
    }

    fn measure_surface(&self) -> SurfaceMetrics {
        self.state.borrow().surface
    }

    fn observe_resize(&self) -> Result<ListenerToken, PortError> {
        let denied = self.state.borrow().capabilities.deny_resize;
        if denied {
            return Err(PortError::Denied("resize observer"));
        }
        Ok(self.register(Listener::Resize))
    }

    fn observe_visibility(&self) -> Result<ListenerToken, PortError> {
        let denied = self.state.borrow().capabilities.deny_visibility;
        if denied {
            return Err(PortError::Denied("visibility events"));
        }
        Ok(self.register(Listener::Visibility))
    }

    fn watch_resolution(
        &self,
        dpr: f32,
        style: ListenerStyle,
    ) -> Result<ListenerToken, PortError> {
        {
            let state = self.state.borrow();
            if state.capabilities.deny_resolution {
                return Err(PortError::Denied("resolution media query"));
            }
            if state.capabilities.legacy_resolution_only && style == ListenerStyle::Modern {
                return Err(PortError::Unsupported("media query change events"));
            }
        }
        Ok(self.register(Listener::Resolution { dpr, style }))
    }

    fn unobserve(&self, token: ListenerToken) {
        self.state.borrow_mut().listeners.remove(&token);
    }

    fn capture_pointer(&self, pointer: PointerId) {
        let mut state = self.state.borrow_mut();
        if !state.captured.contains(&pointer) {
            state.captured.push(pointer);
        }
    }

    fn release_pointer(&self, pointer: PointerId) {
        self.state
            .borrow_mut()
            .captured
            .retain(|captured| *captured != pointer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tick_timers_fire_in_request_order() {
        let platform = HeadlessPlatform::default();
        let first = platform.schedule_timer(Task::LayoutTick, 0.0);
        let second = platform.schedule_timer(Task::WheelFlush, 0.0);

        assert_eq!(
            platform.pop_next(),
            Some(Fired::Timer {
                handle: first,
                task: Task::LayoutTick
            })
        );
        assert_eq!(
            platform.pop_next(),
            Some(Fired::Timer {
                handle: second,
                task: Task::WheelFlush
            })
        );
        assert_eq!(platform.pop_next(), None);
    }

    #[test]
    fn zero_delay_timer_runs_before_next_frame() {
        let platform = HeadlessPlatform::default();
        platform.schedule_frame();
        let timer = platform.schedule_timer(Task::LayoutTick, 0.0);

        assert!(matches!(
            platform.pop_next(),
            Some(Fired::Timer { handle, .. }) if handle == timer
        ));
        assert!(matches!(
            platform.pop_next(),
            Some(Fired::Frame { timestamp_ms, .. }) if timestamp_ms == FRAME_INTERVAL_MS
        ));
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let platform = HeadlessPlatform::default();
        let frame = platform.schedule_frame();
        let timer = platform.schedule_timer(Task::IdlePoll, 10.0);
        platform.cancel_frame(frame);
        platform.cancel_timer(timer);

        assert_eq!(platform.pop_next(), None);
        assert_eq!(platform.frames_requested(), 1);
        assert_eq!(platform.timers_requested(), 1);
    }

    #[test]
    fn legacy_only_host_rejects_modern_style() {
        let platform = HeadlessPlatform::default();
        platform.legacy_resolution_only();

        assert!(matches!(
            platform.watch_resolution(2.0, ListenerStyle::Modern),
            Err(PortError::Unsupported(_))
        ));
        let token = platform
            .watch_resolution(2.0, ListenerStyle::Legacy)
            .unwrap();
        assert_eq!(platform.listeners().len(), 1);
        platform.unobserve(token);
        assert!(platform.listeners().is_empty());
    }
}
