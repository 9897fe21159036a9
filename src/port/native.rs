use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use eframe::egui::{Context, Rect};

use crate::error::PortError;

use super::{
    Fired, Handle, HostSignal, ListenerStyle, ListenerToken, Platform, PointerId, SurfaceMetrics,
    Task,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum NativeListener {
    Resize,
    Visibility,
    Resolution { dpr: f32 },
}

struct NativeState {
    next_id: u64,
    frames: Vec<Handle>,
    timers: Vec<(Handle, Task, f64)>,
    surface: SurfaceMetrics,
    window: Option<Rect>,
    listeners: HashMap<ListenerToken, NativeListener>,
    signals: Vec<HostSignal>,
    captured: Option<PointerId>,
}

impl NativeState {
    fn listens(&self, wanted: NativeListener) -> bool {
        self.listeners.values().any(|listener| *listener == wanted)
    }

    fn push_signal(&mut self, signal: HostSignal) {
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
    }
}

/// Port backed by an `egui` context.
///
/// egui repaints on demand, so frames map to `request_repaint` and timers to
/// `request_repaint_after`; the app collects whatever came due with
/// [`take_due`](Self::take_due) at the start of each update. egui has no
/// change notifications for size or scale, so [`sync_host`](Self::sync_host)
/// diffs them per update and queues the matching [`HostSignal`]s.
pub struct EguiPlatform {
    ctx: Context,
    started: Instant,
    state: RefCell<NativeState>,
}

impl EguiPlatform {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            started: Instant::now(),
            state: RefCell::new(NativeState {
                next_id: 1,
                frames: Vec::new(),
                timers: Vec::new(),
                surface: SurfaceMetrics::default(),
                window: None,
                listeners: HashMap::new(),
                signals: Vec::new(),
                captured: None,
            }),
        }
    }

    pub fn sync_host(&self, canvas: Rect) {
        let dpr = self.ctx.pixels_per_point();
        let (window, minimized) = self.ctx.input(|input| {
            let viewport = input.viewport();
            (viewport.inner_rect, viewport.minimized.unwrap_or(false))
        });

        let mut state = self.state.borrow_mut();
        let next = SurfaceMetrics {
            width: canvas.width(),
            height: canvas.height(),
            dpr,
            visible: !minimized,
            origin: canvas.min,
        };
        let previous = state.surface;

        if window != state.window {
            state.window = window;
            if state.listens(NativeListener::Resize) {
                state.push_signal(HostSignal::WindowResize);
            }
        }
        if (next.width != previous.width || next.height != previous.height)
            && state.listens(NativeListener::Resize)
        {
            state.push_signal(HostSignal::ElementResize);
        }
        if next.visible != previous.visible && state.listens(NativeListener::Visibility) {
            state.push_signal(HostSignal::Visibility);
        }
        let left_density = state.listeners.values().any(|listener| {
            matches!(listener, NativeListener::Resolution { dpr: watched } if *watched != dpr)
        });
        if left_density {
            state.push_signal(HostSignal::DevicePixelRatio);
        }

        state.surface = next;
    }

    pub fn drain_signals(&self) -> Vec<HostSignal> {
        std::mem::take(&mut self.state.borrow_mut().signals)
    }

    /// Everything due at this update: timers first (earliest first), then
    /// the pending frame.
    pub fn take_due(&self) -> Vec<Fired> {
        let now = self.now_ms();
        let mut state = self.state.borrow_mut();

        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(state.timers.len());
        for (handle, task, due_ms) in state.timers.drain(..) {
            if due_ms <= now {
                due.push((due_ms, handle, task));
            } else {
                remaining.push((handle, task, due_ms));
            }
        }
        state.timers = remaining;
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut fired = due
            .into_iter()
            .map(|(_, handle, task)| Fired::Timer { handle, task })
            .collect::<Vec<_>>();
        fired.extend(state.frames.drain(..).map(|handle| Fired::Frame {
            handle,
            timestamp_ms: now,
        }));
        fired
    }

    fn register(&self, listener: NativeListener) -> ListenerToken {
        let mut state = self.state.borrow_mut();
        let token = ListenerToken(state.next_id);
        state.next_id += 1;
        state.listeners.insert(token, listener);
        token
    }

    fn next_handle(&self) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = Handle(state.next_id);
        state.next_id += 1;
        handle
    }
}

impl Platform for EguiPlatform {
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn schedule_frame(&self) -> Handle {
        let handle = self.next_handle();
        self.state.borrow_mut().frames.push(handle);
        self.ctx.request_repaint();
        handle
    }

    fn cancel_frame(&self, handle: Handle) {
        self.state
            .borrow_mut()
            .frames
            .retain(|pending| *pending != handle);
    }

    fn schedule_timer(&self, task: Task, delay_ms: f64) -> Handle {
        let handle = self.next_handle();
        let delay_ms = delay_ms.max(0.0);
        let due_ms = self.now_ms() + delay_ms;
        self.state.borrow_mut().timers.push((handle, task, due_ms));
        self.ctx
            .request_repaint_after(Duration::from_secs_f64(delay_ms / 1000.0));
        handle
    }

    fn cancel_timer(&self, handle: Handle) {
        self.state
            .borrow_mut()
            .timers
            .retain(|(pending, _, _)| *pending != handle);
    }

    fn measure_surface(&self) -> SurfaceMetrics {
        self.state.borrow().surface
    }

    fn observe_resize(&self) -> Result<ListenerToken, PortError> {
        Ok(self.register(NativeListener::Resize))
    }

    fn observe_visibility(&self) -> Result<ListenerToken, PortError> {
        Ok(self.register(NativeListener::Visibility))
    }

    fn watch_resolution(
        &self,
        dpr: f32,
        _style: ListenerStyle,
    ) -> Result<ListenerToken, PortError> {
        Ok(self.register(NativeListener::Resolution { dpr }))
    }

    fn unobserve(&self, token: ListenerToken) {
        self.state.borrow_mut().listeners.remove(&token);
    }

    fn capture_pointer(&self, pointer: PointerId) {
        self.state.borrow_mut().captured = Some(pointer);
    }

    fn release_pointer(&self, pointer: PointerId) {
        let mut state = self.state.borrow_mut();
        if state.captured == Some(pointer) {
            state.captured = None;
        }
    }
}
