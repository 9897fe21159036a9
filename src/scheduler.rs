use tracing::{debug, trace};

use crate::config::SchedulerConfig;
use crate::port::{Handle, Platform, Task};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Nothing to draw yet; the frame still counts toward idle polling.
    NotReady,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    Stopped,
    Active,
    IdleThrottled,
    DeepIdle,
}

/// What the scheduler drives once per frame.
pub trait FrameDriver {
    fn is_animating(&self) -> bool;
    fn surface_pixels(&self) -> (u32, u32);
    /// Drops cached drawing resources sized to the old surface.
    fn invalidate_resources(&mut self);
    fn draw(&mut self, timestamp_ms: f64) -> FrameOutcome;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Frame(Handle),
    IdleTimer(Handle),
}

/// Render loop with three cadences: a frame per display refresh while
/// something is happening, a slow poll timer while recently active, and
/// nothing at all once idle long enough after a successful render.
///
/// At most one frame or timer handle is outstanding at any time.
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    running: bool,
    has_rendered: bool,
    last_activity_ms: f64,
    pending: Option<Pending>,
    surface: Option<(u32, u32)>,
    frames_drawn: u64,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            running: false,
            has_rendered: false,
            last_activity_ms: 0.0,
            pending: None,
            surface: None,
            frames_drawn: 0,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        match (self.running, self.pending) {
            (false, _) => SchedulerPhase::Stopped,
            (true, Some(Pending::Frame(_))) => SchedulerPhase::Active,
            (true, Some(Pending::IdleTimer(_))) => SchedulerPhase::IdleThrottled,
            (true, None) => SchedulerPhase::DeepIdle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_rendered(&self) -> bool {
        self.has_rendered
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn ensure_render_loop(&mut self, platform: &dyn Platform) {
        if !self.running {
            self.running = true;
            self.has_rendered = false;
            self.last_activity_ms = platform.now_ms();
            debug!("render loop started");
        }
        if self.pending.is_none() {
            self.request_frame(platform);
        }
    }

    pub fn wake_up(&mut self, platform: &dyn Platform) {
        if !self.running {
            trace!("wake ignored; loop stopped");
            return;
        }
        self.last_activity_ms = platform.now_ms();
        match self.pending {
            Some(Pending::Frame(_)) => trace!("wake while frame pending"),
            Some(Pending::IdleTimer(handle)) => {
                platform.cancel_timer(handle);
                self.request_frame(platform);
            }
            None => {
                debug!("woken from deep idle");
                self.request_frame(platform);
            }
        }
    }

    pub fn stop_render_loop(&mut self, platform: &dyn Platform) {
        match self.pending.take() {
            Some(Pending::Frame(handle)) => platform.cancel_frame(handle),
            Some(Pending::IdleTimer(handle)) => platform.cancel_timer(handle),
            None => {}
        }
        if self.running {
            debug!("render loop stopped");
        }
        self.running = false;
    }

    /// Draws one frame outside the loop. Does not touch pending handles.
    pub fn render_once(&mut self, timestamp_ms: f64, driver: &mut dyn FrameDriver) -> FrameOutcome {
        self.draw(timestamp_ms, driver)
    }

    pub fn on_frame(
        &mut self,
        platform: &dyn Platform,
        handle: Handle,
        timestamp_ms: f64,
        driver: &mut dyn FrameDriver,
    ) {
        if self.pending != Some(Pending::Frame(handle)) {
            trace!(?handle, "stale frame ignored");
            return;
        }
        self.pending = None;

        self.draw(timestamp_ms, driver);

        if driver.is_animating() {
            self.last_activity_ms = timestamp_ms;
            self.request_frame(platform);
        } else if !self.has_rendered
            || timestamp_ms - self.last_activity_ms < self.config.deep_idle_after_ms
        {
            let timer = platform.schedule_timer(Task::IdlePoll, self.config.idle_poll_ms);
            self.pending = Some(Pending::IdleTimer(timer));
        } else {
            debug!(idle_ms = timestamp_ms - self.last_activity_ms, "entering deep idle");
        }
    }

    pub fn on_timer(&mut self, platform: &dyn Platform, handle: Handle) -> bool {
        if self.pending != Some(Pending::IdleTimer(handle)) {
            trace!(?handle, "stale idle poll ignored");
            return false;
        }
        self.pending = None;
        self.request_frame(platform);
        true
    }

    fn request_frame(&mut self, platform: &dyn Platform) {
        self.pending = Some(Pending::Frame(platform.schedule_frame()));
    }

    fn draw(&mut self, timestamp_ms: f64, driver: &mut dyn FrameDriver) -> FrameOutcome {
        let pixels = driver.surface_pixels();
        if self.surface.is_some_and(|previous| previous != pixels) {
            trace!(?pixels, "surface pixels changed; invalidating resources");
            driver.invalidate_resources();
        }
        self.surface = Some(pixels);

        let outcome = driver.draw(timestamp_ms);
        if outcome == FrameOutcome::Rendered {
            self.has_rendered = true;
            self.frames_drawn += 1;
        }
        outcome
    }
}
