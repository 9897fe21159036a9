use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use eframe::egui::{Pos2, Rect};
use tracing::{debug, trace, warn};

use crate::fingerprint::{StructuralFingerprint, fingerprint};
use crate::layout::{LayoutEngine, LayoutMode, LayoutRequest, PlacedLink};
use crate::notify::CallbackSlot;
use crate::port::{Handle, HostSignal, Platform, Task};
use crate::resize::ResizeWatcher;
use crate::snapshot::Snapshot;
use crate::viewport::{Camera, bounds_of};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    pub width: u32,
    pub height: u32,
    pub mode: LayoutMode,
    pub positions: HashMap<String, Pos2>,
}

/// Everything a layout result depends on. Equal keys mean equal geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutCacheKey {
    pub fingerprint: StructuralFingerprint,
    pub width: u32,
    pub height: u32,
    pub mode: LayoutMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub computes: u64,
    pub skips: u64,
    pub wakes: u64,
}

/// Decides when the layout engine runs and owns the resulting positions.
///
/// Triggers (new snapshots, resize signals, relayout requests) only mark
/// work and arm a zero-delay `LayoutTick`; the tick remeasures the surface,
/// commits any size change, then runs the engine if the cache key moved.
/// Everything arriving before the tick therefore costs one compute and one
/// wake at most. A snapshot that only changes cosmetically still wakes the
/// loop so the new values get drawn, but never reaches the engine.
pub struct LayoutCoordinator {
    state: LayoutState,
    engine: Box<dyn LayoutEngine>,
    watcher: ResizeWatcher,
    snapshot: Option<Rc<Snapshot>>,
    fingerprint: Option<StructuralFingerprint>,
    last_key: Option<LayoutCacheKey>,
    laid_out: Option<StructuralFingerprint>,
    snapshot_changed: bool,
    links: Vec<PlacedLink>,
    pinned: HashMap<String, Pos2>,
    bounds: Option<Rect>,
    tick: Option<Handle>,
    debounce: Option<Handle>,
    wake: CallbackSlot,
    stats: CoordinatorStats,
}

impl LayoutCoordinator {
    pub fn new(engine: Box<dyn LayoutEngine>, mode: LayoutMode) -> Self {
        Self {
            state: LayoutState {
                mode,
                ..LayoutState::default()
            },
            engine,
            watcher: ResizeWatcher::new(),
            snapshot: None,
            fingerprint: None,
            last_key: None,
            laid_out: None,
            snapshot_changed: false,
            links: Vec::new(),
            pinned: HashMap::new(),
            bounds: None,
            tick: None,
            debounce: None,
            wake: CallbackSlot::new(),
            stats: CoordinatorStats::default(),
        }
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn positions(&self) -> &HashMap<String, Pos2> {
        &self.state.positions
    }

    pub fn links(&self) -> &[PlacedLink] {
        &self.links
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_deref()
    }

    pub fn fingerprint(&self) -> Option<StructuralFingerprint> {
        self.fingerprint
    }

    pub fn last_key(&self) -> Option<LayoutCacheKey> {
        self.last_key
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn mode(&self) -> LayoutMode {
        self.state.mode
    }

    pub fn watcher(&self) -> &ResizeWatcher {
        &self.watcher
    }

    /// True once a snapshot has been laid out at the current surface size.
    pub fn has_layout(&self) -> bool {
        self.snapshot.is_some() && self.last_key.is_some()
    }

    /// Slot invoked after each applied change. Fired through the slot, so a
    /// callback installed later still receives it.
    pub fn wake_slot(&self) -> &CallbackSlot {
        &self.wake
    }

    pub fn attach(&mut self, platform: &dyn Platform) {
        self.watcher.attach(platform);
        if !self.watcher.is_attached() {
            warn!("host offers no size signals; resizes need request_resize_and_layout");
        }
        self.request_relayout(platform);
    }

    /// Cancels pending ticks and unregisters every host listener.
    pub fn detach(&mut self, platform: &dyn Platform) {
        if let Some(handle) = self.tick.take() {
            platform.cancel_timer(handle);
        }
        if let Some(handle) = self.debounce.take() {
            platform.cancel_timer(handle);
        }
        self.watcher.detach(platform);
    }

    pub fn observe_snapshot(&mut self, platform: &dyn Platform, snapshot: Rc<Snapshot>) {
        let fingerprint = fingerprint(&snapshot);
        if self.fingerprint != Some(fingerprint) {
            trace!(nodes = snapshot.nodes.len(), links = snapshot.links.len(), "snapshot structure changed");
        }
        self.fingerprint = Some(fingerprint);
        self.snapshot = Some(snapshot);
        self.snapshot_changed = true;
        self.request_relayout(platform);
    }

    /// Arms the shared layout tick if it is not already pending.
    pub fn request_relayout(&mut self, platform: &dyn Platform) {
        if self.tick.is_none() {
            self.tick = Some(platform.schedule_timer(Task::LayoutTick, 0.0));
        }
    }

    /// Replaces any pending debounced relayout with one `delay_ms` from now.
    pub fn request_relayout_debounced(&mut self, platform: &dyn Platform, delay_ms: f64) {
        if let Some(handle) = self.debounce.take() {
            platform.cancel_timer(handle);
        }
        self.debounce = Some(platform.schedule_timer(Task::RelayoutDebounce, delay_ms));
    }

    pub fn request_resize_and_layout(&mut self, platform: &dyn Platform) {
        self.watcher.mark_dirty();
        self.request_relayout(platform);
    }

    pub fn on_host_signal(&mut self, platform: &dyn Platform, signal: HostSignal) {
        self.watcher.note(signal);
        self.request_relayout(platform);
    }

    /// Forgets the last applied key so the next flush recomputes.
    pub fn reset_layout_key_cache(&mut self) {
        self.last_key = None;
    }

    pub fn set_mode(&mut self, platform: &dyn Platform, mode: LayoutMode) {
        if self.state.mode == mode {
            return;
        }
        debug!(?mode, "layout mode changed");
        self.state.mode = mode;
        self.request_relayout(platform);
    }

    /// Fixes a node at `position`; survives later relayouts until unpinned.
    pub fn pin_node(&mut self, camera: &mut Camera, id: &str, position: Pos2) {
        self.pinned.insert(id.to_owned(), position);
        let Some(slot) = self.state.positions.get_mut(id) else {
            return;
        };
        if *slot == position {
            return;
        }
        *slot = position;
        self.bounds = bounds_of(self.state.positions.values());
        camera.set_bounds(self.bounds);
        self.wake();
    }

    pub fn unpin_node(&mut self, platform: &dyn Platform, id: &str) {
        if self.pinned.remove(id).is_some() {
            self.reset_layout_key_cache();
            self.request_relayout(platform);
        }
    }

    /// Dispatches a layout timer. Returns `false` for stale handles.
    pub fn on_timer(
        &mut self,
        platform: &dyn Platform,
        camera: &mut Camera,
        handle: Handle,
        task: Task,
    ) -> bool {
        let pending = match task {
            Task::LayoutTick => &mut self.tick,
            Task::RelayoutDebounce => &mut self.debounce,
            Task::IdlePoll | Task::WheelFlush => return false,
        };
        if *pending != Some(handle) {
            trace!(?handle, ?task, "stale layout timer ignored");
            return false;
        }
        *pending = None;
        self.flush(platform, camera);
        true
    }

    fn flush(&mut self, platform: &dyn Platform, camera: &mut Camera) {
        let remeasured = self.watcher.is_dirty();
        let resized = self.watcher.take_remeasure(platform);
        if remeasured {
            camera.set_origin(platform.measure_surface().origin);
        }

        // The new size is committed before the engine runs, so the layout
        // below always sees post-resize dimensions.
        if let Some(metrics) = resized {
            self.state.width = metrics.width.round() as u32;
            self.state.height = metrics.height.round() as u32;
            camera.set_viewport(metrics.size(), metrics.origin);
        }

        let refreshed = std::mem::take(&mut self.snapshot_changed);
        let recomputed = self.relayout(camera);
        if resized.is_some() || recomputed || refreshed {
            self.wake();
        }
    }

    fn relayout(&mut self, camera: &mut Camera) -> bool {
        let (Some(snapshot), Some(fingerprint)) = (self.snapshot.clone(), self.fingerprint) else {
            return false;
        };
        if self.state.width == 0 || self.state.height == 0 {
            trace!("surface not measured yet; layout deferred");
            return false;
        }

        let key = LayoutCacheKey {
            fingerprint,
            width: self.state.width,
            height: self.state.height,
            mode: self.state.mode,
        };
        if self.last_key == Some(key) {
            self.stats.skips += 1;
            trace!("layout key unchanged; skipping compute");
            return false;
        }

        if self
            .laid_out
            .is_some_and(|previous| previous.node_set_differs(&fingerprint))
        {
            let live = snapshot
                .nodes
                .iter()
                .map(|node| node.id.as_str())
                .collect::<HashSet<_>>();
            let before = self.state.positions.len();
            self.state
                .positions
                .retain(|id, _| live.contains(id.as_str()));
            self.pinned.retain(|id, _| live.contains(id.as_str()));
            trace!(pruned = before - self.state.positions.len(), "stale positions pruned");
        }

        let result = self.engine.compute(LayoutRequest {
            snapshot: &snapshot,
            width: self.state.width,
            height: self.state.height,
            mode: self.state.mode,
            previous: &self.state.positions,
        });

        for node in result.nodes {
            let position = self.pinned.get(&node.id).copied().unwrap_or(node.position);
            self.state.positions.insert(node.id, position);
        }
        self.links = result.links;
        self.laid_out = Some(fingerprint);
        self.last_key = Some(key);
        self.stats.computes += 1;

        self.bounds = bounds_of(self.state.positions.values());
        camera.set_bounds(self.bounds);

        debug!(
            nodes = self.state.positions.len(),
            links = self.links.len(),
            width = key.width,
            height = key.height,
            mode = ?key.mode,
            "layout recomputed"
        );
        true
    }

    fn wake(&mut self) {
        self.stats.wakes += 1;
        self.wake.fire();
    }
}
