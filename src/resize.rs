use tracing::{debug, trace, warn};

use crate::error::PortError;
use crate::port::{HostSignal, ListenerStyle, ListenerToken, Platform, SurfaceMetrics};

/// Turns host resize, visibility and pixel-density signals into at most one
/// remeasure per flush, and only reports a measurement that actually
/// differs from the last committed one.
#[derive(Debug, Default)]
pub struct ResizeWatcher {
    resize: Option<ListenerToken>,
    visibility: Option<ListenerToken>,
    resolution: Option<ResolutionWatch>,
    committed: Option<SurfaceMetrics>,
    dirty: bool,
}

#[derive(Clone, Copy, Debug)]
struct ResolutionWatch {
    token: ListenerToken,
    dpr: f32,
}

impl ResizeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to host signals. A host that refuses a subscription leaves
    /// the watcher working with whatever it can still observe.
    pub fn attach(&mut self, platform: &dyn Platform) {
        self.detach(platform);

        match platform.observe_resize() {
            Ok(token) => self.resize = Some(token),
            Err(err) => warn!(%err, "resize observation unavailable"),
        }
        match platform.observe_visibility() {
            Ok(token) => self.visibility = Some(token),
            Err(err) => warn!(%err, "visibility observation unavailable"),
        }

        let dpr = platform.measure_surface().dpr;
        self.resolution = watch_resolution(platform, dpr);
        self.dirty = true;
    }

    pub fn detach(&mut self, platform: &dyn Platform) {
        let tokens = [
            self.resize.take(),
            self.visibility.take(),
            self.resolution.take().map(|watch| watch.token),
        ];
        for token in tokens.into_iter().flatten() {
            platform.unobserve(token);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.resize.is_some() || self.visibility.is_some() || self.resolution.is_some()
    }

    pub fn note(&mut self, signal: HostSignal) {
        trace!(?signal, "host signal");
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn committed(&self) -> Option<SurfaceMetrics> {
        self.committed
    }

    /// Measures the surface if anything was signalled since the last call.
    /// Returns the new metrics only when they differ from the committed
    /// ones; an unmeasurable (collapsed or hidden) surface is never committed.
    pub fn take_remeasure(&mut self, platform: &dyn Platform) -> Option<SurfaceMetrics> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }

        let metrics = platform.measure_surface();
        self.follow_resolution(platform, metrics.dpr);

        if !metrics.visible || !metrics.is_measurable() {
            trace!(?metrics, "surface not measurable; keeping previous size");
            return None;
        }
        let changed = self
            .committed
            .is_none_or(|committed| metrics.differs_from(&committed));
        if !changed {
            trace!("remeasure found no size change");
            return None;
        }

        debug!(
            width = metrics.width,
            height = metrics.height,
            dpr = metrics.dpr,
            "surface resized"
        );
        self.committed = Some(metrics);
        Some(metrics)
    }

    // A density watch only fires when leaving the density it was created
    // for, so it is replaced on every change.
    fn follow_resolution(&mut self, platform: &dyn Platform, dpr: f32) {
        let Some(watch) = self.resolution else {
            return;
        };
        if watch.dpr == dpr {
            return;
        }
        platform.unobserve(watch.token);
        self.resolution = watch_resolution(platform, dpr);
    }
}

fn watch_resolution(platform: &dyn Platform, dpr: f32) -> Option<ResolutionWatch> {
    let token = match platform.watch_resolution(dpr, ListenerStyle::Modern) {
        Ok(token) => token,
        Err(PortError::Unsupported(_)) => match platform.watch_resolution(dpr, ListenerStyle::Legacy) {
            Ok(token) => token,
            Err(err) => {
                warn!(%err, dpr, "pixel density changes will not be tracked");
                return None;
            }
        },
        Err(err) => {
            warn!(%err, dpr, "pixel density changes will not be tracked");
            return None;
        }
    };
    Some(ResolutionWatch { token, dpr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::HeadlessPlatform;
    use crate::port::Listener;

    #[test]
    fn attach_registers_all_three_listeners() {
        let platform = HeadlessPlatform::default();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        let listeners = platform.listeners();
        assert_eq!(listeners.len(), 3);
        assert!(listeners.contains(&Listener::Resolution {
            dpr: 1.0,
            style: ListenerStyle::Modern
        }));

        watcher.detach(&platform);
        assert!(platform.listeners().is_empty());
        assert!(!watcher.is_attached());
    }

    #[test]
    fn unchanged_size_is_silent() {
        let platform = HeadlessPlatform::default();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        assert!(watcher.take_remeasure(&platform).is_some());
        watcher.note(HostSignal::WindowResize);
        watcher.note(HostSignal::ElementResize);
        assert!(watcher.take_remeasure(&platform).is_none());
        assert!(watcher.take_remeasure(&platform).is_none());
    }

    #[test]
    fn density_change_resubscribes() {
        let platform = HeadlessPlatform::default();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);
        watcher.take_remeasure(&platform);

        platform.set_surface(SurfaceMetrics::new(800.0, 600.0, 2.0));
        watcher.note(HostSignal::DevicePixelRatio);
        let metrics = watcher.take_remeasure(&platform).unwrap();

        assert_eq!(metrics.pixel_size(), (1600, 1200));
        let watches = platform
            .listeners()
            .into_iter()
            .filter(|listener| matches!(listener, Listener::Resolution { .. }))
            .collect::<Vec<_>>();
        assert_eq!(
            watches,
            vec![Listener::Resolution {
                dpr: 2.0,
                style: ListenerStyle::Modern
            }]
        );
    }

    #[test]
    fn legacy_style_is_used_when_modern_is_unsupported() {
        let platform = HeadlessPlatform::default();
        platform.legacy_resolution_only();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        assert!(platform.listeners().contains(&Listener::Resolution {
            dpr: 1.0,
            style: ListenerStyle::Legacy
        }));
    }

    #[test]
    fn denied_capabilities_degrade_quietly() {
        let platform = HeadlessPlatform::default();
        platform.deny_resolution_queries();
        platform.deny_visibility_observer();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        assert_eq!(platform.listeners(), vec![Listener::Resize]);
        assert!(watcher.take_remeasure(&platform).is_some());

        platform.set_surface(SurfaceMetrics::new(800.0, 600.0, 3.0));
        watcher.note(HostSignal::ElementResize);
        assert!(watcher.take_remeasure(&platform).is_some());
        assert_eq!(platform.listeners(), vec![Listener::Resize]);
    }

    #[test]
    fn fully_denied_host_leaves_watcher_detached() {
        let platform = HeadlessPlatform::default();
        platform.deny_resize_observer();
        platform.deny_visibility_observer();
        platform.deny_resolution_queries();
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        assert!(!watcher.is_attached());
        assert!(platform.listeners().is_empty());
        assert!(watcher.take_remeasure(&platform).is_some());
    }

    #[test]
    fn collapsed_surface_is_not_committed() {
        let platform = HeadlessPlatform::new(SurfaceMetrics::new(0.0, 0.0, 1.0));
        let mut watcher = ResizeWatcher::new();
        watcher.attach(&platform);

        assert!(watcher.take_remeasure(&platform).is_none());
        assert!(watcher.committed().is_none());

        platform.set_surface(SurfaceMetrics::new(320.0, 200.0, 1.0));
        watcher.note(HostSignal::ElementResize);
        assert!(watcher.take_remeasure(&platform).is_some());
    }
}
