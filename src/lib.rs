//! Scheduling and consistency core for an interactive trust-line network
//! canvas: an adaptive frame scheduler, a fingerprint-gated layout
//! coordinator, a bounds-aware camera and the host ports they run on.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod notify;
pub mod port;
pub mod resize;
pub mod scheduler;
pub mod snapshot;
pub mod util;
pub mod view;
pub mod viewport;

pub use config::{ViewConfig, load_config, parse_config};
pub use coordinator::{CoordinatorStats, LayoutCacheKey, LayoutCoordinator, LayoutState};
pub use error::{ConfigError, PortError};
pub use fingerprint::{StructuralFingerprint, fingerprint};
pub use layout::{DefaultLayoutEngine, LayoutEngine, LayoutMode, LayoutRequest, LayoutResult};
pub use port::{Fired, Handle, HostSignal, Platform, PointerId, SurfaceMetrics, Task};
pub use scheduler::{FrameOutcome, FrameScheduler, SchedulerPhase};
pub use snapshot::{LinkRecord, NodeRecord, SimulatedNetwork, Snapshot};
pub use view::{FrameView, GraphView, Renderer};
pub use viewport::{Camera, PointerEvent, ViewTransform, ViewportState, WheelEvent};
