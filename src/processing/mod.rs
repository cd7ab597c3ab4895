//! Screen-space processing: intersection scans, overlap resolution, display scaling

pub mod intersection;
pub mod overlap;
pub mod scheduler;
pub mod view_scale;

pub use intersection::{IntersectionProbe, Intersections, NodeId, SceneGraph, SceneIndex, ScreenRect};
pub use overlap::{LandmarkLookup, OverlapResolver, OverlappingStrategy, VisibilityDecision, VisibleRange};
pub use scheduler::{CycleGuard, ProbeTimer};
pub use view_scale::{DisplayAttributes, DisplayScaler};
