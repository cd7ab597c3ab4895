//! Physical constants and tracking-system parameters

/// Mean Earth radius used for great-circle distances (meters)
pub const EARTH_MEAN_RADIUS: f64 = 6_371_008.8;

/// Distance from the tracking origin beyond which the AR session stops rendering anchors (meters)
pub const TRACKING_DISPLAY_LIMIT: f64 = 90.0;

/// Default distance the observer may travel before the world origin is replaced (meters)
pub const DEFAULT_RECENTER_THRESHOLD: f64 = 10.0;

/// Recommended band for the recenter threshold (meters)
pub const RECOMMENDED_RECENTER_RANGE: (f64, f64) = (5.0, 30.0);

/// Scene-graph depth of individually placed markers below their anchor node
pub const LANDMARK_NODE_GENERATION: u32 = 1;
