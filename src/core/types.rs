//! Core data types for the landmark anchoring engine

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A single fix from the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude above sea level (meters)
    pub altitude: f64,
    /// Horizontal uncertainty radius (meters); negative marks an invalid fix
    pub horizontal_accuracy: f64,
    /// Fix time (milliseconds since epoch)
    pub timestamp_ms: u64,
}

impl GeodeticPoint {
    /// Point at sea level with perfect accuracy, mostly useful for landmark locations
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            horizontal_accuracy: 0.0,
            timestamp_ms: 0,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_accuracy(mut self, horizontal_accuracy: f64) -> Self {
        self.horizontal_accuracy = horizontal_accuracy;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Whether the provider reported a usable horizontal accuracy
    pub fn has_valid_accuracy(&self) -> bool {
        self.horizontal_accuracy >= 0.0 && self.horizontal_accuracy.is_finite()
    }
}

/// Identifier shared by an anchor and the landmark it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(Uuid);

impl AnchorId {
    pub fn new() -> Self {
        AnchorId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to displayable content owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHandle(pub u64);

/// Arbitrary user metadata attached to a landmark
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Placement of an anchor in the tracking world (forward = -Z, up = +Y, right = +X)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform(pub Matrix4<f64>);

impl PlacementTransform {
    pub fn identity() -> Self {
        PlacementTransform(Matrix4::identity())
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Translation column of the transform
    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.0[(0, 3)], self.0[(1, 3)], self.0[(2, 3)])
    }
}

/// An anchor registered with the tracking session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    pub transform: PlacementTransform,
}

/// A piece of content bound to a real-world location
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    /// Identifier of the anchor carrying this landmark
    pub id: AnchorId,
    pub content: ContentHandle,
    pub location: GeodeticPoint,
    pub metadata: Metadata,
    /// Placement relative to the world origin it was created against
    pub transform: PlacementTransform,
    /// Unclamped surface distance from that world origin (meters)
    pub distance: f64,
}

impl Landmark {
    pub fn anchor(&self) -> Anchor {
        Anchor {
            id: self.id,
            transform: self.transform,
        }
    }
}
