//! Distance-driven display scale and draw order for landmark nodes

use crate::core::AnchorId;
use crate::utils::config::LandmarkerConfig;
use std::collections::HashMap;

/// Draw order for a landmark at `distance`; nearer landmarks draw on top
pub fn z_position_for(distance: f64) -> f64 {
    if distance > 0.0 {
        1.0 / distance
    } else {
        f64::MAX
    }
}

/// Display scale for a landmark at `distance`.
///
/// The tracking session scales nodes by their anchor's distance; multiplying by
/// `1 / |tracking_scale|` cancels that out before applying our own falloff from
/// full size at the observer down to `min_view_scale` at `max_view_scale_distance`.
pub fn display_scale(distance: f64, min_view_scale: f64, max_view_scale_distance: f64, tracking_scale: f64) -> f64 {
    let inverse_tracking_scale = if tracking_scale != 0.0 {
        1.0 / tracking_scale.abs()
    } else {
        1.0
    };
    let ratio = (max_view_scale_distance - distance).max(0.0) / max_view_scale_distance;
    let scale_range = 1.0 - min_view_scale;
    (ratio * scale_range + min_view_scale) * inverse_tracking_scale
}

/// Attributes to push to a landmark node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayAttributes {
    pub scale: f64,
    pub z_position: f64,
}

/// Inputs a landmark's attributes were last computed from
#[derive(Debug, Clone, Copy, PartialEq)]
struct Emitted {
    distance: f64,
    tracking_scale: f64,
}

/// Computes display attributes, skipping landmarks whose distance and
/// tracking scale are unchanged since their last emission
#[derive(Debug, Clone)]
pub struct DisplayScaler {
    min_view_scale: f64,
    max_view_scale_distance: f64,
    last_emitted: HashMap<AnchorId, Emitted>,
}

impl DisplayScaler {
    pub fn from_config(config: &LandmarkerConfig) -> Self {
        Self {
            min_view_scale: config.min_view_scale,
            max_view_scale_distance: config.max_view_scale_distance,
            last_emitted: HashMap::new(),
        }
    }

    /// Pick up changed scale parameters; every landmark is re-emitted on its next update
    pub fn reconfigure(&mut self, config: &LandmarkerConfig) {
        self.min_view_scale = config.min_view_scale;
        self.max_view_scale_distance = config.max_view_scale_distance;
        self.last_emitted.clear();
    }

    /// Attributes for `id`, or `None` when neither input changed since the last call
    pub fn update(&mut self, id: AnchorId, distance: f64, tracking_scale: f64) -> Option<DisplayAttributes> {
        let inputs = Emitted {
            distance,
            tracking_scale,
        };
        if self.last_emitted.insert(id, inputs) == Some(inputs) {
            return None;
        }

        Some(DisplayAttributes {
            scale: display_scale(distance, self.min_view_scale, self.max_view_scale_distance, tracking_scale),
            z_position: z_position_for(distance),
        })
    }

    pub fn forget(&mut self, id: AnchorId) {
        self.last_emitted.remove(&id);
    }

    pub fn clear(&mut self) {
        self.last_emitted.clear();
    }

    pub fn tracked(&self) -> usize {
        self.last_emitted.len()
    }
}
