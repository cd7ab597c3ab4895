use crate::algorithms::geo_transform::max_anchor_distance;
use crate::core::{
    DEFAULT_RECENTER_THRESHOLD, LANDMARK_NODE_GENERATION, RECOMMENDED_RECENTER_RANGE, TRACKING_DISPLAY_LIMIT,
};
use crate::processing::overlap::{OverlappingStrategy, VisibleRange};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Runtime-settable engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkerConfig {
    /// Distance the device may travel from the world origin before it is replaced (meters)
    pub world_recentering_threshold: f64,
    /// Radius the tracking session renders anchors within (meters)
    pub tracking_display_limit: f64,
    /// Smallest scaling factor applied to landmark views
    pub min_view_scale: f64,
    /// Distance at which landmark views reach `min_view_scale` (meters)
    pub max_view_scale_distance: f64,
    /// Nearest distance at which landmarks are shown (meters)
    pub minimum_visible_distance: f64,
    /// Farthest distance at which landmarks are shown (meters)
    pub maximum_visible_distance: f64,
    /// Distance the observer must move before a landmark's content is refreshed (meters)
    pub min_update_distance: f64,
    /// Largest horizontal uncertainty a fix may carry to trigger a recenter (meters)
    pub max_location_uncertainty: f64,
    /// Interval between intersection scans (milliseconds)
    pub intersection_check_interval_ms: u64,
    /// Scene-graph generation at which landmark nodes live
    pub search_generation: u32,
    /// What to do with landmarks whose views overlap
    #[serde(skip)]
    pub overlapping_strategy: OverlappingStrategy,
}

impl Default for LandmarkerConfig {
    fn default() -> Self {
        Self {
            world_recentering_threshold: DEFAULT_RECENTER_THRESHOLD,
            tracking_display_limit: TRACKING_DISPLAY_LIMIT,
            min_view_scale: 0.5,
            max_view_scale_distance: f64::MAX,
            minimum_visible_distance: 0.0,
            maximum_visible_distance: f64::MAX,
            min_update_distance: 1.0,
            max_location_uncertainty: 50.0,
            intersection_check_interval_ms: 500,
            search_generation: LANDMARK_NODE_GENERATION,
            overlapping_strategy: OverlappingStrategy::ShowAll,
        }
    }
}

impl LandmarkerConfig {
    /// Farthest distance an anchor is projected before clamping
    pub fn max_anchor_distance(&self) -> f64 {
        max_anchor_distance(self.tracking_display_limit, self.world_recentering_threshold)
    }

    pub fn intersection_check_interval(&self) -> Duration {
        Duration::from_millis(self.intersection_check_interval_ms)
    }

    pub fn visible_range(&self) -> VisibleRange {
        VisibleRange::new(self.minimum_visible_distance, self.maximum_visible_distance)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// JSON serialization/deserialization error
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

/// Owns the live configuration and guards every change with validation
#[derive(Debug, Clone, Default)]
pub struct ConfigurationManager {
    config: LandmarkerConfig,
    is_modified: bool,
}

/// Saved configuration state for later restore
#[derive(Debug, Clone)]
pub struct ConfigurationSnapshot {
    config: LandmarkerConfig,
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration manager from a validated configuration
    pub fn with_config(config: LandmarkerConfig) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.update_config(config)?;
        manager.is_modified = false;
        Ok(manager)
    }

    pub fn config(&self) -> &LandmarkerConfig {
        &self.config
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: LandmarkerConfig) -> Result<(), ConfigError> {
        let validation = Self::validate_config(&config);
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }
        for warning in &validation.warnings {
            warn!(%warning, "accepted configuration with warning");
        }

        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Check if configuration has been modified since creation or last restore
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Validate a configuration without applying it
    pub fn validate_config(config: &LandmarkerConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !(config.tracking_display_limit > 0.0) || !config.tracking_display_limit.is_finite() {
            errors.push(ConfigError::invalid(
                "tracking_display_limit",
                config.tracking_display_limit,
                "Display limit must be a positive finite distance",
            ));
        }

        let threshold = config.world_recentering_threshold;
        if !(threshold > 0.0) || !threshold.is_finite() {
            errors.push(ConfigError::invalid(
                "world_recentering_threshold",
                threshold,
                "Recenter threshold must be a positive finite distance",
            ));
        } else if threshold > config.tracking_display_limit / 2.0 {
            errors.push(ConfigError::invalid(
                "world_recentering_threshold",
                threshold,
                "Recenter threshold above half the display limit can place nearby landmarks behind the device",
            ));
        } else if threshold < RECOMMENDED_RECENTER_RANGE.0 || threshold > RECOMMENDED_RECENTER_RANGE.1 {
            warnings.push(format!(
                "world_recentering_threshold {} outside recommended range {}-{}",
                threshold, RECOMMENDED_RECENTER_RANGE.0, RECOMMENDED_RECENTER_RANGE.1
            ));
        }

        if !(config.min_view_scale > 0.0 && config.min_view_scale <= 1.0) {
            errors.push(ConfigError::invalid(
                "min_view_scale",
                config.min_view_scale,
                "Minimum view scale must be within (0, 1]",
            ));
        }

        if !(config.max_view_scale_distance > 0.0) {
            errors.push(ConfigError::invalid(
                "max_view_scale_distance",
                config.max_view_scale_distance,
                "Scale distance must be positive",
            ));
        }

        if !(config.minimum_visible_distance >= 0.0) {
            errors.push(ConfigError::invalid(
                "minimum_visible_distance",
                config.minimum_visible_distance,
                "Visible distance cannot be negative",
            ));
        }

        if !(config.maximum_visible_distance >= config.minimum_visible_distance) {
            errors.push(ConfigError::invalid(
                "maximum_visible_distance",
                config.maximum_visible_distance,
                "Maximum visible distance must not be below the minimum",
            ));
        }

        if !(config.min_update_distance >= 0.0) {
            errors.push(ConfigError::invalid(
                "min_update_distance",
                config.min_update_distance,
                "Update distance cannot be negative",
            ));
        }

        if !(config.max_location_uncertainty > 0.0) {
            errors.push(ConfigError::invalid(
                "max_location_uncertainty",
                config.max_location_uncertainty,
                "Location uncertainty ceiling must be positive",
            ));
        }

        if config.intersection_check_interval_ms == 0 {
            errors.push(ConfigError::invalid(
                "intersection_check_interval_ms",
                config.intersection_check_interval_ms,
                "Intersection check interval must be non-zero",
            ));
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Apply a single-field change through full validation and return the old value
    fn set_field<T: Copy>(
        &mut self,
        apply: impl FnOnce(&mut LandmarkerConfig) -> &mut T,
        value: T,
    ) -> Result<T, ConfigError> {
        let mut candidate = self.config.clone();
        let slot = apply(&mut candidate);
        let old_value = *slot;
        *slot = value;
        self.update_config(candidate)?;
        Ok(old_value)
    }

    /// Update the recenter threshold with validation
    pub fn set_world_recentering_threshold(&mut self, threshold: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.world_recentering_threshold, threshold)
    }

    /// Update the tracking display limit with validation
    pub fn set_tracking_display_limit(&mut self, limit: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.tracking_display_limit, limit)
    }

    pub fn set_min_view_scale(&mut self, scale: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.min_view_scale, scale)
    }

    pub fn set_max_view_scale_distance(&mut self, distance: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.max_view_scale_distance, distance)
    }

    /// Update both visible-range bounds at once so the pair never passes through an invalid state
    pub fn set_visible_range(&mut self, minimum: f64, maximum: f64) -> Result<(f64, f64), ConfigError> {
        let mut candidate = self.config.clone();
        let old = (candidate.minimum_visible_distance, candidate.maximum_visible_distance);
        candidate.minimum_visible_distance = minimum;
        candidate.maximum_visible_distance = maximum;
        self.update_config(candidate)?;
        Ok(old)
    }

    pub fn set_min_update_distance(&mut self, distance: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.min_update_distance, distance)
    }

    pub fn set_max_location_uncertainty(&mut self, uncertainty: f64) -> Result<f64, ConfigError> {
        self.set_field(|c| &mut c.max_location_uncertainty, uncertainty)
    }

    pub fn set_intersection_check_interval_ms(&mut self, interval_ms: u64) -> Result<u64, ConfigError> {
        self.set_field(|c| &mut c.intersection_check_interval_ms, interval_ms)
    }

    pub fn set_search_generation(&mut self, generation: u32) -> Result<u32, ConfigError> {
        self.set_field(|c| &mut c.search_generation, generation)
    }

    /// Swap the overlap strategy; any strategy is valid
    pub fn set_overlapping_strategy(&mut self, strategy: OverlappingStrategy) -> OverlappingStrategy {
        self.is_modified = true;
        std::mem::replace(&mut self.config.overlapping_strategy, strategy)
    }

    /// Serialize the numeric settings to JSON; the overlap strategy is not serialized
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    /// Load numeric settings from JSON, keeping the current overlap strategy
    pub fn load_json(&mut self, content: &str) -> Result<(), ConfigError> {
        let mut config: LandmarkerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config: {}", e),
            })?;
        config.overlapping_strategy = self.config.overlapping_strategy.clone();
        self.update_config(config)
    }

    pub fn create_snapshot(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            config: self.config.clone(),
        }
    }

    pub fn restore_from_snapshot(&mut self, snapshot: ConfigurationSnapshot) {
        self.config = snapshot.config;
        self.is_modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LandmarkerConfig::default();
        assert_eq!(config.world_recentering_threshold, 10.0);
        assert_eq!(config.tracking_display_limit, 90.0);
        assert_eq!(config.max_anchor_distance(), 80.0);
        assert!(matches!(config.overlapping_strategy, OverlappingStrategy::ShowAll));
        assert!(ConfigurationManager::validate_config(&config).is_valid);
    }

    #[test]
    fn test_configuration_manager_creation() {
        let manager = ConfigurationManager::new();
        assert_eq!(manager.config().world_recentering_threshold, 10.0);
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_runtime_threshold_adjustment() {
        let mut manager = ConfigurationManager::new();

        let old = manager.set_world_recentering_threshold(20.0).unwrap();
        assert_eq!(old, 10.0);
        assert_eq!(manager.config().world_recentering_threshold, 20.0);
        assert_eq!(manager.config().max_anchor_distance(), 70.0);
        assert!(manager.is_modified());

        // Above half the display limit is rejected
        let result = manager.set_world_recentering_threshold(46.0);
        assert!(matches!(result, Err(ConfigError::InvalidParameter { .. })));
        assert_eq!(manager.config().world_recentering_threshold, 20.0);

        assert!(manager.set_world_recentering_threshold(0.0).is_err());
        assert!(manager.set_world_recentering_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_threshold_outside_recommended_range_warns() {
        let config = LandmarkerConfig {
            world_recentering_threshold: 40.0,
            ..Default::default()
        };
        let result = ConfigurationManager::validate_config(&config);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_display_limit_change_revalidates_threshold() {
        let mut manager = ConfigurationManager::new();
        manager.set_world_recentering_threshold(30.0).unwrap();

        // Threshold 30 would exceed half of a 50 m limit
        assert!(manager.set_tracking_display_limit(50.0).is_err());
        assert_eq!(manager.config().tracking_display_limit, 90.0);
        assert!(manager.set_tracking_display_limit(60.0).is_ok());
    }

    #[test]
    fn test_visible_range_adjustment() {
        let mut manager = ConfigurationManager::new();

        let old = manager.set_visible_range(5.0, 500.0).unwrap();
        assert_eq!(old, (0.0, f64::MAX));
        let range = manager.config().visible_range();
        assert!(range.contains(5.0));
        assert!(range.contains(500.0));
        assert!(!range.contains(4.9));
        assert!(!range.contains(500.1));

        assert!(manager.set_visible_range(100.0, 50.0).is_err());
        assert!(manager.set_visible_range(-1.0, 50.0).is_err());
        assert_eq!(manager.config().minimum_visible_distance, 5.0);
    }

    #[test]
    fn test_view_scale_and_interval_validation() {
        let mut manager = ConfigurationManager::new();
        assert!(manager.set_min_view_scale(0.0).is_err());
        assert!(manager.set_min_view_scale(1.5).is_err());
        assert_eq!(manager.set_min_view_scale(0.25).unwrap(), 0.5);

        assert!(manager.set_intersection_check_interval_ms(0).is_err());
        assert_eq!(manager.set_intersection_check_interval_ms(250).unwrap(), 500);
        assert_eq!(manager.config().intersection_check_interval(), Duration::from_millis(250));

        assert!(manager.set_max_location_uncertainty(0.0).is_err());
        assert!(manager.set_min_update_distance(-2.0).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_strategy() {
        let mut manager = ConfigurationManager::new();
        manager.set_world_recentering_threshold(15.0).unwrap();
        manager.set_overlapping_strategy(OverlappingStrategy::ShowNearest);
        let json = manager.to_json().unwrap();

        let mut loaded = ConfigurationManager::new();
        loaded.set_overlapping_strategy(OverlappingStrategy::ShowFarthest);
        loaded.load_json(&json).unwrap();

        assert_eq!(loaded.config().world_recentering_threshold, 15.0);
        assert_eq!(loaded.config().maximum_visible_distance, f64::MAX);
        assert!(matches!(loaded.config().overlapping_strategy, OverlappingStrategy::ShowFarthest));
    }

    #[test]
    fn test_load_json_rejects_invalid_values() {
        let mut manager = ConfigurationManager::new();

        let result = manager.load_json(r#"{ "world_recentering_threshold": 80.0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidParameter { .. })));

        let result = manager.load_json("not json");
        assert!(matches!(result, Err(ConfigError::SerializationError { .. })));
        assert_eq!(manager.config().world_recentering_threshold, 10.0);
    }

    #[test]
    fn test_configuration_snapshot_and_restore() {
        let mut manager = ConfigurationManager::new();
        let snapshot = manager.create_snapshot();

        manager.set_world_recentering_threshold(25.0).unwrap();
        manager.set_min_view_scale(0.1).unwrap();
        assert!(manager.is_modified());

        manager.restore_from_snapshot(snapshot);
        assert_eq!(manager.config().world_recentering_threshold, 10.0);
        assert_eq!(manager.config().min_view_scale, 0.5);
        assert!(!manager.is_modified());
    }
}
