//! Geodetic placement math
//!
//! Converts a pair of geodetic points into a placement transform in the
//! tracking world's frame (forward = -Z, up = +Y, right = +X). Everything here
//! is pure and may run on any thread.

use crate::core::{GeodeticPoint, PlacementTransform, EARTH_MEAN_RADIUS};
use nalgebra::{Matrix4, Vector3};
use std::f64::consts::PI;

/// Result of placing a target relative to an origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub transform: PlacementTransform,
    /// Unclamped surface distance between origin and target (meters)
    pub distance: f64,
}

/// Great-circle surface distance between two points (haversine, meters)
pub fn surface_distance(start: &GeodeticPoint, end: &GeodeticPoint) -> f64 {
    let lat1 = start.latitude.to_radians();
    let lat2 = end.latitude.to_radians();
    let dlat = (end.latitude - start.latitude).to_radians();
    let dlon = (end.longitude - start.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_MEAN_RADIUS * c
}

/// Initial great-circle bearing from `start` to `end`, in radians within `[0, 2π)`
pub fn bearing(start: &GeodeticPoint, end: &GeodeticPoint) -> f64 {
    let start_lat = start.latitude.to_radians();
    let start_lon = start.longitude.to_radians();
    let end_lat = end.latitude.to_radians();
    let end_lon = end.longitude.to_radians();

    let lon_diff = end_lon - start_lon;
    let y = lon_diff.sin() * end_lat.cos();
    let x = start_lat.cos() * end_lat.sin() - start_lat.sin() * end_lat.cos() * lon_diff.cos();
    let mut angle = y.atan2(x);
    // atan2 yields (-π, π], so one correction always lands in [0, 2π)
    if angle < 0.0 {
        angle += 2.0 * PI;
    }
    angle
}

/// Elevation of `end` as seen from `start`, in radians (positive is up)
pub fn angle_off_horizon(start: &GeodeticPoint, end: &GeodeticPoint) -> f64 {
    let adjacent = surface_distance(start, end);
    let opposite = end.altitude - start.altitude;
    opposite.atan2(adjacent)
}

/// Farthest distance at which an anchor is projected
pub fn max_anchor_distance(display_limit: f64, recenter_threshold: f64) -> f64 {
    display_limit - recenter_threshold
}

/// Pure translation along the tracking world axes
pub fn translating_identity(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Rotate about the Y axis; positive turns toward -X
pub fn rotate_horizontally(matrix: &Matrix4<f64>, radians: f64) -> Matrix4<f64> {
    Matrix4::from_axis_angle(&Vector3::y_axis(), radians) * matrix
}

/// Rotate about the X axis; positive tilts toward +Y for points ahead
pub fn rotate_vertically(matrix: &Matrix4<f64>, radians: f64) -> Matrix4<f64> {
    Matrix4::from_axis_angle(&Vector3::x_axis(), radians) * matrix
}

/// Build the placement of `target` relative to `origin`.
///
/// The surface distance is clamped to `max_anchor_distance` so distant
/// landmarks stay inside the tracking display radius. The translated point is
/// tilted by the elevation angle first, then swung to the bearing.
pub fn place(origin: &GeodeticPoint, target: &GeodeticPoint, max_anchor_distance: f64) -> Placement {
    let distance = surface_distance(origin, target);
    let clamped = distance.min(max_anchor_distance);

    let distance_transform = translating_identity(0.0, 0.0, -clamped);
    let rotation = bearing(origin, target);
    let tilt = angle_off_horizon(origin, target);

    let tilted = rotate_vertically(&distance_transform, tilt);
    let completed = rotate_horizontally(&tilted, -rotation);

    Placement {
        transform: PlacementTransform(completed),
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    const MAX_ANCHOR_DISTANCE: f64 = 80.0;

    #[test]
    fn test_bearing_due_north_is_zero() {
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(10.0, 0.0);
        assert_relative_eq!(bearing(&start, &end), 0.0, epsilon = 1e-9);

        let start = GeodeticPoint::new(49.3796, -123.0834);
        let end = GeodeticPoint::new(49.3806, -123.0834);
        assert_relative_eq!(bearing(&start, &end), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_due_east_is_quarter_turn() {
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(0.0, 10.0);
        assert_relative_eq!(bearing(&start, &end), FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_wraps_negative_angles_once() {
        // Due west comes out of atan2 as -π/2
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(0.0, -10.0);
        let angle = bearing(&start, &end);
        assert_relative_eq!(angle, 3.0 * FRAC_PI_2, epsilon = 1e-9);
        assert!(angle >= 0.0 && angle < 2.0 * PI);
    }

    #[test]
    fn test_bearing_reference_values() {
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(10.0, 10.0);
        assert_relative_eq!(bearing(&start, &end).to_degrees(), 44.561, epsilon = 0.01);

        let start = GeodeticPoint::new(49.37963, -123.08347);
        let end = GeodeticPoint::new(49.37937, -123.08137);
        assert_relative_eq!(bearing(&start, &end).to_degrees(), 100.767, epsilon = 0.01);
    }

    #[test]
    fn test_surface_distance_along_meridian() {
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(0.05, 0.0);
        let expected = EARTH_MEAN_RADIUS * 0.05_f64.to_radians();
        assert_relative_eq!(surface_distance(&start, &end), expected, epsilon = 1e-6);
        assert_relative_eq!(surface_distance(&start, &start), 0.0);
    }

    #[test]
    fn test_angle_off_horizon() {
        let start = GeodeticPoint::new(0.0, 0.0);
        let end = GeodeticPoint::new(0.05, 0.0).with_altitude(20.0);
        let expected = 20.0_f64.atan2(surface_distance(&start, &end));
        assert_relative_eq!(angle_off_horizon(&start, &end), expected, epsilon = 1e-12);
        assert!(angle_off_horizon(&start, &end) > 0.0);
    }

    #[test]
    fn test_angle_off_horizon_is_monotonic_in_altitude() {
        let start = GeodeticPoint::new(45.0, 7.0).with_altitude(100.0);
        let mut previous = f64::NEG_INFINITY;
        for altitude in [-500.0, -50.0, 0.0, 99.0, 100.0, 101.0, 250.0, 4000.0] {
            let end = GeodeticPoint::new(45.001, 7.0).with_altitude(altitude);
            let angle = angle_off_horizon(&start, &end);
            assert!(angle > previous, "angle must grow with altitude difference");
            previous = angle;
        }
    }

    #[test]
    fn test_distance_clamp_beyond_limit() {
        let origin = GeodeticPoint::new(40.7707, -111.8911);
        // Roughly 1.1 km north
        let target = GeodeticPoint::new(40.7807, -111.8911);
        let placement = place(&origin, &target, MAX_ANCHOR_DISTANCE);

        assert!(placement.distance > MAX_ANCHOR_DISTANCE);
        let translation = placement.transform.translation();
        assert_relative_eq!(translation.z.abs(), MAX_ANCHOR_DISTANCE, epsilon = 1e-9);
        assert_relative_eq!(translation.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(translation.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_within_limit_is_unclamped() {
        let origin = GeodeticPoint::new(40.7707, -111.8911);
        // Roughly 33 m north
        let target = GeodeticPoint::new(40.7710, -111.8911);
        let placement = place(&origin, &target, MAX_ANCHOR_DISTANCE);

        assert!(placement.distance < MAX_ANCHOR_DISTANCE);
        let translation = placement.transform.translation();
        assert_relative_eq!(translation.z, -placement.distance, epsilon = 1e-9);
    }

    #[test]
    fn test_east_target_lands_on_positive_x() {
        let origin = GeodeticPoint::new(0.0, 0.0);
        let target = GeodeticPoint::new(0.0, 0.0003);
        let placement = place(&origin, &target, MAX_ANCHOR_DISTANCE);
        let translation = placement.transform.translation();

        assert_relative_eq!(translation.x, placement.distance, epsilon = 1e-6);
        assert_relative_eq!(translation.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_elevated_target_lands_above_horizon() {
        let origin = GeodeticPoint::new(10.0, 10.0);
        let target = GeodeticPoint::new(10.0002, 10.0).with_altitude(15.0);
        let placement = place(&origin, &target, MAX_ANCHOR_DISTANCE);
        let translation = placement.transform.translation();

        let tilt = angle_off_horizon(&origin, &target);
        assert!(translation.y > 0.0);
        assert_relative_eq!(translation.y, placement.distance * tilt.sin(), epsilon = 1e-6);
        // Rotations preserve the clamped length
        assert_relative_eq!(translation.norm(), placement.distance, epsilon = 1e-6);
    }

    #[test]
    fn test_max_anchor_distance() {
        assert_eq!(max_anchor_distance(90.0, 10.0), 80.0);
        assert_eq!(max_anchor_distance(90.0, 30.0), 60.0);
    }
}
