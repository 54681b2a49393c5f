//! Slope classification of the surface under a vessel.
//!
//! A ray is cast from the vessel's center of mass toward the center of the
//! body it rests on, against static scenery only. The slope is the angle
//! between local up and the surface normal at the hit point.
//!
//! The query never fails: a miss yields [`SlopeVerdict::no_hit`], which is
//! treated as flat ground so stabilization stays possible.

use bevy::math::Vec3;

use crate::host::Vessel;

/// Outcome of one slope query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeVerdict {
    /// Angle exceeds the configured threshold
    pub is_sloped: bool,
    /// Angle between local up and the surface normal, in degrees
    pub angle_degrees: f32,
    /// Whether the ray found any scenery
    pub hit: bool,
}

impl SlopeVerdict {
    /// Nothing under the vessel. Assumed flat.
    pub fn no_hit() -> Self {
        Self {
            is_sloped: false,
            angle_degrees: 0.0,
            hit: false,
        }
    }

    pub fn from_angle(angle_degrees: f32, threshold_degrees: f32) -> Self {
        Self {
            is_sloped: angle_degrees > threshold_degrees,
            angle_degrees,
            hit: true,
        }
    }
}

/// Angle in degrees between `up` and a surface `normal`.
///
/// Returns 0 for degenerate input so a bad normal never reads as a cliff.
pub fn slope_angle_degrees(up: Vec3, normal: Vec3) -> f32 {
    let up = up.normalize_or_zero();
    let normal = normal.normalize_or_zero();
    if up == Vec3::ZERO || normal == Vec3::ZERO {
        return 0.0;
    }
    up.angle_between(normal).to_degrees()
}

/// Classify the surface directly beneath `vessel`.
pub fn compute_slope<V: Vessel>(vessel: &V, threshold_degrees: f32) -> SlopeVerdict {
    let com = vessel.center_of_mass();
    let down = (vessel.supporting_body_center() - com).normalize_or_zero();
    if down == Vec3::ZERO {
        return SlopeVerdict::no_hit();
    }

    match vessel.raycast_scenery(com, down) {
        Some(hit) => {
            let angle = slope_angle_degrees(-down, hit.normal);
            SlopeVerdict::from_angle(angle, threshold_degrees)
        }
        None => SlopeVerdict::no_hit(),
    }
}
