//! Rest detection: is the vessel sitting still on flat enough ground?
//!
//! The checks run cheapest first. Situation and surface speed are plain reads;
//! the slope needs a world raycast, so its verdict is cached for as long as the
//! vessel stays at rest and only recomputed after the cache is invalidated.

use crate::host::Vessel;
use crate::slope::{compute_slope, SlopeVerdict};

/// Rest classification of the last physics tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestState {
    /// No tick evaluated since arming.
    #[default]
    Unknown,
    AtRest,
    Moving,
}

/// Stateful rest detector owning the slope cache.
#[derive(Debug, Clone, Default)]
pub struct RestDetector {
    cached_slope: Option<SlopeVerdict>,
    on_a_slope: bool,
    last_slope_angle: f32,
}

impl RestDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grounded, slow and on ground no steeper than `slope_angle_threshold`.
    ///
    /// A sloped verdict is not cached, so a vessel resting on a slope is
    /// re-queried every tick until it leaves the slope or starts moving.
    pub fn is_at_rest<V: Vessel>(
        &mut self,
        vessel: &V,
        rest_velocity_threshold: f32,
        slope_angle_threshold: f32,
    ) -> bool {
        if !vessel.situation().is_grounded() {
            return false;
        }
        if vessel.surface_speed() > rest_velocity_threshold {
            return false;
        }

        if self.cached_slope.is_none() {
            let verdict = compute_slope(vessel, slope_angle_threshold);
            self.last_slope_angle = verdict.angle_degrees;
            self.on_a_slope = verdict.is_sloped;
            if verdict.is_sloped {
                return false;
            }
            self.cached_slope = Some(verdict);
        }

        true
    }

    /// Drop the cached slope verdict; the next rest check queries again.
    pub fn invalidate(&mut self) {
        self.cached_slope = None;
    }

    /// Forget everything, including the on-a-slope flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn slope_cached(&self) -> bool {
        self.cached_slope.is_some()
    }

    pub fn cached_slope(&self) -> Option<&SlopeVerdict> {
        self.cached_slope.as_ref()
    }

    pub fn on_a_slope(&self) -> bool {
        self.on_a_slope
    }

    /// Angle measured by the most recent slope query, in degrees.
    pub fn last_slope_angle(&self) -> f32 {
        self.last_slope_angle
    }
}
