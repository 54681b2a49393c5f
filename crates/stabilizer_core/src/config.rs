//! Tunable thresholds for rest detection and stabilization.

use bevy::prelude::*;

/// Configuration for the rest stabilizer.
///
/// Each vessel's [`Stabilizer`](crate::Stabilizer) keeps its own copy, taken
/// when the vessel is attached.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StabilizerConfig {
    /// Surface speed (units/sec) at or below which a grounded vessel may rest
    pub rest_velocity_threshold: f32,
    /// Surface slope (degrees) above which a vessel is left alone to slide
    pub slope_angle_threshold: f32,
    /// Filter wheel contacts by brake input and gear deployment
    pub account_for_brakes: bool,
    /// Physics ticks to hold the reference pose after the simulation resumes
    pub freeze_frames: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            rest_velocity_threshold: 0.05,
            slope_angle_threshold: 30.0,
            account_for_brakes: true,
            freeze_frames: 20,
        }
    }
}

impl StabilizerConfig {
    pub fn with_rest_velocity_threshold(mut self, threshold: f32) -> Self {
        self.rest_velocity_threshold = threshold;
        self
    }

    pub fn with_slope_angle_threshold(mut self, degrees: f32) -> Self {
        self.slope_angle_threshold = degrees;
        self
    }

    pub fn with_account_for_brakes(mut self, enabled: bool) -> Self {
        self.account_for_brakes = enabled;
        self
    }

    pub fn with_freeze_frames(mut self, ticks: u32) -> Self {
        self.freeze_frames = ticks;
        self
    }
}
