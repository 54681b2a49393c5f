//! Rest stabilization for multi-part vessels in a fixed-timestep physics host.
//!
//! Resting bodies in a discrete simulation never quite stop: contacts jitter,
//! joints creep, and a vessel parked on the ground slowly drifts. This crate
//! decides, every physics tick, whether a vessel should be left alone, damped
//! to sleep, or frozen back to the pose it had when the simulation resumed.
//!
//! The crate is host-agnostic. Hosts implement the traits in [`host`] and call
//! the two hook points on [`Stabilizer`]:
//! - `physics_tick` from the fixed-timestep callback
//! - `late_tick` once per frame, after everything that might wake bodies
//!
//! Lifecycle events arrive through [`LifecycleListener`].

pub mod actuator;
pub mod config;
pub mod contact;
pub mod diagnostics;
pub mod host;
pub mod rest;
pub mod slope;
pub mod stabilizer;

#[cfg(test)]
mod testing;

pub use actuator::{damp, freeze};
pub use config::StabilizerConfig;
pub use contact::{has_real_ground_contact, is_real_contact, GEAR_DEPLOYED_THRESHOLD};
pub use diagnostics::StabilizerDiagnostics;
pub use host::{
    LifecycleListener, Part, PartBody, RayHit, ReferencePose, Situation, Vessel, WheelBrakes,
    WheelDeployment,
};
pub use rest::{RestDetector, RestState};
pub use slope::{compute_slope, slope_angle_degrees, SlopeVerdict};
pub use stabilizer::{FreezeCounter, Stabilizer, StabilizerState};
