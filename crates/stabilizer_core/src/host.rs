//! Narrow interfaces the stabilizer consumes from its host simulation.
//!
//! The stabilizer never owns physics state. Everything it reads (situation,
//! surface speed, contact flags, part capabilities) and everything it writes
//! (pose, velocities, sleep state) goes through the traits in this module, so
//! any engine that can answer these questions can be stabilized:
//!
//! - [`Vessel`] - the composite object: aggregate state, parts, world queries
//! - [`Part`] - per-part contact flag and typed capability lookups
//! - [`PartBody`] - the writable rigid body behind a part
//! - [`WheelBrakes`] / [`WheelDeployment`] - optional wheel capabilities

use bevy::math::{Quat, Vec3};

/// Coarse flight situation reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Situation {
    /// Sitting on the launch site, not yet launched.
    Prelaunch,
    /// Touching the surface of the supporting body.
    Landed,
    /// Floating on a liquid surface.
    Splashed,
    /// Airborne inside the atmosphere.
    #[default]
    Flying,
    /// Anywhere else (orbit, escape, sub-orbital).
    InSpace,
}

impl Situation {
    /// Whether the vessel is resting on solid ground.
    pub fn is_grounded(self) -> bool {
        matches!(self, Situation::Landed | Situation::Prelaunch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Situation::Prelaunch => "PRELAUNCH",
            Situation::Landed => "LANDED",
            Situation::Splashed => "SPLASHED",
            Situation::Flying => "FLYING",
            Situation::InSpace => "IN_SPACE",
        }
    }
}

impl std::fmt::Display for Situation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and orientation the vessel is frozen back to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl ReferencePose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for ReferencePose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Result of a world-geometry ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point.
    pub point: Vec3,
    /// Surface normal at the hit point (not necessarily normalized).
    pub normal: Vec3,
}

/// Braking module attached to a wheel part.
pub trait WheelBrakes {
    /// Current brake input in `[0, 1]`. Zero means the brakes are released.
    fn brake_input(&self) -> f32;
}

/// Landing-gear deployment module.
pub trait WheelDeployment {
    /// Deployment extent in `[0, 1]`. One means fully deployed.
    fn position(&self) -> f32;
}

/// One rigid sub-body of a vessel, as seen for read-only queries.
pub trait Part {
    /// Raw host flag: the part's collider touches supporting geometry.
    fn has_ground_contact(&self) -> bool;

    fn braking(&self) -> Option<&dyn WheelBrakes> {
        None
    }

    fn deployment(&self) -> Option<&dyn WheelDeployment> {
        None
    }

    /// Parts driven by their own actuators (robotics, hinges) opt out of damping.
    fn is_stabilization_exempt(&self) -> bool {
        false
    }
}

/// Writable rigid body behind a part.
pub trait PartBody {
    fn linear_velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;
    fn set_velocities(&mut self, linear: Vec3, angular: Vec3);
    /// Deactivate the body until something wakes it.
    fn sleep(&mut self);
    fn is_sleeping(&self) -> bool;
}

impl<T: PartBody + ?Sized> PartBody for &mut T {
    fn linear_velocity(&self) -> Vec3 {
        (**self).linear_velocity()
    }

    fn angular_velocity(&self) -> Vec3 {
        (**self).angular_velocity()
    }

    fn set_velocities(&mut self, linear: Vec3, angular: Vec3) {
        (**self).set_velocities(linear, angular)
    }

    fn sleep(&mut self) {
        (**self).sleep()
    }

    fn is_sleeping(&self) -> bool {
        (**self).is_sleeping()
    }
}

/// The composite object under stabilization.
pub trait Vessel {
    type Part: Part;

    /// Mutable handle to one part's rigid body, borrowed from the vessel.
    type Body<'a>: PartBody
    where
        Self: 'a;

    fn name(&self) -> &str;

    /// Whether the vessel is loaded into the active physics scene.
    fn is_loaded(&self) -> bool;

    fn situation(&self) -> Situation;

    /// Speed relative to the supporting surface.
    fn surface_speed(&self) -> f32;

    fn center_of_mass(&self) -> Vec3;

    /// Center of the body the vessel rests on. Local down points at it.
    fn supporting_body_center(&self) -> Vec3;

    /// Current transform of the root part.
    fn root_pose(&self) -> ReferencePose;

    /// Move the whole vessel rigidly so its root part lands on `pose`.
    fn set_pose(&mut self, pose: &ReferencePose);

    fn parts(&self) -> &[Self::Part];

    /// Rigid body of the part at `index`, or `None` if it has no active body.
    fn part_body_mut(&mut self, index: usize) -> Option<Self::Body<'_>>;

    /// Cast a ray against static local scenery only. Other vessels are ignored.
    fn raycast_scenery(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;
}

/// Lifecycle callbacks delivered by the host's scene manager.
///
/// Hosts call these synchronously on the simulation thread, before the next
/// tick is processed.
pub trait LifecycleListener<V: Vessel> {
    /// The host started integrating the vessel's rigid bodies.
    fn on_simulation_activated(&mut self, vessel: &V);
    /// The host put the vessel back on rails.
    fn on_simulation_deactivated(&mut self, vessel: &V);
    /// The vessel is about to be removed from the scene.
    fn on_will_destroy(&mut self, vessel: &V);
    /// The host's scene finished loading.
    fn on_host_ready(&mut self, vessel: &V);
}
