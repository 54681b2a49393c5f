//! Vessels built from rapier bodies, and their view as a stabilizer host.
//!
//! A vessel is a root part plus any number of child parts, each its own
//! dynamic rigid body with one cuboid collider, welded to the root with fixed
//! joints. Wheel capabilities are plain data on the part record.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use stabilizer_core::{
    Part, PartBody, RayHit, ReferencePose, Situation, Stabilizer, StabilizerConfig, Vessel,
    WheelBrakes, WheelDeployment,
};

use crate::state::{
    from_isometry, from_na_vec, to_isometry, to_na_vec, vessel_groups, PhysicsState,
};

/// Stable identity of a vessel inside a [`VesselRegistry`](crate::VesselRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VesselId(pub u32);

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vessel#{}", self.0)
    }
}

/// Wheel brake state driven by the pilot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrakeState {
    pub input: f32,
}

impl WheelBrakes for BrakeState {
    fn brake_input(&self) -> f32 {
        self.input
    }
}

/// Landing-gear deployment state. `position == 1.0` is fully deployed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeploymentState {
    pub position: f32,
}

impl Default for DeploymentState {
    fn default() -> Self {
        Self { position: 1.0 }
    }
}

impl WheelDeployment for DeploymentState {
    fn position(&self) -> f32 {
        self.position
    }
}

/// Optional behaviour modules attached to a part.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartCapabilities {
    pub brakes: Option<BrakeState>,
    pub deployment: Option<DeploymentState>,
    /// Part moves under its own actuators and must not be put to sleep.
    pub exempt: bool,
}

impl PartCapabilities {
    /// Braked landing gear, fully deployed.
    pub fn landing_gear(brake_input: f32) -> Self {
        Self {
            brakes: Some(BrakeState { input: brake_input }),
            deployment: Some(DeploymentState::default()),
            exempt: false,
        }
    }

    /// Fixed wheel with brakes but no retraction mechanism.
    pub fn wheel(brake_input: f32) -> Self {
        Self {
            brakes: Some(BrakeState { input: brake_input }),
            ..Default::default()
        }
    }
}

/// Description of one part to spawn.
#[derive(Debug, Clone)]
pub struct PartBlueprint {
    pub name: String,
    /// Offset from the root part, in the vessel's frame.
    pub offset: Vec3,
    pub half_extents: Vec3,
    pub density: f32,
    pub capabilities: PartCapabilities,
}

impl PartBlueprint {
    pub fn new(name: impl Into<String>, offset: Vec3, half_extents: Vec3) -> Self {
        Self {
            name: name.into(),
            offset,
            half_extents,
            density: 1.0,
            capabilities: PartCapabilities::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: PartCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Description of a whole vessel. The first part is the root.
#[derive(Debug, Clone)]
pub struct VesselBlueprint {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub parts: Vec<PartBlueprint>,
}

impl VesselBlueprint {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            rotation: Quat::IDENTITY,
            parts: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_part(mut self, part: PartBlueprint) -> Self {
        self.parts.push(part);
        self
    }

    /// A small rover: hull on four braked wheels.
    pub fn rover(name: impl Into<String>, position: Vec3, brake_input: f32) -> Self {
        let hull = PartBlueprint::new("hull", Vec3::ZERO, Vec3::new(1.0, 0.25, 0.6));
        let mut blueprint = Self::new(name, position).with_part(hull);
        for (x, z) in [(-0.8, -0.75), (0.8, -0.75), (-0.8, 0.75), (0.8, 0.75)] {
            let wheel = PartBlueprint::new("wheel", Vec3::new(x, -0.4, z), Vec3::splat(0.15))
                .with_capabilities(PartCapabilities::wheel(brake_input));
            blueprint = blueprint.with_part(wheel);
        }
        blueprint
    }

    /// A lander: body on three landing legs.
    pub fn lander(name: impl Into<String>, position: Vec3, brake_input: f32) -> Self {
        let body = PartBlueprint::new("pod", Vec3::ZERO, Vec3::new(0.6, 0.5, 0.6));
        let mut blueprint = Self::new(name, position).with_part(body);
        for (x, z) in [(0.0, 0.8), (0.7, -0.4), (-0.7, -0.4)] {
            let leg = PartBlueprint::new("gear", Vec3::new(x, -0.75, z), Vec3::new(0.1, 0.25, 0.1))
                .with_capabilities(PartCapabilities::landing_gear(brake_input));
            blueprint = blueprint.with_part(leg);
        }
        blueprint
    }
}

/// A spawned part.
#[derive(Debug, Clone)]
pub struct PartRecord {
    pub name: String,
    pub body: rapier::RigidBodyHandle,
    pub collider: rapier::ColliderHandle,
    pub capabilities: PartCapabilities,
    /// Refreshed from the narrow phase after every step.
    pub ground_contact: bool,
}

impl Part for PartRecord {
    fn has_ground_contact(&self) -> bool {
        self.ground_contact
    }

    fn braking(&self) -> Option<&dyn WheelBrakes> {
        self.capabilities
            .brakes
            .as_ref()
            .map(|b| b as &dyn WheelBrakes)
    }

    fn deployment(&self) -> Option<&dyn WheelDeployment> {
        self.capabilities
            .deployment
            .as_ref()
            .map(|d| d as &dyn WheelDeployment)
    }

    fn is_stabilization_exempt(&self) -> bool {
        self.capabilities.exempt
    }
}

/// A spawned vessel and the stabilizer attached to it.
#[derive(Debug, Clone)]
pub struct VesselRecord {
    pub id: VesselId,
    pub name: String,
    pub parts: Vec<PartRecord>,
    pub joints: Vec<rapier::ImpulseJointHandle>,
    /// Bodies are being integrated (off rails).
    pub off_rails: bool,
    /// Still on the launch site; reported as prelaunch while grounded.
    pub prelaunch: bool,
    pub situation: Situation,
    pub surface_speed: f32,
    pub stabilizer: Stabilizer,
}

impl VesselRecord {
    /// Build bodies, colliders and joints for `blueprint`. Bodies start on rails.
    pub fn spawn(
        id: VesselId,
        blueprint: &VesselBlueprint,
        physics: &mut PhysicsState,
        config: StabilizerConfig,
    ) -> Self {
        let mut parts = Vec::with_capacity(blueprint.parts.len());
        let mut joints = Vec::new();

        for part in &blueprint.parts {
            let position = blueprint.position + blueprint.rotation * part.offset;
            let body = rapier::RigidBodyBuilder::fixed()
                .position(to_isometry(position, blueprint.rotation))
                .build();
            let body = physics.rigid_body_set.insert(body);

            let he = part.half_extents;
            let collider = rapier::ColliderBuilder::cuboid(he.x, he.y, he.z)
                .density(part.density)
                .friction(1.0)
                .collision_groups(vessel_groups())
                .build();
            let collider =
                physics
                    .collider_set
                    .insert_with_parent(collider, body, &mut physics.rigid_body_set);

            if let Some(root) = parts.first().map(|p: &PartRecord| p.body) {
                let local = part.offset;
                let joint = rapier::FixedJointBuilder::new()
                    .local_anchor1(rapier::nalgebra::Point3::new(local.x, local.y, local.z))
                    .contacts_enabled(false);
                joints.push(physics.impulse_joint_set.insert(root, body, joint, false));
            }

            parts.push(PartRecord {
                name: part.name.clone(),
                body,
                collider,
                capabilities: part.capabilities,
                ground_contact: false,
            });
        }
        physics.refresh_queries();

        Self {
            id,
            name: blueprint.name.clone(),
            parts,
            joints,
            off_rails: false,
            prelaunch: true,
            situation: Situation::Prelaunch,
            surface_speed: 0.0,
            stabilizer: Stabilizer::new(config),
        }
    }

    pub fn root(&self) -> Option<&PartRecord> {
        self.parts.first()
    }

    /// Switch every body between dynamic (off rails) and fixed (on rails).
    ///
    /// Bodies are never disabled: disabling colliders that were repositioned
    /// by a freeze in the same frame makes rapier's broad phase delete their
    /// proxies twice and panic on the next step. Fixed bodies keep their
    /// proxies, stop integrating and read zero velocity.
    pub fn set_bodies_simulated(&self, physics: &mut PhysicsState, simulated: bool) {
        let body_type = if simulated {
            rapier::RigidBodyType::Dynamic
        } else {
            rapier::RigidBodyType::Fixed
        };
        for part in &self.parts {
            if let Some(body) = physics.rigid_body_set.get_mut(part.body) {
                body.set_linvel(to_na_vec(Vec3::ZERO), false);
                body.set_angvel(to_na_vec(Vec3::ZERO), false);
                body.set_body_type(body_type, simulated);
            }
        }
    }

    /// Recompute contact flags, situation and surface speed from the simulation.
    ///
    /// On rails nothing is integrated, so the last situation is kept.
    pub fn refresh(&mut self, physics: &PhysicsState) {
        if !self.off_rails {
            for part in &mut self.parts {
                part.ground_contact = false;
            }
            self.surface_speed = 0.0;
            return;
        }

        let mut any_contact = false;
        for part in &mut self.parts {
            part.ground_contact = physics.touches_scenery(part.collider);
            any_contact |= part.ground_contact;
        }

        let (mut momentum, mut mass) = (Vec3::ZERO, 0.0);
        for part in &self.parts {
            if let Some(body) = physics.rigid_body_set.get(part.body) {
                momentum += from_na_vec(body.linvel()) * body.mass();
                mass += body.mass();
            }
        }
        self.surface_speed = if mass > 0.0 {
            (momentum / mass).length()
        } else {
            0.0
        };

        self.situation = match (any_contact, self.prelaunch) {
            (true, true) => Situation::Prelaunch,
            (true, false) => Situation::Landed,
            (false, _) => Situation::Flying,
        };
    }

    /// Borrow this vessel together with the physics world it lives in.
    pub fn view<'a>(&'a mut self, physics: &'a mut PhysicsState) -> RapierVessel<'a> {
        RapierVessel {
            record: self,
            physics,
        }
    }

    /// Run `f` with this vessel's stabilizer and a host view of the vessel.
    ///
    /// The stabilizer lives inside the record, so it is taken out for the
    /// duration of the call while the view borrows everything else.
    pub fn with_stabilizer<R>(
        &mut self,
        physics: &mut PhysicsState,
        f: impl FnOnce(&mut Stabilizer, &mut RapierVessel<'_>) -> R,
    ) -> R {
        let mut stabilizer = std::mem::take(&mut self.stabilizer);
        let result = f(&mut stabilizer, &mut self.view(physics));
        self.stabilizer = stabilizer;
        result
    }
}

/// A rapier rigid body seen through the stabilizer's [`PartBody`] interface.
pub struct RapierBody<'a>(pub &'a mut rapier::RigidBody);

impl PartBody for RapierBody<'_> {
    fn linear_velocity(&self) -> Vec3 {
        from_na_vec(self.0.linvel())
    }

    fn angular_velocity(&self) -> Vec3 {
        from_na_vec(self.0.angvel())
    }

    fn set_velocities(&mut self, linear: Vec3, angular: Vec3) {
        self.0.set_linvel(to_na_vec(linear), false);
        self.0.set_angvel(to_na_vec(angular), false);
    }

    fn sleep(&mut self) {
        self.0.sleep();
    }

    fn is_sleeping(&self) -> bool {
        self.0.is_sleeping()
    }
}

/// One vessel plus the physics world, implementing the stabilizer host traits.
pub struct RapierVessel<'a> {
    record: &'a mut VesselRecord,
    physics: &'a mut PhysicsState,
}

impl Vessel for RapierVessel<'_> {
    type Part = PartRecord;
    type Body<'b>
        = RapierBody<'b>
    where
        Self: 'b;

    fn name(&self) -> &str {
        &self.record.name
    }

    fn is_loaded(&self) -> bool {
        true
    }

    fn situation(&self) -> Situation {
        self.record.situation
    }

    fn surface_speed(&self) -> f32 {
        self.record.surface_speed
    }

    fn center_of_mass(&self) -> Vec3 {
        let (mut weighted, mut mass) = (Vec3::ZERO, 0.0);
        for part in &self.record.parts {
            if let Some(body) = self.physics.rigid_body_set.get(part.body) {
                let com = body.center_of_mass();
                weighted += Vec3::new(com.x, com.y, com.z) * body.mass();
                mass += body.mass();
            }
        }
        if mass > 0.0 {
            weighted / mass
        } else {
            self.root_pose().position
        }
    }

    fn supporting_body_center(&self) -> Vec3 {
        self.physics.supporting_body_center
    }

    fn root_pose(&self) -> ReferencePose {
        self.record
            .root()
            .and_then(|root| self.physics.rigid_body_set.get(root.body))
            .map(|body| {
                let (position, orientation) = from_isometry(body.position());
                ReferencePose::new(position, orientation)
            })
            .unwrap_or_default()
    }

    fn set_pose(&mut self, pose: &ReferencePose) {
        let Some(root) = self.record.root().map(|p| p.body) else {
            return;
        };
        let Some(current) = self.physics.rigid_body_set.get(root).map(|b| *b.position()) else {
            return;
        };

        // Rigid transform taking the root from where it is to where it should be.
        let delta = to_isometry(pose.position, pose.orientation) * current.inverse();
        for part in &self.record.parts {
            if let Some(body) = self.physics.rigid_body_set.get_mut(part.body) {
                let moved = delta * body.position();
                body.set_position(moved, false);
            }
        }
        // Root lands exactly on the pose regardless of accumulated rounding.
        if let Some(body) = self.physics.rigid_body_set.get_mut(root) {
            body.set_position(to_isometry(pose.position, pose.orientation), false);
        }
    }

    fn parts(&self) -> &[PartRecord] {
        &self.record.parts
    }

    fn part_body_mut(&mut self, index: usize) -> Option<RapierBody<'_>> {
        let handle = self.record.parts.get(index)?.body;
        let body = self.physics.rigid_body_set.get_mut(handle)?;
        if !body.is_dynamic() {
            return None;
        }
        Some(RapierBody(body))
    }

    fn raycast_scenery(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.physics.cast_scenery_ray(origin, direction)
    }
}
