//! rapier3d world owned as a bevy resource, plus scenery queries.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use stabilizer_core::RayHit;

/// Collision group of static local scenery (terrain, runways, buildings).
///
/// Slope raycasts only see colliders in this group.
pub const LOCAL_SCENERY_GROUP: rapier::Group = rapier::Group::GROUP_16;

/// Collision group of vessel parts.
pub const VESSEL_GROUP: rapier::Group = rapier::Group::GROUP_1;

/// Radius of the default supporting body. Its center sits this far below the origin.
pub const DEFAULT_BODY_RADIUS: f32 = 600_000.0;

#[derive(Resource)]
pub struct PhysicsState {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    pub query_pipeline: rapier::QueryPipeline,
    /// Center of the planet-like body everything rests on. Local down points here.
    pub supporting_body_center: Vec3,
}

impl PhysicsState {
    pub fn new() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: rapier::IntegrationParameters::default(),
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            supporting_body_center: Vec3::new(0.0, -DEFAULT_BODY_RADIUS, 0.0),
        }
    }

    /// Advance the simulation by one fixed step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Rebuild the query acceleration structure after colliders move outside a step.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Number of dynamic bodies currently awake. Vessels on rails are fixed.
    pub fn awake_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic() && !body.is_sleeping())
            .count()
    }

    /// Add a static scenery box.
    pub fn spawn_scenery_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
    ) -> rapier::ColliderHandle {
        let collider = rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(to_isometry(center, rotation))
            .collision_groups(scenery_groups())
            .friction(1.0)
            .build();
        let handle = self.collider_set.insert(collider);
        self.refresh_queries();
        handle
    }

    /// Add a flat slab tilted `degrees` about the Z axis, top face through `top_center`.
    pub fn spawn_scenery_slope(
        &mut self,
        top_center: Vec3,
        half_size: f32,
        degrees: f32,
    ) -> rapier::ColliderHandle {
        const HALF_THICKNESS: f32 = 0.5;
        let rotation = Quat::from_rotation_z(degrees.to_radians());
        let center = top_center - rotation * Vec3::new(0.0, HALF_THICKNESS, 0.0);
        self.spawn_scenery_box(
            center,
            Vec3::new(half_size, HALF_THICKNESS, half_size),
            rotation,
        )
    }

    /// Cast a ray against local scenery only.
    pub fn cast_scenery_ray(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let ray = rapier::Ray::new(Point3::new(origin.x, origin.y, origin.z), to_na_vec(direction));
        let filter = rapier::QueryFilter::new().groups(rapier::InteractionGroups::new(
            rapier::Group::ALL,
            LOCAL_SCENERY_GROUP,
        ));
        let (_, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            f32::MAX,
            true,
            filter,
        )?;
        let point = ray.point_at(hit.time_of_impact);
        Some(RayHit {
            point: Vec3::new(point.x, point.y, point.z),
            normal: from_na_vec(&hit.normal),
        })
    }

    /// Whether `collider` has an active contact with any scenery collider.
    pub fn touches_scenery(&self, collider: rapier::ColliderHandle) -> bool {
        self.narrow_phase.contact_pairs_with(collider).any(|pair| {
            if !pair.has_any_active_contact {
                return false;
            }
            let other = if pair.collider1 == collider {
                pair.collider2
            } else {
                pair.collider1
            };
            self.collider_set
                .get(other)
                .is_some_and(|c| c.collision_groups().memberships.contains(LOCAL_SCENERY_GROUP))
        })
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Scenery is hit by everything.
pub fn scenery_groups() -> rapier::InteractionGroups {
    rapier::InteractionGroups::new(LOCAL_SCENERY_GROUP, rapier::Group::ALL)
}

pub fn vessel_groups() -> rapier::InteractionGroups {
    rapier::InteractionGroups::new(VESSEL_GROUP, rapier::Group::ALL)
}

// ============================================================================
// bevy <-> nalgebra conversions
// ============================================================================

pub fn to_na_vec(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn from_na_vec(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_na_quat(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn from_na_quat(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        to_na_quat(rotation),
    )
}

pub fn from_isometry(iso: &Isometry3<f32>) -> (Vec3, Quat) {
    (from_na_vec(&iso.translation.vector), from_na_quat(&iso.rotation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quat_conversion_round_trip() {
        let q = Quat::from_euler(EulerRot::XYZ, 0.3, -1.2, 0.7);
        let back = from_na_quat(&to_na_quat(q));
        assert!(q.abs_diff_eq(back, 1e-6), "{q:?} vs {back:?}");
    }

    #[test]
    fn test_isometry_round_trip() {
        let position = Vec3::new(1.0, -2.0, 3.5);
        let rotation = Quat::from_rotation_y(0.4);
        let (p, r) = from_isometry(&to_isometry(position, rotation));
        assert!(p.abs_diff_eq(position, 1e-6));
        assert!(r.abs_diff_eq(rotation, 1e-6));
    }

    #[test]
    fn test_ray_hits_flat_scenery() {
        let mut physics = PhysicsState::new();
        physics.spawn_scenery_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 10.0), Quat::IDENTITY);

        let hit = physics
            .cast_scenery_ray(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y)
            .expect("ray should hit the ground");

        assert!((hit.point.y - 0.0).abs() < 1e-4, "hit at {:?}", hit.point);
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-4), "normal {:?}", hit.normal);
    }

    #[test]
    fn test_ray_reports_slope_normal() {
        let mut physics = PhysicsState::new();
        physics.spawn_scenery_slope(Vec3::ZERO, 10.0, 40.0);

        let hit = physics
            .cast_scenery_ray(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y)
            .expect("ray should hit the slope");

        let angle = hit.normal.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 40.0).abs() < 0.1, "slope normal at {angle} degrees");
    }

    #[test]
    fn test_ray_ignores_non_scenery() {
        let mut physics = PhysicsState::new();
        let body = physics
            .rigid_body_set
            .insert(rapier::RigidBodyBuilder::fixed().translation(Vector3::new(0.0, 0.0, 0.0)));
        let collider = rapier::ColliderBuilder::cuboid(5.0, 0.5, 5.0).collision_groups(vessel_groups());
        physics
            .collider_set
            .insert_with_parent(collider, body, &mut physics.rigid_body_set);
        physics.refresh_queries();

        assert!(physics.cast_scenery_ray(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y).is_none());
    }
}
