//! Orbit camera that follows one vessel's root part.
//!
//! - Left mouse drag: orbit (azimuth and elevation)
//! - Scroll wheel: zoom
//! - Tab: follow the next vessel

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use stabilizer_physics::{state, PhysicsState, VesselId, VesselRegistry};

#[derive(Component)]
pub struct ChaseCamera {
    /// Vessel being followed. `None` until the first vessel exists.
    pub vessel: Option<VesselId>,
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians), clamped to avoid gimbal lock
    pub elevation: f32,
    pub sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl Default for ChaseCamera {
    fn default() -> Self {
        Self {
            vessel: None,
            distance: 10.0,
            azimuth: 0.0,
            elevation: 0.5, // ~30 degrees
            sensitivity: 0.005,
            zoom_sensitivity: 1.0,
        }
    }
}

impl ChaseCamera {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            ..default()
        }
    }

    pub fn offset(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        Vec3::new(x, y, z)
    }
}

/// Pick the vessel after `current`, wrapping around.
fn next_vessel(registry: &VesselRegistry, current: Option<VesselId>) -> Option<VesselId> {
    let mut ids = registry.ids();
    match current {
        None => ids.next(),
        Some(current) => registry
            .ids()
            .find(|&id| id > current)
            .or_else(|| ids.next()),
    }
}

fn chase_camera_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    registry: Res<VesselRegistry>,
    physics: Res<PhysicsState>,
    mut query: Query<(&mut ChaseCamera, &mut Transform)>,
) {
    for (mut chase, mut transform) in query.iter_mut() {
        let lost = chase.vessel.is_none_or(|id| registry.get(id).is_none());
        if lost || keyboard.just_pressed(KeyCode::Tab) {
            chase.vessel = next_vessel(&registry, chase.vessel);
            if let Some(record) = chase.vessel.and_then(|id| registry.get(id)) {
                info!("Following {}", record.name);
            }
        }

        if mouse_button.pressed(MouseButton::Left) {
            let delta = mouse_motion.delta;
            chase.azimuth -= delta.x * chase.sensitivity;
            chase.elevation += delta.y * chase.sensitivity;
            chase.elevation = chase.elevation.clamp(-1.4, 1.4); // ~80 degrees
        }

        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            chase.distance -= scroll * chase.zoom_sensitivity;
            chase.distance = chase.distance.clamp(2.0, 100.0);
        }

        let target = chase
            .vessel
            .and_then(|id| registry.get(id))
            .and_then(|record| record.root())
            .and_then(|root| physics.rigid_body_set.get(root.body))
            .map(|body| state::from_isometry(body.position()).0)
            .unwrap_or(Vec3::ZERO);

        transform.translation = target + chase.offset();
        transform.look_at(target, Vec3::Y);
    }
}

pub struct ChaseCameraPlugin;

impl Plugin for ChaseCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, chase_camera_system);
    }
}

#[derive(Bundle, Default)]
pub struct ChaseCameraBundle {
    pub camera: Camera3d,
    pub chase: ChaseCamera,
    pub transform: Transform,
}

impl ChaseCameraBundle {
    pub fn new(distance: f32) -> Self {
        let chase = ChaseCamera::new(distance);
        Self {
            camera: Camera3d::default(),
            transform: Transform::from_translation(chase.offset()).looking_at(Vec3::ZERO, Vec3::Y),
            chase,
        }
    }
}
