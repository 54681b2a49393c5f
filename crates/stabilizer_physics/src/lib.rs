//! rapier3d host for `stabilizer_core`, wired into bevy.
//!
//! `StabilizerPlugin` owns a raw rapier world ([`PhysicsState`]) and a
//! [`VesselRegistry`]. Every fixed update it applies queued lifecycle
//! messages, steps the world, refreshes vessel state from the narrow phase and
//! runs each stabilizer's physics tick. The late tick runs in `PostUpdate`,
//! after gameplay systems had their chance to wake bodies.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use stabilizer_core::StabilizerConfig;

pub mod registry;
pub mod state;
pub mod vessel;

pub use registry::{HostError, HostResult, VesselRegistry};
pub use state::{PhysicsState, DEFAULT_BODY_RADIUS, LOCAL_SCENERY_GROUP, VESSEL_GROUP};
pub use vessel::{
    BrakeState, DeploymentState, PartBlueprint, PartCapabilities, PartRecord, RapierBody,
    RapierVessel, VesselBlueprint, VesselId, VesselRecord,
};

pub struct StabilizerPlugin;

impl Plugin for StabilizerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsState>()
            .init_resource::<VesselRegistry>()
            .init_resource::<StabilizerConfig>()
            .add_message::<VesselLifecycle>()
            .add_message::<DumpStabilizerDiagnostics>()
            .configure_sets(
                FixedUpdate,
                (StabilizerSet::Lifecycle, StabilizerSet::Simulate).chain(),
            )
            .add_systems(
                FixedUpdate,
                apply_lifecycle.in_set(StabilizerSet::Lifecycle),
            )
            .add_systems(
                FixedUpdate,
                (step_physics, refresh_vessels, physics_tick)
                    .chain()
                    .in_set(StabilizerSet::Simulate),
            )
            .add_systems(
                PostUpdate,
                (late_tick, sync_transforms)
                    .chain()
                    .in_set(StabilizerSet::LateTick),
            )
            .add_systems(Update, (request_diagnostics_dump, dump_diagnostics).chain());
    }
}

/// Ordering anchors for systems that interact with the stabilizer.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum StabilizerSet {
    /// Lifecycle messages applied to the registry (`FixedUpdate`)
    Lifecycle,
    /// Step, refresh and physics tick (`FixedUpdate`)
    Simulate,
    /// Late tick and transform sync (`PostUpdate`)
    LateTick,
}

/// Scene-manager events for one vessel, or for the whole scene.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VesselLifecycle {
    GoOffRails(VesselId),
    GoOnRails(VesselId),
    Destroy(VesselId),
    Launch(VesselId),
    HostReady,
}

/// Request to log every vessel's stabilizer diagnostics.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct DumpStabilizerDiagnostics;

/// Links a Bevy entity to the rapier body of one vessel part
#[derive(Component, Debug, Clone, Copy)]
pub struct PartLink(pub rapier::RigidBodyHandle);

fn apply_lifecycle(
    mut messages: MessageReader<VesselLifecycle>,
    mut registry: ResMut<VesselRegistry>,
    mut physics: ResMut<PhysicsState>,
) {
    let physics = physics.as_mut();
    for message in messages.read() {
        let result = match *message {
            VesselLifecycle::GoOffRails(id) => registry.go_off_rails(physics, id),
            VesselLifecycle::GoOnRails(id) => registry.go_on_rails(physics, id),
            VesselLifecycle::Destroy(id) => registry.destroy(physics, id),
            VesselLifecycle::Launch(id) => registry.launch(id),
            VesselLifecycle::HostReady => {
                registry.host_ready(physics);
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!("{:?} ignored: {}", message, err);
        }
    }
}

fn step_physics(mut physics: ResMut<PhysicsState>) {
    physics.step();
}

fn refresh_vessels(mut registry: ResMut<VesselRegistry>, physics: Res<PhysicsState>) {
    registry.refresh(&physics);
}

fn physics_tick(mut registry: ResMut<VesselRegistry>, mut physics: ResMut<PhysicsState>) {
    registry.physics_tick(physics.as_mut());
}

fn late_tick(mut registry: ResMut<VesselRegistry>, mut physics: ResMut<PhysicsState>) {
    registry.late_tick(physics.as_mut());
}

fn sync_transforms(physics: Res<PhysicsState>, mut query: Query<(&PartLink, &mut Transform)>) {
    for (link, mut transform) in query.iter_mut() {
        if let Some(body) = physics.rigid_body_set.get(link.0) {
            let (position, rotation) = state::from_isometry(body.position());
            transform.translation = position;
            transform.rotation = rotation;
        }
    }
}

fn request_diagnostics_dump(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut writer: MessageWriter<DumpStabilizerDiagnostics>,
) {
    if keyboard.is_some_and(|k| k.just_pressed(KeyCode::NumpadMultiply)) {
        writer.write(DumpStabilizerDiagnostics);
    }
}

fn dump_diagnostics(
    mut requests: MessageReader<DumpStabilizerDiagnostics>,
    mut registry: ResMut<VesselRegistry>,
    mut physics: ResMut<PhysicsState>,
) {
    if requests.read().count() == 0 {
        return;
    }
    for diagnostics in registry.diagnostics(physics.as_mut()) {
        info!("{}", diagnostics);
    }
}
