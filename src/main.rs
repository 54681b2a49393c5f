use bevy::prelude::*;
use stabilizer_core::StabilizerConfig;
use stabilizer_physics::{
    state, PartLink, PhysicsState, StabilizerPlugin, VesselBlueprint, VesselId, VesselLifecycle,
    VesselRegistry,
};

mod camera;

use camera::{ChaseCameraBundle, ChaseCameraPlugin};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(StabilizerPlugin)
        .add_plugins(ChaseCameraPlugin)
        // Dark background
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_systems(Startup, setup)
        .add_systems(Update, vessel_controls)
        .run();
}

fn setup(
    mut commands: Commands,
    mut physics: ResMut<PhysicsState>,
    mut registry: ResMut<VesselRegistry>,
    config: Res<StabilizerConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut lifecycle: MessageWriter<VesselLifecycle>,
) {
    let physics = physics.as_mut();

    // Launch pad, a gentle hill the vessels can park on, and a slope too steep to.
    let ground_color = materials.add(Color::srgb(0.3, 0.5, 0.3));
    let scenery = [
        physics.spawn_scenery_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(20.0, 0.5, 20.0),
            Quat::IDENTITY,
        ),
        physics.spawn_scenery_slope(Vec3::new(30.0, 0.0, 0.0), 8.0, 15.0),
        physics.spawn_scenery_slope(Vec3::new(-30.0, 0.0, 0.0), 8.0, 40.0),
    ];
    for handle in scenery {
        let Some(collider) = physics.collider_set.get(handle) else {
            continue;
        };
        let Some(cuboid) = collider.shape().as_cuboid() else {
            continue;
        };
        let (position, rotation) = state::from_isometry(collider.position());
        let size = state::from_na_vec(&cuboid.half_extents) * 2.0;
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(ground_color.clone()),
            Transform::from_translation(position).with_rotation(rotation),
        ));
    }

    let hill = Quat::from_rotation_z(15f32.to_radians());
    let cliff = Quat::from_rotation_z(40f32.to_radians());
    let hill_spot = Vec3::new(30.0, 0.0, 0.0) + hill * Vec3::new(0.0, 0.55, 0.0);
    let cliff_spot = Vec3::new(-30.0, 0.0, 0.0) + cliff * Vec3::Y;
    let blueprints = [
        VesselBlueprint::rover("Braked Rover", Vec3::new(0.0, 0.55, 0.0), 1.0),
        VesselBlueprint::rover("Coasting Rover", Vec3::new(-6.0, 0.55, 4.0), 0.0),
        VesselBlueprint::lander("Lander", Vec3::new(6.0, 1.0, -4.0), 0.0),
        VesselBlueprint::rover("Hill Rover", hill_spot, 1.0).with_rotation(hill),
        VesselBlueprint::lander("Cliff Lander", cliff_spot, 1.0).with_rotation(cliff),
    ];

    let hull_color = materials.add(Color::srgb(0.8, 0.8, 0.85));
    let gear_color = materials.add(Color::srgb(0.2, 0.2, 0.2));
    for blueprint in &blueprints {
        let id = match registry.spawn_vessel(physics, blueprint, &config) {
            Ok(id) => id,
            Err(err) => {
                warn!("Skipping {}: {}", blueprint.name, err);
                continue;
            }
        };
        spawn_part_visuals(
            &mut commands,
            &mut meshes,
            &registry,
            physics,
            id,
            blueprint,
            [hull_color.clone(), gear_color.clone()],
        );
        lifecycle.write(VesselLifecycle::GoOffRails(id));
    }
    info!("Spawned {} vessels", registry.len());

    commands.spawn(ChaseCameraBundle::new(18.0));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.8, 0.5, 0.0)),
    ));
}

fn spawn_part_visuals(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    registry: &VesselRegistry,
    physics: &PhysicsState,
    id: VesselId,
    blueprint: &VesselBlueprint,
    [hull, gear]: [Handle<StandardMaterial>; 2],
) {
    let Some(record) = registry.get(id) else {
        return;
    };
    for (part, layout) in record.parts.iter().zip(&blueprint.parts) {
        let Some(body) = physics.rigid_body_set.get(part.body) else {
            continue;
        };
        let (position, rotation) = state::from_isometry(body.position());
        let material = if layout.capabilities.brakes.is_some() {
            gear.clone()
        } else {
            hull.clone()
        };
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(layout.half_extents * 2.0))),
            MeshMaterial3d(material),
            Transform::from_translation(position).with_rotation(rotation),
            PartLink(part.body),
        ));
    }
}

/// Space toggles rails, L launches, B toggles brakes. All act on every vessel.
fn vessel_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut registry: ResMut<VesselRegistry>,
    mut lifecycle: MessageWriter<VesselLifecycle>,
    mut brakes_on: Local<Option<bool>>,
) {
    let ids: Vec<VesselId> = registry.ids().collect();

    if keyboard.just_pressed(KeyCode::Space) {
        for &id in &ids {
            let off_rails = registry.get(id).is_some_and(|r| r.off_rails);
            lifecycle.write(if off_rails {
                VesselLifecycle::GoOnRails(id)
            } else {
                VesselLifecycle::GoOffRails(id)
            });
        }
    }

    if keyboard.just_pressed(KeyCode::KeyL) {
        for &id in &ids {
            lifecycle.write(VesselLifecycle::Launch(id));
        }
    }

    if keyboard.just_pressed(KeyCode::KeyB) {
        let engaged = !brakes_on.unwrap_or(true);
        *brakes_on = Some(engaged);
        info!("Brakes {}", if engaged { "engaged" } else { "released" });
        for &id in &ids {
            if let Err(err) = registry.set_brakes(id, if engaged { 1.0 } else { 0.0 }) {
                warn!("{}", err);
            }
        }
    }
}
