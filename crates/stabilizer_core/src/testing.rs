//! In-memory host used by the unit tests.
//!
//! `MockVessel` answers every [`Vessel`] query from plain fields, and its
//! scenery is a single infinite plane whose normal the test chooses.

use bevy::math::{Quat, Vec3};

use crate::host::{
    Part, PartBody, RayHit, ReferencePose, Situation, Vessel, WheelBrakes, WheelDeployment,
};

#[derive(Debug, Clone, Copy)]
pub struct MockBrakes(pub f32);

impl WheelBrakes for MockBrakes {
    fn brake_input(&self) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MockDeployment(pub f32);

impl WheelDeployment for MockDeployment {
    fn position(&self) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBody {
    pub linear: Vec3,
    pub angular: Vec3,
    pub sleeping: bool,
}

impl PartBody for MockBody {
    fn linear_velocity(&self) -> Vec3 {
        self.linear
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular
    }

    fn set_velocities(&mut self, linear: Vec3, angular: Vec3) {
        self.linear = linear;
        self.angular = angular;
    }

    fn sleep(&mut self) {
        self.sleeping = true;
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPart {
    pub ground_contact: bool,
    pub brakes: Option<MockBrakes>,
    pub deployment: Option<MockDeployment>,
    pub exempt: bool,
    pub body: Option<MockBody>,
}

impl MockPart {
    /// A part with a moving rigid body.
    pub fn moving(linear: Vec3, angular: Vec3) -> Self {
        Self {
            body: Some(MockBody {
                linear,
                angular,
                sleeping: false,
            }),
            ..Default::default()
        }
    }

    pub fn touching_ground(mut self) -> Self {
        self.ground_contact = true;
        self
    }

    pub fn with_brakes(mut self, input: f32) -> Self {
        self.brakes = Some(MockBrakes(input));
        self
    }

    pub fn with_deployment(mut self, position: f32) -> Self {
        self.deployment = Some(MockDeployment(position));
        self
    }

    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

impl Part for MockPart {
    fn has_ground_contact(&self) -> bool {
        self.ground_contact
    }

    fn braking(&self) -> Option<&dyn WheelBrakes> {
        self.brakes.as_ref().map(|b| b as &dyn WheelBrakes)
    }

    fn deployment(&self) -> Option<&dyn WheelDeployment> {
        self.deployment.as_ref().map(|d| d as &dyn WheelDeployment)
    }

    fn is_stabilization_exempt(&self) -> bool {
        self.exempt
    }
}

#[derive(Debug, Clone)]
pub struct MockVessel {
    pub name: String,
    pub loaded: bool,
    pub situation: Situation,
    pub surface_speed: f32,
    pub center_of_mass: Vec3,
    pub supporting_body_center: Vec3,
    pub pose: ReferencePose,
    pub parts: Vec<MockPart>,
    /// Normal of the scenery plane under the vessel, `None` for no geometry.
    pub ground_normal: Option<Vec3>,
    pub raycasts: std::cell::Cell<u32>,
}

impl Default for MockVessel {
    fn default() -> Self {
        Self {
            name: "Test Vessel".to_string(),
            loaded: true,
            situation: Situation::Landed,
            surface_speed: 0.0,
            center_of_mass: Vec3::new(0.0, 1.0, 0.0),
            supporting_body_center: Vec3::new(0.0, -600_000.0, 0.0),
            pose: ReferencePose::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
            parts: vec![MockPart::moving(Vec3::ZERO, Vec3::ZERO).touching_ground()],
            ground_normal: Some(Vec3::Y),
            raycasts: std::cell::Cell::new(0),
        }
    }
}

impl MockVessel {
    /// Landed vessel on a plane tilted `degrees` away from local up.
    pub fn landed_on_slope(degrees: f32) -> Self {
        let tilt = Quat::from_rotation_z(degrees.to_radians());
        Self {
            ground_normal: Some(tilt * Vec3::Y),
            ..Default::default()
        }
    }

    pub fn with_parts(mut self, parts: Vec<MockPart>) -> Self {
        self.parts = parts;
        self
    }

    pub fn body(&self, index: usize) -> &MockBody {
        self.parts[index]
            .body
            .as_ref()
            .expect("part has no rigid body")
    }

    /// Give every body some residual motion and wake it up.
    pub fn jitter(&mut self) {
        for part in &mut self.parts {
            if let Some(body) = part.body.as_mut() {
                body.linear = Vec3::new(0.01, -0.02, 0.005);
                body.angular = Vec3::new(0.0, 0.03, 0.0);
                body.sleeping = false;
            }
        }
    }

    pub fn raycast_count(&self) -> u32 {
        self.raycasts.get()
    }
}

impl Vessel for MockVessel {
    type Part = MockPart;
    type Body<'a> = &'a mut MockBody;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn situation(&self) -> Situation {
        self.situation
    }

    fn surface_speed(&self) -> f32 {
        self.surface_speed
    }

    fn center_of_mass(&self) -> Vec3 {
        self.center_of_mass
    }

    fn supporting_body_center(&self) -> Vec3 {
        self.supporting_body_center
    }

    fn root_pose(&self) -> ReferencePose {
        self.pose
    }

    fn set_pose(&mut self, pose: &ReferencePose) {
        self.pose = *pose;
    }

    fn parts(&self) -> &[MockPart] {
        &self.parts
    }

    fn part_body_mut(&mut self, index: usize) -> Option<&mut MockBody> {
        self.parts.get_mut(index)?.body.as_mut()
    }

    fn raycast_scenery(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.raycasts.set(self.raycasts.get() + 1);
        let normal = self.ground_normal?;
        Some(RayHit {
            point: origin + direction,
            normal,
        })
    }
}
