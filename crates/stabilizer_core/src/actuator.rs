//! Actuators: the only code that writes to the host's rigid bodies.
//!
//! - [`damp`] zeroes velocities and sleeps bodies in place
//! - [`freeze`] first snaps the vessel back to a reference pose, then does the same

use bevy::math::Vec3;

use crate::host::{Part, PartBody, ReferencePose, Vessel};

/// Put every non-exempt part with an active body to sleep.
///
/// Returns the number of bodies put to sleep.
pub fn damp<V: Vessel>(vessel: &mut V) -> usize {
    let mut slept = 0;
    for index in 0..vessel.parts().len() {
        if vessel.parts()[index].is_stabilization_exempt() {
            continue;
        }
        if let Some(mut body) = vessel.part_body_mut(index) {
            body.sleep();
            body.set_velocities(Vec3::ZERO, Vec3::ZERO);
            slept += 1;
        }
    }
    slept
}

/// Restore `pose` and stop every part with an active body.
pub fn freeze<V: Vessel>(vessel: &mut V, pose: &ReferencePose) {
    vessel.set_pose(pose);
    for index in 0..vessel.parts().len() {
        if let Some(mut body) = vessel.part_body_mut(index) {
            body.sleep();
            body.set_velocities(Vec3::ZERO, Vec3::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPart, MockVessel};
    use bevy::math::Quat;

    fn jittering_vessel() -> MockVessel {
        MockVessel::default().with_parts(vec![
            MockPart::moving(Vec3::X, Vec3::Y),
            MockPart::moving(Vec3::new(0.0, -0.2, 0.0), Vec3::Z),
            MockPart::moving(Vec3::ZERO, Vec3::ZERO).without_body(),
        ])
    }

    fn assert_stopped(body: &dyn PartBody) {
        assert_eq!(body.linear_velocity(), Vec3::ZERO);
        assert_eq!(body.angular_velocity(), Vec3::ZERO);
        assert!(body.is_sleeping(), "body should be asleep");
    }

    #[test]
    fn test_damp_stops_and_sleeps_bodies() {
        let mut vessel = jittering_vessel();

        let slept = damp(&mut vessel);

        assert_eq!(slept, 2, "part without a body is skipped");
        assert_stopped(vessel.body(0));
        assert_stopped(vessel.body(1));
    }

    #[test]
    fn test_damp_is_idempotent() {
        let mut vessel = jittering_vessel();

        let first = damp(&mut vessel);
        let second = damp(&mut vessel);

        assert_eq!(first, second);
        assert_stopped(vessel.body(0));
        assert_stopped(vessel.body(1));
    }

    #[test]
    fn test_damp_skips_exempt_parts() {
        let mut vessel = MockVessel::default().with_parts(vec![
            MockPart::moving(Vec3::X, Vec3::ZERO),
            MockPart::moving(Vec3::X, Vec3::Y).exempt(),
        ]);

        assert_eq!(damp(&mut vessel), 1);
        assert_stopped(vessel.body(0));
        assert_eq!(vessel.body(1).linear, Vec3::X);
        assert!(!vessel.body(1).sleeping);
    }

    #[test]
    fn test_damp_does_not_move_vessel() {
        let mut vessel = jittering_vessel();
        let before = vessel.pose;

        damp(&mut vessel);

        assert_eq!(vessel.pose, before);
    }

    #[test]
    fn test_freeze_round_trip_restores_pose() {
        let mut vessel = jittering_vessel();
        let captured = vessel.root_pose();

        // Drift away from the captured pose.
        vessel.pose = ReferencePose::new(
            captured.position + Vec3::new(0.3, -0.01, 0.2),
            Quat::from_rotation_y(0.1) * captured.orientation,
        );

        freeze(&mut vessel, &captured);

        assert_eq!(vessel.pose.position, captured.position);
        assert_eq!(vessel.pose.orientation, captured.orientation);
        assert_stopped(vessel.body(0));
        assert_stopped(vessel.body(1));
    }

    #[test]
    fn test_freeze_ignores_exemption() {
        let mut vessel =
            MockVessel::default().with_parts(vec![MockPart::moving(Vec3::X, Vec3::Y).exempt()]);
        let pose = vessel.root_pose();

        freeze(&mut vessel, &pose);

        assert_stopped(vessel.body(0));
    }
}
