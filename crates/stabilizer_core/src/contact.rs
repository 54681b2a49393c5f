//! Filtering raw ground-contact flags into "real" contact.
//!
//! Hosts raise a part's contact flag for any collider touching the ground,
//! wheels included. A vessel rolling on released brakes must not be damped,
//! so wheel contact only counts while the brakes are applied. Landing gear
//! that is not fully deployed is the exception: there the gear housing, not
//! the wheel, is touching the ground and the contact always counts.

use crate::host::{Part, Vessel};

/// Deployment extent below which gear contact is housing contact.
pub const GEAR_DEPLOYED_THRESHOLD: f32 = 0.9;

/// Whether a single part's contact should trigger damping.
pub fn is_real_contact<P: Part>(part: &P, account_for_brakes: bool) -> bool {
    if !part.has_ground_contact() {
        return false;
    }
    if !account_for_brakes {
        return true;
    }

    let Some(brakes) = part.braking() else {
        return true;
    };

    if let Some(deployment) = part.deployment() {
        if deployment.position() < GEAR_DEPLOYED_THRESHOLD {
            return true;
        }
    }

    brakes.brake_input() > 0.0
}

/// True as soon as any part reports real ground contact.
pub fn has_real_ground_contact<V: Vessel>(vessel: &V, account_for_brakes: bool) -> bool {
    vessel
        .parts()
        .iter()
        .any(|part| is_real_contact(part, account_for_brakes))
}
