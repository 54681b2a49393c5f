//! On-demand snapshot of a stabilizer's internal flags.

use std::fmt;

use crate::host::Situation;
use crate::stabilizer::StabilizerState;

/// Everything worth printing when a vessel misbehaves on the ground.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizerDiagnostics {
    pub vessel_name: String,
    pub state: StabilizerState,
    pub surface_speed: f32,
    pub slope_angle: f32,
    pub standing_still: bool,
    pub slope_cached: bool,
    pub on_a_slope: bool,
    pub situation: Situation,
    pub ground_contact: bool,
    pub needs_dampening: bool,
    pub parts_on_sleep: usize,
}

impl fmt::Display for StabilizerDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.vessel_name;
        writeln!(f, "{name}: state={:?}", self.state)?;
        writeln!(f, "{name}: srfSpeed={}", self.surface_speed)?;
        writeln!(f, "{name}: slopeAngle={}", self.slope_angle)?;
        writeln!(f, "{name}: standingStill={}", self.standing_still)?;
        writeln!(f, "{name}: slopeCached={}", self.slope_cached)?;
        writeln!(f, "{name}: onASlope={}", self.on_a_slope)?;
        writeln!(f, "{name}: situation={}", self.situation)?;
        writeln!(f, "{name}: ground contact={}", self.ground_contact)?;
        writeln!(f, "{name}: needs dampening={}", self.needs_dampening)?;
        write!(f, "{name}: partsOnSleep={}", self.parts_on_sleep)
    }
}
