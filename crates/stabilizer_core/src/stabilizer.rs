//! Per-vessel stabilization state machine.
//!
//! ```text
//!  Disarmed --activated--> ArmedFirstTick --slow & grounded--> Freezing --done--> Steady
//!      ^                         |                                                  ^
//!      |                         +------------------moving---------------------------+
//!      +------------- deactivated / destroyed / host ready (from any state)
//! ```
//!
//! The host drives two hook points every frame:
//!
//! 1. [`Stabilizer::physics_tick`] on the fixed-timestep physics callback
//! 2. [`Stabilizer::late_tick`] once per rendered frame, after everything else
//!
//! The late tick re-applies whatever the physics tick decided, because hosts
//! wake sleeping bodies between the two points (contact events, joint solves).
//! Both are no-ops while disarmed.

use bevy::log::{debug, info};

use crate::actuator::{damp, freeze};
use crate::config::StabilizerConfig;
use crate::contact::has_real_ground_contact;
use crate::diagnostics::StabilizerDiagnostics;
use crate::host::{LifecycleListener, ReferencePose, Vessel};
use crate::rest::{RestDetector, RestState};

/// Progress through one freeze episode.
///
/// Completes once `ticks_elapsed` reaches `ticks_target`, so an episode
/// freezes exactly `ticks_target` ticks and a target of 0 freezes none. This
/// is one tick shorter than a strict `ticks_elapsed > ticks_target` count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeCounter {
    pub ticks_elapsed: u32,
    pub ticks_target: u32,
}

impl FreezeCounter {
    pub fn new(ticks_target: u32) -> Self {
        Self {
            ticks_elapsed: 0,
            ticks_target,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ticks_elapsed >= self.ticks_target
    }
}

/// Controller state. Anything but `Disarmed` means the simulation is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilizerState {
    /// Host is not integrating the vessel. Ticks are ignored.
    #[default]
    Disarmed,
    /// Armed, waiting for the first physics tick to decide whether to freeze.
    ArmedFirstTick,
    /// Holding the reference pose, overriding all other logic.
    Freezing(FreezeCounter),
    /// Normal operation: damp whenever the vessel rests with real contact.
    Steady,
}

/// Rest stabilizer attached to exactly one vessel.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    config: StabilizerConfig,
    state: StabilizerState,
    reference_pose: Option<ReferencePose>,
    rest: RestDetector,
    rest_state: RestState,
    standing_still: bool,
    has_ground_contact: bool,
    needs_dampening: bool,
    parts_on_sleep: usize,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            state: StabilizerState::Disarmed,
            reference_pose: None,
            rest: RestDetector::new(),
            rest_state: RestState::Unknown,
            standing_still: false,
            has_ground_contact: false,
            needs_dampening: false,
            parts_on_sleep: 0,
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn state(&self) -> StabilizerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state != StabilizerState::Disarmed
    }

    pub fn is_freezing(&self) -> bool {
        matches!(self.state, StabilizerState::Freezing(_))
    }

    pub fn rest_state(&self) -> RestState {
        self.rest_state
    }

    pub fn reference_pose(&self) -> Option<&ReferencePose> {
        self.reference_pose.as_ref()
    }

    pub fn on_a_slope(&self) -> bool {
        self.rest.on_a_slope()
    }

    pub fn needs_dampening(&self) -> bool {
        self.needs_dampening
    }

    pub fn parts_on_sleep(&self) -> usize {
        self.parts_on_sleep
    }

    /// Fixed-timestep hook.
    pub fn physics_tick<V: Vessel>(&mut self, vessel: &mut V) {
        match self.state {
            StabilizerState::Disarmed => {}
            StabilizerState::ArmedFirstTick => self.first_tick(vessel),
            StabilizerState::Freezing(counter) => self.freeze_tick(vessel, counter),
            StabilizerState::Steady => self.steady_tick(vessel),
        }
    }

    /// End-of-frame hook.
    pub fn late_tick<V: Vessel>(&mut self, vessel: &mut V) {
        if !self.is_armed() {
            return;
        }
        if self.needs_dampening {
            self.parts_on_sleep = damp(vessel);
        }
        if self.is_freezing() {
            self.apply_freeze(vessel);
        }
    }

    pub fn diagnostics<V: Vessel>(&self, vessel: &V) -> StabilizerDiagnostics {
        StabilizerDiagnostics {
            vessel_name: vessel.name().to_string(),
            state: self.state,
            surface_speed: vessel.surface_speed(),
            slope_angle: self.rest.last_slope_angle(),
            standing_still: self.standing_still,
            slope_cached: self.rest.slope_cached(),
            on_a_slope: self.rest.on_a_slope(),
            situation: vessel.situation(),
            ground_contact: self.has_ground_contact,
            needs_dampening: self.needs_dampening,
            parts_on_sleep: self.parts_on_sleep,
        }
    }

    fn first_tick<V: Vessel>(&mut self, vessel: &mut V) {
        let grounded = vessel.situation().is_grounded();
        let speed = vessel.surface_speed();

        let too_fast = speed > self.config.rest_velocity_threshold;
        if !grounded || too_fast || self.config.freeze_frames == 0 {
            debug!(
                "{}: first tick, no freeze (situation={}, srfSpeed={})",
                vessel.name(),
                vessel.situation(),
                speed
            );
            self.state = StabilizerState::Steady;
            return;
        }

        debug!(
            "{}: first tick, freezing for {} ticks",
            vessel.name(),
            self.config.freeze_frames
        );
        self.freeze_tick(vessel, FreezeCounter::new(self.config.freeze_frames));
    }

    fn freeze_tick<V: Vessel>(&mut self, vessel: &mut V, mut counter: FreezeCounter) {
        self.apply_freeze(vessel);
        counter.ticks_elapsed += 1;

        if counter.is_complete() {
            debug!("{}: freeze done after {} ticks", vessel.name(), counter.ticks_elapsed);
            self.state = StabilizerState::Steady;
        } else {
            self.state = StabilizerState::Freezing(counter);
        }
    }

    fn steady_tick<V: Vessel>(&mut self, vessel: &mut V) {
        self.needs_dampening = false;

        let at_rest = self.rest.is_at_rest(
            &*vessel,
            self.config.rest_velocity_threshold,
            self.config.slope_angle_threshold,
        );

        if !at_rest {
            self.rest_state = RestState::Moving;
            self.rest.invalidate();
            self.standing_still = false;
            return;
        }

        self.rest_state = RestState::AtRest;
        self.standing_still = true;
        self.has_ground_contact =
            has_real_ground_contact(&*vessel, self.config.account_for_brakes);
        if self.has_ground_contact {
            self.parts_on_sleep = damp(vessel);
            self.needs_dampening = true;
        }
    }

    fn apply_freeze<V: Vessel>(&mut self, vessel: &mut V) {
        if let Some(pose) = self.reference_pose {
            freeze(vessel, &pose);
        }
    }

    fn capture_pose<V: Vessel>(&mut self, vessel: &V) {
        self.reference_pose = Some(vessel.root_pose());
    }

    fn clear_flags(&mut self) {
        self.rest.reset();
        self.rest_state = RestState::Unknown;
        self.standing_still = false;
        self.has_ground_contact = false;
        self.needs_dampening = false;
        self.parts_on_sleep = 0;
    }

    fn disarm(&mut self) {
        self.state = StabilizerState::Disarmed;
        self.needs_dampening = false;
    }
}

impl<V: Vessel> LifecycleListener<V> for Stabilizer {
    fn on_simulation_activated(&mut self, vessel: &V) {
        info!("{}: simulation activated", vessel.name());
        self.capture_pose(vessel);
        self.clear_flags();
        self.state = StabilizerState::ArmedFirstTick;
    }

    fn on_simulation_deactivated(&mut self, vessel: &V) {
        info!("{}: simulation deactivated", vessel.name());
        self.disarm();
    }

    fn on_will_destroy(&mut self, vessel: &V) {
        info!("{}: vessel will be destroyed", vessel.name());
        self.disarm();
    }

    fn on_host_ready(&mut self, vessel: &V) {
        if !vessel.is_loaded() {
            return;
        }
        info!("{}: host ready", vessel.name());
        self.disarm();
        self.capture_pose(vessel);
    }
}
