//! Scene manager for vessels living in one [`PhysicsState`].
//!
//! The registry owns every [`VesselRecord`], flips vessels on and off rails,
//! and forwards each transition to the vessel's stabilizer before the next
//! physics tick runs.

use std::collections::BTreeMap;

use bevy::prelude::*;
use stabilizer_core::{LifecycleListener, StabilizerConfig, StabilizerDiagnostics};

use crate::state::PhysicsState;
use crate::vessel::{VesselBlueprint, VesselId, VesselRecord};

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// No vessel with this id is registered
    UnknownVessel(VesselId),
    /// Blueprint has no parts, so there is no root to build around
    EmptyBlueprint(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::UnknownVessel(id) => write!(f, "Unknown vessel: {}", id),
            HostError::EmptyBlueprint(name) => write!(f, "Blueprint has no parts: {}", name),
        }
    }
}

impl std::error::Error for HostError {}

/// Result type for registry operations.
pub type HostResult<T> = Result<T, HostError>;

#[derive(Resource, Default)]
pub struct VesselRegistry {
    vessels: BTreeMap<VesselId, VesselRecord>,
    next_id: u32,
}

impl VesselRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VesselId> + '_ {
        self.vessels.keys().copied()
    }

    pub fn get(&self, id: VesselId) -> Option<&VesselRecord> {
        self.vessels.get(&id)
    }

    fn record_mut(&mut self, id: VesselId) -> HostResult<&mut VesselRecord> {
        self.vessels.get_mut(&id).ok_or(HostError::UnknownVessel(id))
    }

    /// Build a vessel from `blueprint`. It starts on rails and prelaunch.
    ///
    /// `config` is copied into the vessel's stabilizer.
    pub fn spawn_vessel(
        &mut self,
        physics: &mut PhysicsState,
        blueprint: &VesselBlueprint,
        config: &StabilizerConfig,
    ) -> HostResult<VesselId> {
        if blueprint.parts.is_empty() {
            return Err(HostError::EmptyBlueprint(blueprint.name.clone()));
        }

        let id = VesselId(self.next_id);
        self.next_id += 1;

        let record = VesselRecord::spawn(id, blueprint, physics, config.clone());
        debug!(
            "{}: spawned {} with {} parts",
            id,
            record.name,
            record.parts.len()
        );
        self.vessels.insert(id, record);
        Ok(id)
    }

    /// Start integrating the vessel's bodies and arm its stabilizer.
    pub fn go_off_rails(&mut self, physics: &mut PhysicsState, id: VesselId) -> HostResult<()> {
        let record = self.record_mut(id)?;
        if record.off_rails {
            return Ok(());
        }

        record.set_bodies_simulated(physics, true);
        record.off_rails = true;
        record.with_stabilizer(physics, |stabilizer, vessel| {
            stabilizer.on_simulation_activated(&*vessel)
        });
        Ok(())
    }

    /// Stop integrating the vessel's bodies and disarm its stabilizer.
    pub fn go_on_rails(&mut self, physics: &mut PhysicsState, id: VesselId) -> HostResult<()> {
        let record = self.record_mut(id)?;
        if !record.off_rails {
            return Ok(());
        }

        record.with_stabilizer(physics, |stabilizer, vessel| {
            stabilizer.on_simulation_deactivated(&*vessel)
        });
        record.set_bodies_simulated(physics, false);
        record.off_rails = false;
        Ok(())
    }

    /// Notify the stabilizer, then remove the vessel and all its bodies.
    pub fn destroy(&mut self, physics: &mut PhysicsState, id: VesselId) -> HostResult<()> {
        let record = self.record_mut(id)?;
        record.with_stabilizer(physics, |stabilizer, vessel| {
            stabilizer.on_will_destroy(&*vessel)
        });

        let Some(record) = self.vessels.remove(&id) else {
            return Err(HostError::UnknownVessel(id));
        };
        for part in &record.parts {
            // Removing a body also drops its colliders and joints.
            physics.rigid_body_set.remove(
                part.body,
                &mut physics.island_manager,
                &mut physics.collider_set,
                &mut physics.impulse_joint_set,
                &mut physics.multibody_joint_set,
                true,
            );
        }
        physics.refresh_queries();
        Ok(())
    }

    /// The scene finished loading: every vessel disarms and recaptures its pose.
    pub fn host_ready(&mut self, physics: &mut PhysicsState) {
        for record in self.vessels.values_mut() {
            record.off_rails = false;
            record.set_bodies_simulated(physics, false);
            record.with_stabilizer(physics, |stabilizer, vessel| {
                stabilizer.on_host_ready(&*vessel)
            });
        }
    }

    /// Leave the launch site. The vessel reports `Landed` instead of `Prelaunch`.
    pub fn launch(&mut self, id: VesselId) -> HostResult<()> {
        let record = self.record_mut(id)?;
        record.prelaunch = false;
        Ok(())
    }

    /// Set the brake input on every braking part of the vessel.
    pub fn set_brakes(&mut self, id: VesselId, input: f32) -> HostResult<()> {
        let record = self.record_mut(id)?;
        for part in &mut record.parts {
            if let Some(brakes) = part.capabilities.brakes.as_mut() {
                brakes.input = input.clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    /// Set the deployment position on every landing gear of the vessel.
    pub fn set_gear_deployment(&mut self, id: VesselId, position: f32) -> HostResult<()> {
        let record = self.record_mut(id)?;
        for part in &mut record.parts {
            if let Some(deployment) = part.capabilities.deployment.as_mut() {
                deployment.position = position.clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    /// Pull contacts, situation and surface speed from the last step.
    pub fn refresh(&mut self, physics: &PhysicsState) {
        for record in self.vessels.values_mut() {
            record.refresh(physics);
        }
    }

    pub fn physics_tick(&mut self, physics: &mut PhysicsState) {
        for record in self.vessels.values_mut() {
            record.with_stabilizer(physics, |stabilizer, vessel| stabilizer.physics_tick(vessel));
        }
    }

    pub fn late_tick(&mut self, physics: &mut PhysicsState) {
        for record in self.vessels.values_mut() {
            record.with_stabilizer(physics, |stabilizer, vessel| stabilizer.late_tick(vessel));
        }
    }

    /// Snapshot of every vessel's stabilizer.
    pub fn diagnostics(&mut self, physics: &mut PhysicsState) -> Vec<StabilizerDiagnostics> {
        self.vessels
            .values_mut()
            .map(|record| {
                record.with_stabilizer(physics, |stabilizer, vessel| {
                    stabilizer.diagnostics(&*vessel)
                })
            })
            .collect()
    }
}
