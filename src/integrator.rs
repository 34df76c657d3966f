//! Motion integration seam.
//!
//! The coordinator never moves an agent itself. Once every force of a tick is
//! known it hands each agent's resultant to a [`MotionIntegrator`], exactly
//! once per agent, and the integrator decides what happens to the body.

use bevy::math::Vec3;

use crate::agent::{AgentId, MotionState};

/// Receives the final steering force of each agent once per tick.
pub trait MotionIntegrator {
    /// `body` is the agent's last known motion state. Implementations that
    /// own the real body elsewhere (a physics engine) may leave it untouched
    /// and resync it before the next tick.
    fn apply_force(&mut self, id: AgentId, body: &mut MotionState, force: Vec3);
}

/// Forward-Euler integration with one mass shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerIntegrator {
    /// Timestep in seconds.
    pub dt: f32,
    /// Applied to all agents; `AgentParams::mass` is not consulted.
    pub mass: f32,
}

impl EulerIntegrator {
    pub fn new(dt: f32, mass: f32) -> Self {
        Self { dt, mass }
    }
}

impl MotionIntegrator for EulerIntegrator {
    fn apply_force(&mut self, _id: AgentId, body: &mut MotionState, force: Vec3) {
        let mass = if self.mass > 0.0 { self.mass } else { 1.0 };
        body.velocity += force / mass * self.dt;
        body.position += body.velocity * self.dt;
    }
}

/// Records every applied force without touching the bodies.
///
/// Used to hand forces to an external physics engine after the tick, and
/// by tests to inspect what a tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceLog {
    pub entries: Vec<(AgentId, Vec3)>,
}

impl ForceLog {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn force_for(&self, id: AgentId) -> Option<Vec3> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, force)| *force)
    }
}

impl MotionIntegrator for ForceLog {
    fn apply_force(&mut self, id: AgentId, _body: &mut MotionState, force: Vec3) {
        self.entries.push((id, force));
    }
}
