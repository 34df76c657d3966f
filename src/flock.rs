//! Flock coordinator: owns the agents and runs one simulation tick at a time.
//!
//! A tick has two phases separated by a barrier:
//!
//! 1. **Compute**: every agent's weighted behavior forces are summed against
//!    a read-only view of the whole flock as it stood when the tick began.
//!    Large flocks split this phase across the compute task pool.
//! 2. **Apply**: each resultant goes to the [`MotionIntegrator`] exactly
//!    once, in spawn order.
//!
//! No agent sees another's force from the same tick, so the result does not
//! depend on iteration order or thread count. Spawning takes `&mut self` and
//! therefore can only happen between ticks.

use bevy::log::{debug, warn};
use bevy::math::Vec3;
use bevy::tasks::{ComputeTaskPool, ParallelSlice, TaskPool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{draw_wander_angle, Agent, AgentId, MotionState};
use crate::config::{Behavior, FlockConfig, SeekMode};
use crate::error::{validate_agent_params, FlockError, FlockResult};
use crate::integrator::MotionIntegrator;
use crate::math::flatten_y;

/// Owns the live agents, the behavior configuration and the tick loop.
#[derive(Debug, Clone)]
pub struct FlockCoordinator {
    agents: Vec<Agent>,
    /// Initial-heading kick per agent, consumed by its first tick.
    pending_kicks: Vec<Vec3>,
    config: FlockConfig,
    rng: StdRng,
    ticks: u64,
}

impl Default for FlockCoordinator {
    fn default() -> Self {
        Self::new(FlockConfig::default())
    }
}

impl FlockCoordinator {
    /// Empty flock. The RNG is seeded from `config.seed`, or from OS
    /// entropy when unset.
    pub fn new(config: FlockConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            agents: Vec::new(),
            pending_kicks: Vec::new(),
            config,
            rng,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Replaces the configuration between ticks. Toggles and weights apply
    /// from the next tick; existing agents keep their tunables. The RNG is
    /// not reseeded.
    pub fn set_config(&mut self, config: FlockConfig) {
        self.config = config;
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in spawn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> FlockResult<&Agent> {
        self.agents
            .get(id.index())
            .ok_or(FlockError::UnknownAgent { id })
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Spawns a boid at planar `(x, z)`, resting on the ground at a height of
    /// one body radius.
    pub fn spawn(&mut self, x: f32, z: f32) -> AgentId {
        self.spawn_at(Vec3::new(x, self.config.boid_radius, z))
    }

    pub fn spawn_at(&mut self, position: Vec3) -> AgentId {
        self.spawn_with_motion(MotionState::at(position))
    }

    /// Appends a boid with the current configuration's tunables. It takes
    /// part in every tick from the next one on.
    pub fn spawn_with_motion(&mut self, motion: MotionState) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        let params = self.config.agent_params();
        if let Err(e) = validate_agent_params(&params) {
            warn!("boid {}: {e}; steering will be degraded", id.0);
        }

        let agent = Agent::new(id, params, motion);
        let kick = if self.config.initial_heading {
            agent.initial_heading(&mut self.rng)
        } else {
            Vec3::ZERO
        };
        self.agents.push(agent);
        self.pending_kicks.push(kick);
        id
    }

    /// Spawns `count` boids uniformly inside the configured spawn rectangle.
    ///
    /// A non-finite extent collapses that axis to zero.
    pub fn populate(&mut self, count: usize) -> Vec<AgentId> {
        let half_x = spawn_extent("spawn_half_extent_x", self.config.spawn_half_extent_x);
        let half_z = spawn_extent("spawn_half_extent_z", self.config.spawn_half_extent_z);
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let x = sample_symmetric(&mut self.rng, half_x);
            let z = sample_symmetric(&mut self.rng, half_z);
            ids.push(self.spawn(x, z));
        }
        ids
    }

    /// Records the motion state reported by an external integrator.
    pub fn sync_motion(&mut self, id: AgentId, motion: MotionState) -> FlockResult<()> {
        let agent = self
            .agents
            .get_mut(id.index())
            .ok_or(FlockError::UnknownAgent { id })?;
        *agent.motion_mut() = motion;
        Ok(())
    }

    /// Compute phase of a tick: the resultant force of every agent, indexed
    /// like [`FlockCoordinator::agents`].
    ///
    /// Draws this tick's wander angles and consumes pending initial-heading
    /// kicks, so calling it twice is not the same as calling it once.
    /// `seek_target = None` skips seek for every agent.
    pub fn compute_forces(&mut self, seek_target: Option<Vec3>) -> Vec<Vec3> {
        let wander_angles: Vec<f32> = if self.config.wander_enabled {
            (0..self.agents.len())
                .map(|_| draw_wander_angle(&mut self.rng))
                .collect()
        } else {
            Vec::new()
        };

        let inputs = TickInputs {
            config: &self.config,
            flock: &self.agents,
            seek_target,
            wander_angles: &wander_angles,
        };
        let mut forces = if self.agents.len() >= self.config.parallel_threshold.max(1) {
            inputs.forces_parallel()
        } else {
            inputs.forces_serial()
        };

        for (force, kick) in forces.iter_mut().zip(self.pending_kicks.iter_mut()) {
            *force += std::mem::take(kick);
            if self.config.planar_forces {
                *force = flatten_y(*force);
            }
        }
        forces
    }

    /// Runs one full tick: computes every force, then hands each to
    /// `integrator` exactly once.
    pub fn step<I: MotionIntegrator + ?Sized>(
        &mut self,
        seek_target: Option<Vec3>,
        integrator: &mut I,
    ) {
        let forces = self.compute_forces(seek_target);
        for (agent, force) in self.agents.iter_mut().zip(forces) {
            let id = agent.id();
            integrator.apply_force(id, agent.motion_mut(), force);
        }
        self.ticks += 1;

        debug!(
            "tick {}: {} boids, centroid {}, mean speed {:.2}",
            self.ticks,
            self.agents.len(),
            self.centroid(),
            self.mean_speed()
        );
    }

    /// Average position of all agents; zero for an empty flock.
    pub fn centroid(&self) -> Vec3 {
        if self.agents.is_empty() {
            return Vec3::ZERO;
        }
        self.agents.iter().map(Agent::position).sum::<Vec3>() / self.agents.len() as f32
    }

    /// Average speed of all agents; zero for an empty flock.
    pub fn mean_speed(&self) -> f32 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.velocity().length()).sum::<f32>() / self.agents.len() as f32
    }
}

fn spawn_extent(name: &str, value: f32) -> f32 {
    if value.is_finite() {
        value.abs()
    } else {
        warn!("{name} = {value} is not finite; spawning on that axis at 0");
        0.0
    }
}

/// Uniform in `[-half, half)`; zero when the extent is empty.
///
/// Scales a unit sample instead of building a `half`-wide range, so any
/// finite extent works, including ones whose full width overflows `f32`.
fn sample_symmetric(rng: &mut StdRng, half: f32) -> f32 {
    if half > 0.0 {
        (rng.gen::<f32>() * 2.0 - 1.0) * half
    } else {
        0.0
    }
}

/// Read-only snapshot of everything the compute phase needs.
#[derive(Clone, Copy)]
struct TickInputs<'a> {
    config: &'a FlockConfig,
    flock: &'a [Agent],
    seek_target: Option<Vec3>,
    /// One per agent when wander is enabled, empty otherwise.
    wander_angles: &'a [f32],
}

impl TickInputs<'_> {
    fn forces_serial(&self) -> Vec<Vec3> {
        self.flock
            .iter()
            .enumerate()
            .map(|(index, agent)| self.force_for(index, agent))
            .collect()
    }

    fn forces_parallel(&self) -> Vec<Vec3> {
        let pool = ComputeTaskPool::get_or_init(TaskPool::default);
        let chunk_size = self.flock.len().div_ceil(pool.thread_num().max(1)).max(1);
        self.flock
            .par_chunk_map(pool, chunk_size, |chunk_index, chunk| {
                let offset = chunk_index * chunk_size;
                chunk
                    .iter()
                    .enumerate()
                    .map(|(i, agent)| self.force_for(offset + i, agent))
                    .collect::<Vec<Vec3>>()
            })
            .into_iter()
            .flatten()
            .collect()
    }

    /// Weighted sum of the enabled behaviors for one agent, in fixed order.
    fn force_for(&self, index: usize, agent: &Agent) -> Vec3 {
        let mut total = Vec3::ZERO;
        for behavior in self.config.enabled_behaviors() {
            let force = match behavior {
                Behavior::Separation => agent.separate(self.flock),
                Behavior::Alignment => agent.align(self.flock),
                Behavior::Cohesion => agent.cohere(self.flock),
                Behavior::Seek => match self.seek_target {
                    Some(target) => match self.config.seek_mode {
                        SeekMode::Direct => agent.seek(target),
                        SeekMode::Arrive => {
                            agent.arrive(target, self.config.arrive_slowing_radius)
                        }
                    },
                    None => continue,
                },
                Behavior::Wander => match self.wander_angles.get(index) {
                    Some(&angle) => agent.wander_at(angle),
                    None => continue,
                },
            };
            total += force * self.config.weight(behavior);
        }
        total
    }
}
