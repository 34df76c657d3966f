//! Centralised flocking and steering constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//!
//! ## Tuning guidance
//!
//! Each constant includes the observable consequence of changing it.
//! [`crate::config::FlockConfig::default`] is built from these values, and
//! `assets/flock.toml` can override any subset at startup.

// ── Agent: Motion Caps ────────────────────────────────────────────────────────

/// Speed every steering behavior aims for (world units per second).
///
/// Desired velocities are always scaled to exactly this length.
/// Keep it at or below [`MAX_FORCE`] so one tick of force can cancel the
/// current velocity and redirect it completely.
pub const MAX_SPEED: f32 = 90.0;

/// Upper bound on the magnitude of any single behavior's force.
///
/// Lower values make boids sluggish to turn; higher values make them snap
/// onto new headings.
pub const MAX_FORCE: f32 = 100.0;

/// Default boid mass, copied into each agent's `AgentParams::mass`.
///
/// The Rapier bridge gives every body a collider of this mass.
/// `EulerIntegrator` takes its mass explicitly and does not read this.
pub const BOID_MASS: f32 = 1.0;

// ── Agent: Geometry ───────────────────────────────────────────────────────────

/// Physical radius of a boid body.
///
/// Neighbor radii are derived from it once at creation:
/// `desired_separation = r² + r`, `alignment_radius = cohesion_radius = r² + 2`.
/// With 2.5 that gives 8.75 for separation and 8.25 for alignment/cohesion.
pub const BOID_RADIUS: f32 = 2.5;

// ── Agent: Wander ─────────────────────────────────────────────────────────────

/// Radius of the circle around the predicted future position on which the
/// wander target is picked.
///
/// Larger values produce sharper, more erratic turns.
pub const WANDER_RADIUS: f32 = 60.0;

/// How many seconds ahead along the current velocity the wander circle sits.
///
/// Larger values smooth out the path because the random offset becomes
/// small relative to the lookahead distance.
pub const WANDER_LOOKAHEAD: f32 = 4.0;

// ── Behaviors: Default Weights ────────────────────────────────────────────────

/// Separation is weighted highest so crowding is resolved before heading.
pub const SEPARATION_WEIGHT: f32 = 2.0;
pub const ALIGNMENT_WEIGHT: f32 = 1.0;
pub const COHESION_WEIGHT: f32 = 1.5;
pub const SEEK_WEIGHT: f32 = 1.0;
pub const WANDER_WEIGHT: f32 = 1.0;

// ── Behaviors: Arrive ─────────────────────────────────────────────────────────

/// Distance from the seek target inside which arrive-mode seeking slows
/// down linearly to zero.
pub const ARRIVE_SLOWING_RADIUS: f32 = 50.0;

// ── Population ────────────────────────────────────────────────────────────────

/// Number of boids placed in the spawn rectangle at startup.
pub const INITIAL_BOID_COUNT: usize = 50;

/// Boids spawn with `x` drawn uniformly from `[-SPAWN_HALF_EXTENT_X, SPAWN_HALF_EXTENT_X)`.
pub const SPAWN_HALF_EXTENT_X: f32 = 200.0;

/// Boids spawn with `z` drawn uniformly from `[-SPAWN_HALF_EXTENT_Z, SPAWN_HALF_EXTENT_Z)`.
pub const SPAWN_HALF_EXTENT_Z: f32 = 200.0;

// ── Scheduling ────────────────────────────────────────────────────────────────

/// Flocks with at least this many boids compute their forces on the
/// compute task pool instead of the calling thread.
///
/// Below it the task hand-off costs more than the O(N²) scan it splits.
pub const PARALLEL_AGENT_THRESHOLD: usize = 256;

// ── Numerics ──────────────────────────────────────────────────────────────────

/// Squared length at or below which a vector is treated as zero (a length of 1e-5).
///
/// Normalizing such a vector yields the zero vector instead of NaN.
pub const EPSILON: f32 = 1.0e-10;
