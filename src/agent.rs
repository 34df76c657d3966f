//! Steering agents and their per-behavior force computations.
//!
//! An [`Agent`] is plain data: tunables fixed at creation plus a copy of the
//! motion state owned by whatever integrates it. Every behavior reads the
//! agent and a read-only slice of the whole flock (the agent itself
//! included) and returns a force already capped to `max_force`. Nothing here
//! mutates an agent; the coordinator forwards the summed force to the
//! integrator.
//!
//! Neighbor scans are brute force over the slice. A neighbor is any other
//! agent strictly inside the behavior's radius at a non-zero distance, so an
//! agent never counts itself (nor anything sitting exactly on top of it).

use std::f32::consts::TAU;

use bevy::math::Vec3;
use rand::Rng;

use crate::constants::{
    BOID_MASS, BOID_RADIUS, MAX_FORCE, MAX_SPEED, WANDER_LOOKAHEAD, WANDER_RADIUS,
};
use crate::math::{limit_magnitude, normalize_or_zero, point_on_circle_xz};

/// Stable arena index of an agent, assigned in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl AgentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position and velocity as last reported by the motion integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl MotionState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
        }
    }
}

/// Per-agent tunables, fixed for the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParams {
    /// Length of every desired velocity.
    pub max_speed: f32,
    /// Cap on the magnitude of every behavior's force.
    pub max_force: f32,
    /// Physical (collision) radius the neighbor radii are derived from.
    pub radius: f32,
    pub desired_separation: f32,
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub wander_radius: f32,
    /// Seconds ahead along the current velocity where the wander circle sits.
    pub wander_lookahead: f32,
    pub mass: f32,
}

impl AgentParams {
    /// Derives the neighbor radii from the body radius.
    ///
    /// All three are deliberately larger than the collision radius so boids
    /// react before they touch: separation uses `r² + r`, alignment and
    /// cohesion use `r² + 2`.
    pub fn from_radius(radius: f32, max_speed: f32, max_force: f32) -> Self {
        let r_sq = radius * radius;
        Self {
            max_speed,
            max_force,
            radius,
            desired_separation: r_sq + radius,
            alignment_radius: r_sq + 2.0,
            cohesion_radius: r_sq + 2.0,
            wander_radius: WANDER_RADIUS,
            wander_lookahead: WANDER_LOOKAHEAD,
            mass: BOID_MASS,
        }
    }
}

impl Default for AgentParams {
    fn default() -> Self {
        Self::from_radius(BOID_RADIUS, MAX_SPEED, MAX_FORCE)
    }
}

/// A single boid.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: AgentId,
    params: AgentParams,
    motion: MotionState,
}

impl Agent {
    pub fn new(id: AgentId, params: AgentParams, motion: MotionState) -> Self {
        Self { id, params, motion }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    #[inline]
    pub fn motion(&self) -> MotionState {
        self.motion
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.motion.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.motion.velocity
    }

    /// Mutable access for the integrator hand-off. Behaviors never use it.
    pub(crate) fn motion_mut(&mut self) -> &mut MotionState {
        &mut self.motion
    }

    /// Agents in `flock` strictly within `radius`, with the offset pointing
    /// from the neighbor to `self` and its length.
    fn neighbors<'a>(
        &'a self,
        flock: &'a [Agent],
        radius: f32,
    ) -> impl Iterator<Item = (&'a Agent, Vec3, f32)> + 'a {
        let position = self.motion.position;
        flock.iter().filter_map(move |other| {
            let offset = position - other.motion.position;
            let distance = offset.length();
            (distance > 0.0 && distance < radius).then_some((other, offset, distance))
        })
    }

    /// Steers away from neighbors closer than `desired_separation`.
    ///
    /// Each neighbor pushes along the unit offset scaled by `1 / distance`,
    /// so the closest neighbors dominate.
    pub fn separate(&self, flock: &[Agent]) -> Vec3 {
        let mut total = Vec3::ZERO;
        let mut count = 0usize;
        for (_, offset, distance) in self.neighbors(flock, self.params.desired_separation) {
            total += normalize_or_zero(offset) / distance;
            count += 1;
        }
        if count == 0 {
            return Vec3::ZERO;
        }

        let average = total / count as f32;
        let desired = normalize_or_zero(average) * self.params.max_speed;
        limit_magnitude(desired - self.motion.velocity, self.params.max_force)
    }

    /// Pulls toward the average heading of neighbors within `alignment_radius`.
    ///
    /// Returns the target heading scaled to `max_speed` as-is, without
    /// subtracting the current velocity.
    pub fn align(&self, flock: &[Agent]) -> Vec3 {
        let mut total = Vec3::ZERO;
        let mut count = 0usize;
        for (other, _, _) in self.neighbors(flock, self.params.alignment_radius) {
            total += normalize_or_zero(other.motion.velocity);
            count += 1;
        }
        if count == 0 {
            return Vec3::ZERO;
        }

        let average = total / count as f32;
        let heading = normalize_or_zero(average) * self.params.max_speed;
        limit_magnitude(heading, self.params.max_force)
    }

    /// Seeks the average unit heading of neighbors within `cohesion_radius`.
    ///
    /// The average is of neighbor velocities, not positions, and is passed
    /// to [`Agent::seek`] as if it were a world-space point.
    pub fn cohere(&self, flock: &[Agent]) -> Vec3 {
        let mut total = Vec3::ZERO;
        let mut count = 0usize;
        for (other, _, _) in self.neighbors(flock, self.params.cohesion_radius) {
            total += normalize_or_zero(other.motion.velocity);
            count += 1;
        }
        if count == 0 {
            return Vec3::ZERO;
        }

        self.seek(total / count as f32)
    }

    /// Steers toward `target` at full speed.
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let steer = self.desired_velocity(target) - self.motion.velocity;
        limit_magnitude(steer, self.params.max_force)
    }

    /// Like [`Agent::seek`], but the desired speed falls off linearly inside
    /// `slowing_radius` so the agent settles on the target instead of
    /// orbiting it.
    pub fn arrive(&self, target: Vec3, slowing_radius: f32) -> Vec3 {
        let offset = target - self.motion.position;
        let speed = if slowing_radius > 0.0 {
            (offset.length() / slowing_radius).min(1.0) * self.params.max_speed
        } else {
            self.params.max_speed
        };
        let steer = normalize_or_zero(offset) * speed - self.motion.velocity;
        limit_magnitude(steer, self.params.max_force)
    }

    /// Wanders toward a random point on the wander circle.
    pub fn wander<R: Rng>(&self, rng: &mut R) -> Vec3 {
        self.wander_at(draw_wander_angle(rng))
    }

    /// Wanders toward the point at `angle` radians on the horizontal circle
    /// of `wander_radius` around the predicted future position.
    pub fn wander_at(&self, angle: f32) -> Vec3 {
        let target = point_on_circle_xz(self.future_position(), self.params.wander_radius, angle);
        limit_magnitude(self.seek(target), self.params.max_force)
    }

    /// Where the agent will be after `wander_lookahead` seconds at its current velocity.
    pub fn future_position(&self) -> Vec3 {
        self.motion.position + self.motion.velocity * self.params.wander_lookahead
    }

    /// Unit direction to `target` scaled to `max_speed`; zero when already there.
    pub fn desired_velocity(&self, target: Vec3) -> Vec3 {
        normalize_or_zero(target - self.motion.position) * self.params.max_speed
    }

    /// A kick of up to `max_force` in a random horizontal direction, drawn
    /// uniformly from the unit disk.
    pub fn initial_heading<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let angle = rng.gen_range(0.0..TAU);
        let r = rng.gen::<f32>().sqrt();
        let (sin, cos) = angle.sin_cos();
        Vec3::new(r * cos, 0.0, r * sin) * self.params.max_force
    }
}

/// Uniform angle in `[0°, 360°)`, returned in radians.
pub fn draw_wander_angle<R: Rng>(rng: &mut R) -> f32 {
    rng.gen_range(0.0f32..360.0).to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOL: f32 = 1.0e-4;

    fn params(max_speed: f32, max_force: f32, desired_separation: f32) -> AgentParams {
        AgentParams {
            max_speed,
            max_force,
            desired_separation,
            ..AgentParams::default()
        }
    }

    fn agent_at(id: u32, params: AgentParams, position: Vec3, velocity: Vec3) -> Agent {
        Agent::new(AgentId(id), params, MotionState { position, velocity })
    }

    // ── Derived radii ─────────────────────────────────────────────────────────

    #[test]
    fn radii_derive_from_body_radius() {
        let p = AgentParams::from_radius(2.0, 90.0, 100.0);
        assert_eq!(p.desired_separation, 6.0);
        assert_eq!(p.alignment_radius, 6.0);
        assert_eq!(p.cohesion_radius, 6.0);

        let p = AgentParams::from_radius(0.5, 90.0, 100.0);
        assert_eq!(p.desired_separation, 0.75);
        assert_eq!(p.alignment_radius, 2.25);
    }

    // ── Separate ──────────────────────────────────────────────────────────────

    #[test]
    fn separate_pushes_pair_apart_along_x() {
        let p = params(10.0, 10.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::X, Vec3::ZERO),
        ];

        let f0 = flock[0].separate(&flock);
        let f1 = flock[1].separate(&flock);

        assert!(f0.x < 0.0, "left agent should be pushed toward -x, got {f0}");
        assert!(f1.x > 0.0, "right agent should be pushed toward +x, got {f1}");
        assert!(f0.y.abs() < TOL && f0.z.abs() < TOL);
        assert!(f0.length() <= 10.0 + TOL);
        assert!((f0.length() - 10.0).abs() < TOL);
    }

    #[test]
    fn separate_ignores_agents_beyond_desired_separation() {
        let p = params(10.0, 10.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO),
        ];
        assert_eq!(flock[0].separate(&flock), Vec3::ZERO);
    }

    #[test]
    fn separate_skips_coincident_agents() {
        let p = params(10.0, 10.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ONE, Vec3::ZERO),
            agent_at(1, p, Vec3::ONE, Vec3::ZERO),
        ];
        let f = flock[0].separate(&flock);
        assert_eq!(f, Vec3::ZERO);
        assert!(f.is_finite());
    }

    #[test]
    fn separate_subtracts_current_velocity() {
        let p = params(10.0, 100.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)),
            agent_at(1, p, Vec3::X, Vec3::ZERO),
        ];
        let f = flock[0].separate(&flock);
        assert!((f - Vec3::new(-10.0, 0.0, -3.0)).length() < TOL);
    }

    #[test]
    fn separate_weights_closer_neighbors_more() {
        let p = params(10.0, 100.0, 4.0);
        // Near neighbor on +x, far one on -z: the push is mostly along -x.
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO),
            agent_at(2, p, Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO),
        ];
        let f = flock[0].separate(&flock);
        assert!(f.x < 0.0 && f.z > 0.0);
        assert!(f.x.abs() > f.z.abs());
    }

    // ── Align ─────────────────────────────────────────────────────────────────

    #[test]
    fn align_is_absolute_heading_not_delta() {
        let p = params(10.0, 100.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)),
            agent_at(1, p, Vec3::X, Vec3::new(2.0, 0.0, 0.0)),
        ];
        let f = flock[0].align(&flock);
        assert!((f - Vec3::new(10.0, 0.0, 0.0)).length() < TOL);
    }

    #[test]
    fn align_with_opposing_neighbors_is_zero() {
        let p = params(10.0, 100.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::X, Vec3::new(1.0, 0.0, 0.0)),
            agent_at(2, p, -Vec3::X, Vec3::new(-1.0, 0.0, 0.0)),
        ];
        assert_eq!(flock[0].align(&flock), Vec3::ZERO);
    }

    #[test]
    fn align_is_capped_to_max_force() {
        let p = params(90.0, 50.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::X, Vec3::new(0.0, 0.0, 1.0)),
        ];
        assert!((flock[0].align(&flock).length() - 50.0).abs() < TOL);
    }

    // ── Cohere ────────────────────────────────────────────────────────────────

    #[test]
    fn cohere_seeks_average_neighbor_heading() {
        let p = params(10.0, 100.0, 4.0);
        let flock = vec![
            agent_at(0, p, Vec3::ZERO, Vec3::ZERO),
            agent_at(1, p, Vec3::X, Vec3::new(0.0, 0.0, 7.0)),
        ];
        // Average unit heading is (0, 0, 1), treated as a point.
        let expected = flock[0].seek(Vec3::Z);
        assert_eq!(flock[0].cohere(&flock), expected);
        assert!((expected - Vec3::new(0.0, 0.0, 10.0)).length() < TOL);
    }

    #[test]
    fn cohere_alone_is_zero() {
        let flock = vec![agent_at(0, AgentParams::default(), Vec3::ONE, Vec3::X)];
        assert_eq!(flock[0].cohere(&flock), Vec3::ZERO);
    }

    // ── Seek / Arrive ─────────────────────────────────────────────────────────

    #[test]
    fn seek_at_own_position_while_still_is_zero() {
        let a = agent_at(0, AgentParams::default(), Vec3::new(3.0, 1.0, 3.0), Vec3::ZERO);
        let f = a.seek(Vec3::new(3.0, 1.0, 3.0));
        assert_eq!(f, Vec3::ZERO);
    }

    #[test]
    fn seek_cancels_velocity_and_redirects() {
        let p = params(10.0, 100.0, 4.0);
        let a = agent_at(0, p, Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        let f = a.seek(Vec3::new(50.0, 0.0, 0.0));
        assert!((f - Vec3::new(10.0, 0.0, -4.0)).length() < TOL);
    }

    #[test]
    fn seek_is_capped_to_max_force() {
        let p = params(90.0, 20.0, 4.0);
        let a = agent_at(0, p, Vec3::ZERO, -Vec3::X * 50.0);
        let f = a.seek(Vec3::X * 100.0);
        assert!((f.length() - 20.0).abs() < TOL);
        assert!(f.x > 0.0);
    }

    #[test]
    fn arrive_slows_inside_radius() {
        let p = params(10.0, 100.0, 4.0);
        let a = agent_at(0, p, Vec3::ZERO, Vec3::ZERO);
        let near = a.arrive(Vec3::new(5.0, 0.0, 0.0), 50.0);
        let far = a.arrive(Vec3::new(500.0, 0.0, 0.0), 50.0);
        assert!((near.length() - 1.0).abs() < TOL);
        assert!((far.length() - 10.0).abs() < TOL);
    }

    #[test]
    fn arrive_with_zero_radius_behaves_like_seek() {
        let p = params(10.0, 100.0, 4.0);
        let a = agent_at(0, p, Vec3::ZERO, Vec3::new(1.0, 0.0, 2.0));
        let target = Vec3::new(-3.0, 0.0, 8.0);
        assert!((a.arrive(target, 0.0) - a.seek(target)).length() < TOL);
    }

    // ── Wander ────────────────────────────────────────────────────────────────

    #[test]
    fn wander_at_targets_point_on_circle_ahead() {
        let p = params(10.0, 100.0, 4.0);
        let a = agent_at(0, p, Vec3::ZERO, Vec3::ZERO);
        // Still agent: future position is its own, angle 0 lands on +x.
        let f = a.wander_at(0.0);
        assert!((f - Vec3::new(10.0, 0.0, 0.0)).length() < TOL);
    }

    #[test]
    fn wander_keeps_height() {
        let a = agent_at(0, AgentParams::default(), Vec3::new(0.0, 2.5, 0.0), Vec3::X);
        for step in 0..8 {
            let f = a.wander_at(step as f32 * 0.8);
            assert!((f.y - 0.0).abs() < TOL, "wander should stay horizontal, got {f}");
        }
    }

    #[test]
    fn wander_is_reproducible_with_a_seed() {
        let a = agent_at(0, AgentParams::default(), Vec3::ZERO, Vec3::new(3.0, 0.0, 1.0));
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            assert_eq!(a.wander(&mut rng_a), a.wander(&mut rng_b));
        }
    }

    #[test]
    fn wander_angles_cover_full_turn() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let angle = draw_wander_angle(&mut rng);
            assert!((0.0..TAU).contains(&angle));
        }
    }

    // ── Initial heading ───────────────────────────────────────────────────────

    #[test]
    fn initial_heading_is_horizontal_and_bounded() {
        let a = agent_at(0, AgentParams::default(), Vec3::ZERO, Vec3::ZERO);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let kick = a.initial_heading(&mut rng);
            assert_eq!(kick.y, 0.0);
            assert!(kick.length() <= a.params().max_force + TOL);
        }
    }

    // ── Bounds ────────────────────────────────────────────────────────────────

    #[test]
    fn every_behavior_respects_max_force() {
        let p = params(90.0, 100.0, 8.75);
        let mut rng = StdRng::seed_from_u64(5);
        let flock: Vec<Agent> = (0..24)
            .map(|i| {
                let position = Vec3::new(
                    rng.gen_range(-6.0..6.0),
                    0.0,
                    rng.gen_range(-6.0..6.0),
                );
                let velocity = Vec3::new(
                    rng.gen_range(-200.0..200.0),
                    0.0,
                    rng.gen_range(-200.0..200.0),
                );
                agent_at(i, p, position, velocity)
            })
            .collect();

        for agent in &flock {
            let cap = agent.params().max_force + TOL;
            assert!(agent.separate(&flock).length() <= cap);
            assert!(agent.align(&flock).length() <= cap);
            assert!(agent.cohere(&flock).length() <= cap);
            assert!(agent.seek(Vec3::new(40.0, 0.0, -40.0)).length() <= cap);
            assert!(agent.arrive(Vec3::new(1.0, 0.0, 1.0), 50.0).length() <= cap);
            assert!(agent.wander(&mut rng).length() <= cap);
        }
    }
}
