//! Flock plugin and systems for Bevy ECS.
//!
//! The [`FlockCoordinator`] lives in the [`Flock`] resource and stays the
//! single source of truth for steering. Entities only carry the physics body
//! and a [`Boid`] link to their arena slot. Each frame:
//!
//! 1. configuration changes are pushed into the coordinator,
//! 2. queued [`SpawnBoid`] requests become agents and entities,
//! 3. the coordinator's copy of every body's motion is refreshed from Rapier,
//! 4. one tick runs and each final force is written to the entity's
//!    [`ExternalForce`], which Rapier integrates in `PostUpdate`.

use std::path::PathBuf;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::agent::{Agent, AgentId, MotionState};
use crate::config::{load_flock_config, Behavior, FlockConfig, FlockConfigPath, CONFIG_PATH};
use crate::flock::FlockCoordinator;
use crate::integrator::MotionIntegrator;

/// The flock coordinator as a Bevy resource.
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct Flock(pub FlockCoordinator);

/// World-space point the seek behavior steers toward this frame.
/// `None` skips seek, e.g. when the pointer is not over the ground.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct SeekTarget(pub Option<Vec3>);

/// Request to add a boid at planar `(x, z)` before the next tick.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SpawnBoid {
    pub x: f32,
    pub z: f32,
}

/// Links a physics body to its agent in the [`Flock`] arena.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boid(pub AgentId);

/// Systems that prepare and run one flock tick, in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlockStepSet;

pub struct FlockPlugin {
    /// TOML file read over the `FlockConfig` resource at startup.
    /// `None` keeps whatever configuration the app already holds.
    pub config_path: Option<PathBuf>,
}

impl Default for FlockPlugin {
    fn default() -> Self {
        Self {
            config_path: Some(PathBuf::from(CONFIG_PATH)),
        }
    }
}

impl Plugin for FlockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlockConfig>()
            .init_resource::<Flock>()
            .init_resource::<SeekTarget>()
            .add_message::<SpawnBoid>()
            .add_systems(
                Update,
                (
                    apply_config_changes_system,
                    handle_spawn_requests_system,
                    sync_boid_motion_system,
                    flock_step_system,
                )
                    .chain()
                    .in_set(FlockStepSet),
            );

        if let Some(path) = &self.config_path {
            app.insert_resource(FlockConfigPath(path.clone()));
            app.add_systems(
                Startup,
                (load_flock_config, spawn_initial_flock_system).chain(),
            );
        } else {
            app.add_systems(Startup, spawn_initial_flock_system);
        }
    }
}

/// Forwards each agent's final force into a per-agent slot, to be copied
/// onto the Rapier bodies after the tick.
#[derive(Debug, Default)]
pub struct RapierForceBridge {
    forces: Vec<Vec3>,
}

impl MotionIntegrator for RapierForceBridge {
    fn apply_force(&mut self, id: AgentId, _body: &mut MotionState, force: Vec3) {
        let index = id.index();
        if index >= self.forces.len() {
            self.forces.resize(index + 1, Vec3::ZERO);
        }
        self.forces[index] = force;
    }
}

/// Spawns the physics body for `agent`.
pub fn spawn_boid_entity(commands: &mut Commands, agent: &Agent) -> Entity {
    let params = agent.params();
    commands
        .spawn((
            Boid(agent.id()),
            RigidBody::Dynamic,
            Collider::ball(params.radius.max(0.01)),
            ColliderMassProperties::Mass(params.mass.max(0.01)),
            LockedAxes::TRANSLATION_LOCKED_Y | LockedAxes::ROTATION_LOCKED,
            Transform::from_translation(agent.position()),
            Velocity::linear(agent.velocity()),
            Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            ExternalForce::default(),
            Sleeping::disabled(),
        ))
        .id()
}

/// Startup system: build the coordinator from the loaded configuration and
/// scatter the initial population over the spawn rectangle.
pub fn spawn_initial_flock_system(
    mut commands: Commands,
    config: Res<FlockConfig>,
    mut flock: ResMut<Flock>,
) {
    flock.0 = FlockCoordinator::new(config.clone());
    let ids = flock.populate(config.initial_boid_count);
    for id in &ids {
        if let Ok(agent) = flock.agent(*id) {
            spawn_boid_entity(&mut commands, agent);
        }
    }
    info!(
        "Spawned initial flock of {} boids (behaviors: {})",
        ids.len(),
        config.enabled_labels()
    );
}

/// Startup system for runs that chase a [`SeekTarget`]: switches seek on
/// after the config file has been applied.
pub fn enable_seek_system(mut config: ResMut<FlockConfig>) {
    if !config.is_enabled(Behavior::Seek) {
        config.set_enabled(Behavior::Seek, true);
        info!("Enabled {} for this run", Behavior::Seek.label());
    }
}

/// Push toggle, weight and shaping changes into the coordinator between ticks.
pub fn apply_config_changes_system(config: Res<FlockConfig>, mut flock: ResMut<Flock>) {
    if config.is_changed() && flock.config() != &*config {
        flock.set_config(config.clone());
        debug!("Flock config reloaded (behaviors: {})", config.enabled_labels());
    }
}

/// Turn queued spawn requests into agents and bodies.
pub fn handle_spawn_requests_system(
    mut commands: Commands,
    mut requests: MessageReader<SpawnBoid>,
    mut flock: ResMut<Flock>,
) {
    for request in requests.read() {
        let id = flock.spawn(request.x, request.z);
        match flock.agent(id) {
            Ok(agent) => {
                spawn_boid_entity(&mut commands, agent);
                info!(
                    "Spawned boid {} at ({:.1}, {:.1})",
                    id.0, request.x, request.z
                );
            }
            Err(e) => error!("Failed to spawn boid: {}", e),
        }
    }
}

/// Refresh the coordinator's view of each body from the physics state.
pub fn sync_boid_motion_system(
    mut flock: ResMut<Flock>,
    bodies: Query<(&Boid, &Transform, &Velocity)>,
) {
    for (boid, transform, velocity) in bodies.iter() {
        let motion = MotionState {
            position: transform.translation,
            velocity: velocity.linvel,
        };
        if let Err(e) = flock.sync_motion(boid.0, motion) {
            warn!("Skipping body sync: {}", e);
        }
    }
}

/// Run one tick and hand every resultant force to its body.
///
/// `ExternalForce` persists across physics steps, so it is overwritten (not
/// accumulated) here: each tick contributes exactly one force per boid.
pub fn flock_step_system(
    mut flock: ResMut<Flock>,
    target: Res<SeekTarget>,
    mut bridge: Local<RapierForceBridge>,
    mut bodies: Query<(&Boid, &mut ExternalForce)>,
) {
    bridge.forces.clear();
    bridge.forces.resize(flock.len(), Vec3::ZERO);
    flock.step(target.0, &mut *bridge);

    for (boid, mut external) in bodies.iter_mut() {
        external.force = bridge
            .forces
            .get(boid.0.index())
            .copied()
            .unwrap_or(Vec3::ZERO);
    }
}
