use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier3d::prelude::*;
use boids::config::load_flock_config;
use boids::simulation::{
    enable_seek_system, spawn_initial_flock_system, Flock, FlockPlugin, FlockStepSet, SeekTarget,
};
use std::env;
use std::time::Duration;

/// Headless run parameters, read from the environment once at startup.
#[derive(Resource, Debug, Clone, Copy)]
struct RunSettings {
    /// Exit after this many flock ticks.
    max_ticks: u64,
    /// Log flock diagnostics every this many ticks.
    report_every: u64,
}

/// Configure Rapier physics: boids glide on a plane, so no gravity.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec3::ZERO;
    }
}

/// Moves the seek target around a circle so seeking boids have something to chase.
fn orbit_seek_target_system(time: Res<Time>, mut target: ResMut<SeekTarget>) {
    let angle = time.elapsed_secs() * 0.25;
    target.0 = Some(Vec3::new(150.0 * angle.cos(), 0.0, 150.0 * angle.sin()));
}

fn report_flock_system(flock: Res<Flock>, settings: Res<RunSettings>) {
    let ticks = flock.ticks();
    if ticks == 0 || ticks % settings.report_every != 0 {
        return;
    }
    info!(
        "tick {}: {} boids, centroid {:.1}, mean speed {:.2}",
        ticks,
        flock.len(),
        flock.centroid(),
        flock.mean_speed()
    );
}

fn exit_after_ticks_system(
    flock: Res<Flock>,
    settings: Res<RunSettings>,
    mut exit: MessageWriter<AppExit>,
) {
    if flock.ticks() >= settings.max_ticks {
        info!("Finished {} ticks", flock.ticks());
        exit.write(AppExit::Success);
    }
}

fn main() {
    let max_ticks = env::var("BOIDS_TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(600);
    let seek = env::var("BOIDS_SEEK").is_ok_and(|v| v == "1");

    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins(LogPlugin::default())
    .add_plugins(TransformPlugin)
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
    .add_plugins(FlockPlugin::default())
    .insert_resource(RunSettings {
        max_ticks,
        report_every: 60,
    })
    .add_systems(Startup, setup_physics_config)
    .add_systems(
        Update,
        (report_flock_system, exit_after_ticks_system).after(FlockStepSet),
    );

    if seek {
        app.add_systems(
            Startup,
            enable_seek_system
                .after(load_flock_config)
                .before(spawn_initial_flock_system),
        )
        .add_systems(Update, orbit_seek_target_system.before(FlockStepSet));
    }

    println!("Running headless flock for {} ticks", max_ticks);
    app.run();
}
