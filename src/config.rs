//! Runtime flock configuration loaded from `assets/flock.toml`.
//!
//! [`FlockConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`] plus the per-behavior toggles and weights. At
//! startup, [`load_flock_config`] reads the file named by [`FlockConfigPath`]
//! (`assets/flock.toml` unless overridden) and overwrites the
//! defaults with any values present in the file. Missing keys fall back to
//! the compile-time defaults, so a minimal TOML can override just the values
//! you care about.
//!
//! ## Hot reload
//!
//! The resource is read once per tick. Any system (or a debugger) may change
//! it between ticks; the flock picks the new toggles and weights up on the
//! next step. Agent tunables (speed, force, radii) only affect boids spawned
//! after the change, since an agent's tunables are fixed at creation.

use std::path::{Path, PathBuf};

use crate::agent::AgentParams;
use crate::constants::*;
use crate::error::{FlockError, FlockResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Location of the optional override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/flock.toml";

/// The five steering behaviors, in the order a tick evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    Separation,
    Alignment,
    Cohesion,
    Seek,
    Wander,
}

impl Behavior {
    /// Fixed evaluation order within a tick.
    pub const ORDER: [Behavior; 5] = [
        Behavior::Separation,
        Behavior::Alignment,
        Behavior::Cohesion,
        Behavior::Seek,
        Behavior::Wander,
    ];

    /// Lowercase name, matching the `<label>_enabled` config keys.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Behavior::Separation => "separation",
            Behavior::Alignment => "alignment",
            Behavior::Cohesion => "cohesion",
            Behavior::Seek => "seek",
            Behavior::Wander => "wander",
        }
    }
}

/// How the seek behavior turns a target into a desired velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekMode {
    /// Full speed toward the target.
    #[default]
    Direct,
    /// Full speed outside `arrive_slowing_radius`, slowing linearly inside it.
    Arrive,
}

/// Runtime-tunable flock configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`. Override any subset by setting the value in
/// `assets/flock.toml`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    // ── Behavior Toggles ──────────────────────────────────────────────────────
    pub separation_enabled: bool,
    pub alignment_enabled: bool,
    pub cohesion_enabled: bool,
    pub seek_enabled: bool,
    pub wander_enabled: bool,

    // ── Behavior Weights ──────────────────────────────────────────────────────
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub seek_weight: f32,
    pub wander_weight: f32,

    // ── Seek ──────────────────────────────────────────────────────────────────
    pub seek_mode: SeekMode,
    pub arrive_slowing_radius: f32,

    // ── Agent Tunables ────────────────────────────────────────────────────────
    pub max_speed: f32,
    pub max_force: f32,
    pub boid_radius: f32,
    pub boid_mass: f32,
    pub wander_radius: f32,
    pub wander_lookahead: f32,

    // ── Force Shaping ─────────────────────────────────────────────────────────
    /// Zero the vertical component of every resultant force.
    pub planar_forces: bool,
    /// Give each new boid a random horizontal kick on its first tick.
    pub initial_heading: bool,

    // ── Population ────────────────────────────────────────────────────────────
    pub initial_boid_count: usize,
    pub spawn_half_extent_x: f32,
    pub spawn_half_extent_z: f32,

    // ── Scheduling / Determinism ──────────────────────────────────────────────
    /// Seed for spawn placement, initial headings and wander angles.
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub parallel_threshold: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            // Behavior Toggles
            separation_enabled: false,
            alignment_enabled: false,
            cohesion_enabled: false,
            seek_enabled: false,
            wander_enabled: false,
            // Behavior Weights
            separation_weight: SEPARATION_WEIGHT,
            alignment_weight: ALIGNMENT_WEIGHT,
            cohesion_weight: COHESION_WEIGHT,
            seek_weight: SEEK_WEIGHT,
            wander_weight: WANDER_WEIGHT,
            // Seek
            seek_mode: SeekMode::Direct,
            arrive_slowing_radius: ARRIVE_SLOWING_RADIUS,
            // Agent Tunables
            max_speed: MAX_SPEED,
            max_force: MAX_FORCE,
            boid_radius: BOID_RADIUS,
            boid_mass: BOID_MASS,
            wander_radius: WANDER_RADIUS,
            wander_lookahead: WANDER_LOOKAHEAD,
            // Force Shaping
            planar_forces: false,
            initial_heading: true,
            // Population
            initial_boid_count: INITIAL_BOID_COUNT,
            spawn_half_extent_x: SPAWN_HALF_EXTENT_X,
            spawn_half_extent_z: SPAWN_HALF_EXTENT_Z,
            // Scheduling / Determinism
            seed: None,
            parallel_threshold: PARALLEL_AGENT_THRESHOLD,
        }
    }
}

impl FlockConfig {
    /// Parses a TOML document; keys not present keep their defaults.
    pub fn from_toml_str(contents: &str) -> FlockResult<Self> {
        toml::from_str::<FlockConfig>(contents).map_err(|e| FlockError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FlockResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| FlockError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn is_enabled(&self, behavior: Behavior) -> bool {
        match behavior {
            Behavior::Separation => self.separation_enabled,
            Behavior::Alignment => self.alignment_enabled,
            Behavior::Cohesion => self.cohesion_enabled,
            Behavior::Seek => self.seek_enabled,
            Behavior::Wander => self.wander_enabled,
        }
    }

    pub fn set_enabled(&mut self, behavior: Behavior, enabled: bool) {
        match behavior {
            Behavior::Separation => self.separation_enabled = enabled,
            Behavior::Alignment => self.alignment_enabled = enabled,
            Behavior::Cohesion => self.cohesion_enabled = enabled,
            Behavior::Seek => self.seek_enabled = enabled,
            Behavior::Wander => self.wander_enabled = enabled,
        }
    }

    pub fn weight(&self, behavior: Behavior) -> f32 {
        match behavior {
            Behavior::Separation => self.separation_weight,
            Behavior::Alignment => self.alignment_weight,
            Behavior::Cohesion => self.cohesion_weight,
            Behavior::Seek => self.seek_weight,
            Behavior::Wander => self.wander_weight,
        }
    }

    /// Enabled behaviors in evaluation order.
    pub fn enabled_behaviors(&self) -> impl Iterator<Item = Behavior> + '_ {
        Behavior::ORDER
            .into_iter()
            .filter(move |behavior| self.is_enabled(*behavior))
    }

    /// Comma-separated labels of the enabled behaviors, for log lines.
    pub fn enabled_labels(&self) -> String {
        let labels: Vec<&str> = self.enabled_behaviors().map(Behavior::label).collect();
        if labels.is_empty() {
            "none".to_string()
        } else {
            labels.join(", ")
        }
    }

    /// Tunables for a boid spawned under this configuration.
    pub fn agent_params(&self) -> AgentParams {
        AgentParams {
            wander_radius: self.wander_radius,
            wander_lookahead: self.wander_lookahead,
            mass: self.boid_mass,
            ..AgentParams::from_radius(self.boid_radius, self.max_speed, self.max_force)
        }
    }
}

/// Where [`load_flock_config`] looks for the override file.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct FlockConfigPath(pub PathBuf);

impl Default for FlockConfigPath {
    fn default() -> Self {
        Self(PathBuf::from(CONFIG_PATH))
    }
}

/// Startup system: attempt to load the file at [`FlockConfigPath`] and
/// overwrite the `FlockConfig` resource with any values present in it.
///
/// Missing keys retain their compiled defaults. A parse error is logged and
/// the current configuration stays in place. A missing file is not an error.
pub fn load_flock_config(path: Res<FlockConfigPath>, mut config: ResMut<FlockConfig>) {
    let path = path.0.as_path();
    if !path.exists() {
        info!("No {} found; using compiled defaults", path.display());
        return;
    }
    match FlockConfig::load(path) {
        Ok(loaded) => {
            *config = loaded;
            info!("Loaded flock config from {}", path.display());
        }
        Err(e) => warn!("{e}; using defaults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = FlockConfig::default();
        assert_eq!(config.separation_weight, 2.0);
        assert_eq!(config.alignment_weight, 1.0);
        assert_eq!(config.cohesion_weight, 1.5);
        assert_eq!(config.seek_weight, 1.0);
        assert_eq!(config.wander_weight, 1.0);
        assert_eq!(config.enabled_behaviors().count(), 0);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = FlockConfig::from_toml_str(
            r#"
            separation_enabled = true
            cohesion_weight = 3.0
            seek_mode = "arrive"
            seed = 9
            "#,
        )
        .expect("valid toml");

        assert!(config.separation_enabled);
        assert!(!config.alignment_enabled);
        assert_eq!(config.cohesion_weight, 3.0);
        assert_eq!(config.separation_weight, SEPARATION_WEIGHT);
        assert_eq!(config.seek_mode, SeekMode::Arrive);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = FlockConfig::from_toml_str("separation_weight = \"heavy\"").unwrap_err();
        assert!(matches!(err, FlockError::ConfigParse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FlockConfig::load("does/not/exist.toml").unwrap_err();
        match err {
            FlockError::ConfigIo { path, .. } => assert_eq!(path, "does/not/exist.toml"),
            other => panic!("expected ConfigIo, got {other:?}"),
        }
    }

    #[test]
    fn enabled_behaviors_follow_fixed_order() {
        let mut config = FlockConfig::default();
        config.set_enabled(Behavior::Wander, true);
        config.set_enabled(Behavior::Separation, true);
        config.set_enabled(Behavior::Cohesion, true);
        let order: Vec<_> = config.enabled_behaviors().collect();
        assert_eq!(
            order,
            vec![Behavior::Separation, Behavior::Cohesion, Behavior::Wander]
        );
    }

    #[test]
    fn behavior_labels_match_config_keys() {
        let labels: Vec<_> = Behavior::ORDER.iter().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            vec!["separation", "alignment", "cohesion", "seek", "wander"]
        );
        let config = FlockConfig {
            seek_enabled: true,
            wander_enabled: true,
            ..FlockConfig::default()
        };
        assert_eq!(config.enabled_labels(), "seek, wander");
        assert_eq!(FlockConfig::default().enabled_labels(), "none");
    }

    #[test]
    fn agent_params_follow_config() {
        let config = FlockConfig {
            boid_radius: 1.0,
            max_speed: 5.0,
            max_force: 6.0,
            wander_radius: 3.0,
            ..FlockConfig::default()
        };
        let params = config.agent_params();
        assert_eq!(params.desired_separation, 2.0);
        assert_eq!(params.alignment_radius, 3.0);
        assert_eq!(params.max_speed, 5.0);
        assert_eq!(params.wander_radius, 3.0);
        assert_eq!(params.mass, config.boid_mass);
    }

    #[test]
    fn shipped_config_parses() {
        let shipped = include_str!("../assets/flock.toml");
        let config = FlockConfig::from_toml_str(shipped).expect("assets/flock.toml must parse");
        assert!(config.separation_enabled && config.alignment_enabled && config.cohesion_enabled);
    }
}
