//! Flock-specific error types.
//!
//! Steering behaviors never fail: degenerate geometry resolves to a zero
//! force. Errors only surface at the edges of the simulation, when loading
//! configuration or looking an agent up by id.

use std::fmt;

use crate::agent::{AgentId, AgentParams};

/// Top-level error enum for the flocking simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum FlockError {
    /// A configuration file could not be read.
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },

    /// A configuration file was read but is not valid TOML for `FlockConfig`.
    ConfigParse {
        /// Parser error message, including line and column.
        message: String,
    },

    /// An agent id does not refer to a boid in this flock.
    UnknownAgent {
        /// The id that was looked up.
        id: AgentId,
    },

    /// A tunable is outside the range the steering model assumes.
    /// Returned by validation helpers; callers log it and carry on.
    DegenerateTunable {
        /// Name of the tunable (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the expected range.
        expected: &'static str,
    },
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlockError::ConfigIo { path, message } => {
                write!(f, "failed to read config '{}': {}", path, message)
            }
            FlockError::ConfigParse { message } => {
                write!(f, "failed to parse flock config: {}", message)
            }
            FlockError::UnknownAgent { id } => {
                write!(f, "agent {} is not part of this flock", id.0)
            }
            FlockError::DegenerateTunable {
                name,
                value,
                expected,
            } => write!(
                f,
                "tunable '{}' = {} is outside expected range {}",
                name, value, expected
            ),
        }
    }
}

impl std::error::Error for FlockError {}

/// Convenience alias: a `Result` using `FlockError` as the error type.
pub type FlockResult<T> = Result<T, FlockError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Checks the assumptions the steering model makes about an agent's tunables.
///
/// Reports the first violation found. Violations are accepted inputs: they
/// weaken steering (a force that cannot fully cancel the velocity, or a
/// neighbor radius nothing can fall inside) but never break it.
pub fn validate_agent_params(params: &AgentParams) -> FlockResult<()> {
    if params.max_speed > params.max_force {
        return Err(FlockError::DegenerateTunable {
            name: "max_speed",
            value: params.max_speed,
            expected: "<= max_force",
        });
    }
    let radii = [
        ("radius", params.radius),
        ("desired_separation", params.desired_separation),
        ("alignment_radius", params.alignment_radius),
        ("cohesion_radius", params.cohesion_radius),
    ];
    for (name, value) in radii {
        if !(value > 0.0) {
            return Err(FlockError::DegenerateTunable {
                name,
                value,
                expected: "(0.0, ∞)",
            });
        }
    }
    if !(params.mass > 0.0) {
        return Err(FlockError::DegenerateTunable {
            name: "mass",
            value: params.mass,
            expected: "(0.0, ∞)",
        });
    }
    Ok(())
}
