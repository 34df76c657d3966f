//! Steering-behavior flocking library
//!
//! A population of boids steered by five weighted behaviors (separation,
//! alignment, cohesion, seek and wander). The core ([`agent`], [`flock`]) is
//! plain data and pure force computation; bodies are moved by an injected
//! [`integrator::MotionIntegrator`], either the built-in Euler integrator or
//! Rapier through the Bevy [`simulation::FlockPlugin`].

pub mod agent;
pub mod config;
pub mod constants;
pub mod error;
pub mod flock;
pub mod integrator;
pub mod math;
pub mod simulation;
