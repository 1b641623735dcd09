//! Error types for the spring engine

use thiserror::Error;

/// Errors raised by spring construction, retargeting and time advancement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpringError {
    /// A resolved or merged configuration failed validation.
    #[error("invalid spring config: {field} = {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    /// Target values must be finite.
    #[error("invalid target value: {0}")]
    InvalidTarget(f64),

    /// Injected velocities must be finite.
    #[error("invalid velocity: {0}")]
    InvalidVelocity(f64),

    /// Time can only move forward.
    #[error("can't go back in time (delta {delta}ms)")]
    TimeTravel { delta: f64 },

    /// Time deltas must be finite.
    #[error("invalid time delta: {0}ms")]
    InvalidDelta(f64),

    /// The requested delta would need more 1ms sub-steps than allowed per call.
    #[error("spring simulation is too long ({steps} steps)")]
    SimulationTooLong { steps: u64 },

    /// Driven springs need a Tokio runtime to spawn their frame loop on.
    #[error("no tokio runtime available to drive the spring")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, SpringError>;
