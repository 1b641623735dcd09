//! Spring configuration
//!
//! [`SpringConfigInput`] is the partial, user-facing form: any subset of the
//! fields may be set. [`resolve`] fills the gaps with fixed defaults and
//! [`SpringConfig::validate`] rejects values the integrator cannot work with.
//! Both forms deserialize from JSON/TOML with the same field names.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};

pub const DEFAULT_STIFFNESS: f64 = 300.0;
pub const DEFAULT_DAMPING: f64 = 20.0;
pub const DEFAULT_MASS: f64 = 1.0;
pub const DEFAULT_PRECISION: f64 = 0.01;

/// Fully resolved spring configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Restoring force coefficient. Must be > 0.
    pub stiffness: f64,
    /// Velocity opposing force coefficient. Must be >= 0.
    pub damping: f64,
    /// Force divisor. `0` means the spring teleports to its target.
    pub mass: f64,
    /// Base precision used to derive the rest threshold of each transition.
    pub precision: f64,
    /// Forbid overshooting the target.
    pub clamp: bool,
}

impl SpringConfig {
    /// Resolve a partial input and validate the result.
    pub fn from_input(input: &SpringConfigInput) -> Result<Self> {
        let config = resolve(input);
        config.validate()?;
        Ok(config)
    }

    /// Soft, slow settling spring
    pub fn gentle() -> Self {
        Self {
            stiffness: 120.0,
            damping: 14.0,
            ..Self::default()
        }
    }

    /// Quick spring with a little bounce
    pub fn snappy() -> Self {
        Self {
            stiffness: 400.0,
            damping: 30.0,
            ..Self::default()
        }
    }

    /// Very stiff spring, settles almost immediately
    pub fn stiff() -> Self {
        Self {
            stiffness: 700.0,
            damping: 60.0,
            ..Self::default()
        }
    }

    /// Check that every field is inside the range the integrator supports.
    ///
    /// Non-finite values are rejected as well, a NaN would otherwise slip
    /// through the range comparisons.
    pub fn validate(&self) -> Result<()> {
        check("stiffness", self.stiffness, |v| v > 0.0)?;
        check("damping", self.damping, |v| v >= 0.0)?;
        check("mass", self.mass, |v| v >= 0.0)?;
        check("precision", self.precision, |v| v > 0.0)?;
        Ok(())
    }

    /// Overlay the fields set in `input` on top of this config.
    pub fn merged(&self, input: &SpringConfigInput) -> Self {
        Self {
            stiffness: input.stiffness.unwrap_or(self.stiffness),
            damping: input.damping.unwrap_or(self.damping),
            mass: input.mass.unwrap_or(self.mass),
            precision: input.precision.unwrap_or(self.precision),
            clamp: input.clamp.unwrap_or(self.clamp),
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: DEFAULT_STIFFNESS,
            damping: DEFAULT_DAMPING,
            mass: DEFAULT_MASS,
            precision: DEFAULT_PRECISION,
            clamp: false,
        }
    }
}

fn check(field: &'static str, value: f64, in_range: impl Fn(f64) -> bool) -> Result<()> {
    if value.is_finite() && in_range(value) {
        Ok(())
    } else {
        Err(SpringError::InvalidConfig { field, value })
    }
}

/// Partial spring configuration
///
/// # Example
///
/// ```rust
/// use squircle_spring::config::{SpringConfig, SpringConfigInput};
///
/// let input = SpringConfigInput::new()
///     .with_stiffness(450.0)
///     .with_damping(30.0)
///     .with_mass(3.0);
///
/// let config = SpringConfig::from_input(&input).unwrap();
/// assert_eq!(config.stiffness, 450.0);
/// assert!(!config.clamp);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpringConfigInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stiffness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clamp: Option<bool>,
}

impl SpringConfigInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = Some(clamp);
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<SpringConfig> for SpringConfigInput {
    fn from(config: SpringConfig) -> Self {
        Self {
            stiffness: Some(config.stiffness),
            damping: Some(config.damping),
            mass: Some(config.mass),
            precision: Some(config.precision),
            clamp: Some(config.clamp),
        }
    }
}

/// Fill unset fields with the engine defaults. Does not validate.
pub fn resolve(input: &SpringConfigInput) -> SpringConfig {
    SpringConfig::default().merged(input)
}
