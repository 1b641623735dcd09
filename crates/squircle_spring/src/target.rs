//! Symbolic target translation
//!
//! UI code may ask a spring to head "all the way" in one direction by using
//! `±inf` as a target. Springs only accept finite targets, so the calling
//! layer maps those symbols onto the ends of a finite range first.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};

/// Finite range that `-inf`/`+inf` targets are mapped onto.
///
/// ```rust
/// use squircle_spring::TargetRange;
///
/// let range = TargetRange::new(0.0, 100.0).unwrap();
///
/// assert_eq!(range.resolve(f64::INFINITY).unwrap(), 100.0);
/// assert_eq!(range.resolve(f64::NEG_INFINITY).unwrap(), 0.0);
/// assert_eq!(range.resolve(42.0).unwrap(), 42.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    min: f64,
    max: f64,
}

impl TargetRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() {
            return Err(SpringError::InvalidTarget(min));
        }
        if !max.is_finite() || max < min {
            return Err(SpringError::InvalidTarget(max));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Map `±inf` onto the range ends. Finite values pass through untouched,
    /// they are not clamped.
    pub fn resolve(&self, value: f64) -> Result<f64> {
        if value.is_nan() {
            return Err(SpringError::InvalidTarget(value));
        }

        Ok(if value == f64::INFINITY {
            self.max
        } else if value == f64::NEG_INFINITY {
            self.min
        } else {
            value
        })
    }
}
