//! Manually advanced spring
//!
//! [`NumberSpring`] is not tied to any timer. Callers move its clock forward
//! explicitly, which makes it usable for precomputing animation frames while
//! still allowing the target to change at any point along the way.
//!
//! This sits on the per-frame hot path, so no method allocates.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use crate::config::{SpringConfig, SpringConfigInput};
use crate::error::{Result, SpringError};
use crate::observer::ChangeObserver;
use crate::step::{derive_precision, spring_settle_time, step_spring, StepParams};

/// Scalar spring with an explicit simulation clock (milliseconds)
pub struct NumberSpring {
    config: SpringConfig,
    /// Time along the spring curve, zero based
    time: f64,
    last_target_change_time: f64,
    value: f64,
    velocity: f64,
    target: f64,
    /// Rest threshold of the current transition
    precision: f64,
    settle_time: Cell<Option<f64>>,
    last_config_update: Option<SpringConfigInput>,
    observer: Option<Arc<dyn ChangeObserver>>,
}

impl NumberSpring {
    /// Create a spring resting at `initial_value`.
    pub fn new(initial_value: f64, input: &SpringConfigInput) -> Result<Self> {
        Self::with_config(initial_value, crate::config::resolve(input))
    }

    /// Create a spring from an already resolved config.
    pub fn with_config(initial_value: f64, config: SpringConfig) -> Result<Self> {
        config.validate()?;

        if !initial_value.is_finite() {
            return Err(SpringError::InvalidTarget(initial_value));
        }

        Ok(Self {
            config,
            time: 0.0,
            last_target_change_time: 0.0,
            value: initial_value,
            velocity: 0.0,
            target: initial_value,
            precision: 1.0,
            settle_time: Cell::new(None),
            last_config_update: None,
            observer: None,
        })
    }

    /// Attach an observer for value read/write notifications.
    pub fn with_observer(mut self, observer: Arc<dyn ChangeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current value. Reports a read to the observer.
    pub fn value(&self) -> f64 {
        if let Some(observer) = &self.observer {
            observer.mark_read();
        }
        self.value
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Override the current velocity, e.g. to inject momentum from a gesture.
    pub fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Simulation time at which the target last changed
    pub fn last_target_change_time(&self) -> f64 {
        self.last_target_change_time
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Rest threshold derived for the current transition
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// At rest only on exact equality; the integrator snaps to get there.
    pub fn is_at_rest(&self) -> bool {
        self.value == self.target && self.velocity == 0.0
    }

    /// Retarget the spring. Equal targets are ignored.
    pub fn set_target_value(&mut self, target: f64) -> Result<()> {
        if self.target == target {
            return Ok(());
        }

        if !target.is_finite() {
            return Err(SpringError::InvalidTarget(target));
        }

        self.last_target_change_time = self.time;
        self.precision = derive_precision(self.value, target, self.config.precision);
        self.target = target;

        Ok(())
    }

    /// Jump to the current target and stop.
    ///
    /// Always notifies the observer, even if the value did not change.
    pub fn snap_to_target(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
        self.notify_changed();
    }

    /// Jump to `target`, making it the new target, and stop.
    pub fn snap_to(&mut self, target: f64) -> Result<()> {
        if !target.is_finite() {
            return Err(SpringError::InvalidTarget(target));
        }

        self.target = target;
        self.snap_to_target();
        Ok(())
    }

    /// Merge `update` into the current config.
    ///
    /// Repeating the last applied update is a no-op. A failing update leaves
    /// the spring untouched.
    pub fn update_config(&mut self, update: &SpringConfigInput) -> Result<()> {
        if self.last_config_update.as_ref() == Some(update) {
            return Ok(());
        }

        let config = self.config.merged(update);
        config.validate()?;

        tracing::debug!(?config, "spring config updated");

        self.config = config;
        self.last_config_update = Some(*update);
        self.settle_time.set(None);

        Ok(())
    }

    /// Estimated settle time of the current config, computed lazily.
    pub fn settle_time(&self) -> f64 {
        if let Some(settle_time) = self.settle_time.get() {
            return settle_time;
        }

        let settle_time = spring_settle_time(&self.config);
        self.settle_time.set(Some(settle_time));
        settle_time
    }

    /// Advance the clock to an absolute time.
    pub fn advance_time_to(&mut self, time: f64) -> Result<()> {
        self.advance_time_by(time - self.time)
    }

    /// Advance the clock by `delta` milliseconds.
    pub fn advance_time_by(&mut self, delta: f64) -> Result<()> {
        if delta == 0.0 {
            return Ok(());
        }

        if !delta.is_finite() {
            return Err(SpringError::InvalidDelta(delta));
        }

        if delta < 0.0 {
            return Err(SpringError::TimeTravel { delta });
        }

        if self.is_at_rest() {
            self.time += delta;
            return Ok(());
        }

        // Past the settle time or with zero mass there is nothing to simulate
        if delta >= self.settle_time() || self.config.mass == 0.0 {
            self.time += delta;
            self.snap_to_target();
            return Ok(());
        }

        let params = StepParams::new(&self.config, self.target, self.precision);
        let (value, velocity) = step_spring(delta, self.value, self.velocity, &params)?;

        self.time += delta;

        if !value.is_finite() || !velocity.is_finite() {
            tracing::warn!(
                value,
                velocity,
                config = ?self.config,
                "spring integration diverged, snapping to target"
            );
            self.snap_to_target();
            return Ok(());
        }

        self.value = value;
        self.velocity = velocity;
        self.notify_changed();

        Ok(())
    }

    /// Stop at the current value.
    pub fn stop(&mut self) {
        // value is always finite, so retargeting to it can't fail
        let _ = self.set_target_value(self.value);
        self.snap_to_target();
    }

    pub(crate) fn notify_changed(&self) {
        if let Some(observer) = &self.observer {
            observer.mark_changed();
        }
    }
}

impl fmt::Debug for NumberSpring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberSpring")
            .field("value", &self.value)
            .field("velocity", &self.velocity)
            .field("target", &self.target)
            .field("time", &self.time)
            .field("precision", &self.precision)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
