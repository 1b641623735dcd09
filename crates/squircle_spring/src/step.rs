//! Spring integration
//!
//! Semi-implicit Euler integration of a damped harmonic oscillator. A frame is
//! never integrated in one go: [`step_spring`] samples it in 1ms sub-steps so
//! the restoring force can change direction when the spring crosses its
//! target mid-frame. Without that, an overshoot inside a single 16ms frame
//! keeps accelerating on the far side and the final wiggle is lost.
//!
//! All functions here are pure and allocation free; state goes in and out by
//! value.

use crate::config::SpringConfig;
use crate::error::{Result, SpringError};

/// Upper bound on 1ms sub-steps per [`step_spring`] call (~10 simulated seconds).
pub const MAX_STEPS_PER_CALL: u64 = 10_000;

/// Distance of the canonical transition used by [`spring_settle_time`].
pub const SETTLE_REFERENCE_DISTANCE: f64 = 1000.0;

/// Settle time estimation gives up after this many simulated milliseconds.
pub const MAX_SETTLE_TIME_MS: f64 = 20_000.0;

const SETTLE_FRAME_MS: f64 = 1000.0 / 60.0;
const SETTLE_START_VELOCITY: f64 = 0.000_001;

/// Ulps of headroom in [`rest_floor`]. A 1ms sub-step stops moving `x` once
/// `|v| * 0.001` drops under half an ulp, so velocity can freeze at up to
/// 500 ulps; this sits above that.
const REST_FLOOR_ULPS: f64 = 1024.0;

/// Everything a single integration step needs besides the moving state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub target: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    pub clamp: bool,
    /// Rest threshold for both distance and velocity
    pub precision: f64,
}

impl StepParams {
    /// `precision` is raised to [`rest_floor`] for `config` and `target`.
    pub fn new(config: &SpringConfig, target: f64, precision: f64) -> Self {
        Self {
            target,
            stiffness: config.stiffness,
            damping: config.damping,
            mass: config.mass,
            clamp: config.clamp,
            precision: precision.max(rest_floor(config, target)),
        }
    }
}

/// Rest threshold for a transition from `from` to `to`.
///
/// Long jumps tolerate a looser threshold than short ones.
pub fn derive_precision(from: f64, to: f64, precision_base: f64) -> f64 {
    if from == to {
        return 1.0;
    }

    (from - to).abs().max(1.0) * precision_base
}

/// Smallest rest threshold that sub-stepped integration toward `target` can
/// still get under.
///
/// Near a large target, `x` moves in ulp-sized increments and can freeze a few
/// hundred ulps off with a small residual velocity. A frozen velocity is
/// bounded by [`REST_FLOOR_ULPS`] ulps and the matching offset by that times
/// `damping / stiffness`, so both stay under this floor and the snap in
/// [`step_once`] fires. Configs that never decay (no damping) or decay slower
/// than the caller advances still rely on the settle-time shortcut or the
/// driven spring's frame watchdog.
pub fn rest_floor(config: &SpringConfig, target: f64) -> f64 {
    let ulp = f64::EPSILON * target.abs().max(1.0);
    let ratio = if config.stiffness > 0.0 {
        (config.damping / config.stiffness).max(1.0)
    } else {
        1.0
    };

    REST_FLOOR_ULPS * ulp * ratio
}

/// Advance `(x, v)` by `delta_ms` in a single step.
///
/// Snaps to `(target, 0)` when clamping forbids crossing the target, or when
/// both the distance and the velocity drop under the precision threshold.
#[inline]
pub fn step_once(delta_ms: f64, x: f64, v: f64, params: &StepParams) -> (f64, f64) {
    let delta_s = delta_ms / 1000.0;
    let target = params.target;

    let spring_force = -(x - target) * params.stiffness;
    let damping_force = -v * params.damping;
    let acceleration = (spring_force + damping_force) / params.mass;

    let new_v = v + acceleration * delta_s;
    let new_x = x + new_v * delta_s;

    if params.clamp && ((x < target && new_x > target) || (x > target && new_x < target)) {
        return (target, 0.0);
    }

    if new_v.abs() < params.precision && (new_x - target).abs() < params.precision {
        return (target, 0.0);
    }

    (new_x, new_v)
}

/// Advance `(x, v)` by `delta_ms` using 1ms sub-steps.
///
/// The last iteration covers the fractional leftover (`i - delta_ms` once `i`
/// passes `delta_ms`). Fails with [`SpringError::SimulationTooLong`] when
/// `ceil(delta_ms)` exceeds [`MAX_STEPS_PER_CALL`].
pub fn step_spring(delta_ms: f64, x: f64, v: f64, params: &StepParams) -> Result<(f64, f64)> {
    let upper = delta_ms.ceil();

    if upper > MAX_STEPS_PER_CALL as f64 {
        return Err(SpringError::SimulationTooLong {
            steps: upper as u64,
        });
    }

    let (mut x, mut v) = (x, v);
    let steps = upper.max(0.0) as u64;

    for i in 1..=steps {
        let i = i as f64;
        let step_ms = if i > delta_ms { i - delta_ms } else { 1.0 };

        (x, v) = step_once(step_ms, x, v, params);

        // At rest every further step is the identity
        if x == params.target && v == 0.0 {
            break;
        }
    }

    Ok((x, v))
}

/// Estimated time in ms for `config` to bring a spring to exact rest.
///
/// Simulates a 0 -> 1000 transition in 60fps frames until it snaps to rest,
/// diverges, or runs past [`MAX_SETTLE_TIME_MS`]. Zero mass settles instantly.
pub fn spring_settle_time(config: &SpringConfig) -> f64 {
    if config.mass == 0.0 {
        return 0.0;
    }

    let target = SETTLE_REFERENCE_DISTANCE;
    let mut x = 0.0;
    let mut v = SETTLE_START_VELOCITY;

    let precision = derive_precision(x, target, config.precision);
    let params = StepParams::new(config, target, precision);

    let mut duration = 0.0;

    while !(x == target && v == 0.0) {
        (x, v) = step_once(SETTLE_FRAME_MS, x, v, &params);

        if !x.is_finite() || !v.is_finite() {
            tracing::debug!(?config, duration, "settle time simulation diverged");
            break;
        }

        duration += SETTLE_FRAME_MS;

        if duration > MAX_SETTLE_TIME_MS {
            tracing::debug!(?config, "settle time simulation hit the ceiling");
            break;
        }
    }

    duration
}
