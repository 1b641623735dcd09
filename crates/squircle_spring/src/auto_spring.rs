//! Frame driven spring
//!
//! [`AutoNumberSpring`] wraps a [`NumberSpring`] and advances it from a
//! [`FrameSource`] on a Tokio task. The task starts when a retarget moves the
//! spring out of rest and ends on its own once the spring rests again, so an
//! idle spring costs nothing.
//!
//! The spring state sits behind a mutex that is only locked between frame
//! waits. A retarget issued while the loop is suspended is therefore seen by
//! the very next integration step.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::config::{SpringConfig, SpringConfigInput};
use crate::error::{Result, SpringError};
use crate::frame::FrameSource;
use crate::number_spring::NumberSpring;

/// Frames a loop may run after a target change before the spring is forced to rest.
pub const MAX_FRAMES_WITHOUT_REST: u32 = 2000;

struct Inner {
    spring: NumberSpring,
    frames_since_target_change: u32,
    /// Whether a frame loop is running
    animating: watch::Sender<bool>,
    destroyed: bool,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spring whose clock is advanced by a frame source.
///
/// # Example
///
/// ```rust,no_run
/// use squircle_spring::{AutoNumberSpring, IntervalFrames, SpringConfigInput};
///
/// # async fn run() -> squircle_spring::Result<()> {
/// let spring = AutoNumberSpring::new(0.0, &SpringConfigInput::new(), IntervalFrames::default())?;
///
/// spring.set_target_value(100.0, None)?;
/// spring.wait_until_idle().await;
///
/// assert_eq!(spring.value(), 100.0);
/// # Ok(())
/// # }
/// ```
pub struct AutoNumberSpring<F: FrameSource> {
    shared: Shared,
    frames: Arc<F>,
    runtime: Handle,
}

impl<F: FrameSource> AutoNumberSpring<F> {
    /// Create a driven spring on the current Tokio runtime.
    pub fn new(initial_value: f64, input: &SpringConfigInput, frames: F) -> Result<Self> {
        Self::from_spring(NumberSpring::new(initial_value, input)?, frames)
    }

    /// Create a driven spring from a resolved config on the current Tokio runtime.
    pub fn with_config(initial_value: f64, config: SpringConfig, frames: F) -> Result<Self> {
        Self::from_spring(NumberSpring::with_config(initial_value, config)?, frames)
    }

    /// Drive an existing spring on the current Tokio runtime.
    pub fn from_spring(spring: NumberSpring, frames: F) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SpringError::NoRuntime)?;
        Ok(Self::with_runtime(spring, frames, runtime))
    }

    /// Drive an existing spring, spawning its frame loop on `runtime`.
    pub fn with_runtime(spring: NumberSpring, frames: F, runtime: Handle) -> Self {
        let (animating, _) = watch::channel(false);

        Self {
            shared: Arc::new(Mutex::new(Inner {
                spring,
                frames_since_target_change: 0,
                animating,
                destroyed: false,
            })),
            frames: Arc::new(frames),
            runtime,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.shared)
    }

    /// Current value. Reports a read to the spring's observer.
    pub fn value(&self) -> f64 {
        self.lock().spring.value()
    }

    pub fn velocity(&self) -> f64 {
        self.lock().spring.velocity()
    }

    pub fn target(&self) -> f64 {
        self.lock().spring.target()
    }

    pub fn time(&self) -> f64 {
        self.lock().spring.time()
    }

    pub fn config(&self) -> SpringConfig {
        *self.lock().spring.config()
    }

    pub fn settle_time(&self) -> f64 {
        self.lock().spring.settle_time()
    }

    pub fn is_at_rest(&self) -> bool {
        self.lock().spring.is_at_rest()
    }

    /// Whether a frame loop is currently running
    pub fn is_animating(&self) -> bool {
        *self.lock().animating.borrow()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    /// Frames advanced since the last target change
    pub fn frames_since_target_change(&self) -> u32 {
        self.lock().frames_since_target_change
    }

    /// Read access to the underlying spring
    pub fn with_spring<R>(&self, f: impl FnOnce(&NumberSpring) -> R) -> R {
        f(&self.lock().spring)
    }

    /// Retarget the spring, optionally overriding its velocity.
    ///
    /// Starts the frame loop if this moves the spring out of rest.
    pub fn set_target_value(&self, target: f64, velocity: Option<f64>) -> Result<()> {
        if let Some(velocity) = velocity {
            if !velocity.is_finite() {
                return Err(SpringError::InvalidVelocity(velocity));
            }
        }

        let mut inner = self.lock();

        if inner.destroyed {
            tracing::debug!(new_target = target, "ignoring retarget of a destroyed spring");
            return Ok(());
        }

        let was_at_rest = inner.spring.is_at_rest();

        inner.spring.set_target_value(target)?;

        if let Some(velocity) = velocity {
            inner.spring.set_velocity(velocity);
        }

        inner.frames_since_target_change = 0;

        let running = if was_at_rest && !inner.spring.is_at_rest() && !*inner.animating.borrow() {
            self.start_locked(&mut inner)
        } else {
            None
        };
        drop(inner);

        if let Some(running) = running {
            self.spawn_loop(running);
        }

        Ok(())
    }

    /// Jump to the current target. Does not start or stop the loop directly;
    /// a running loop sees the rest state on its next frame and exits.
    pub fn snap_to_target(&self) {
        let mut inner = self.lock();
        if !inner.destroyed {
            inner.spring.snap_to_target();
        }
    }

    /// Jump to `target`, making it the new target.
    pub fn snap_to(&self, target: f64) -> Result<()> {
        let mut inner = self.lock();
        if inner.destroyed {
            return Ok(());
        }
        inner.spring.snap_to(target)
    }

    pub fn update_config(&self, update: &SpringConfigInput) -> Result<()> {
        self.lock().spring.update_config(update)
    }

    /// Stop at the current value.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if !inner.destroyed {
            inner.spring.stop();
        }
    }

    /// Start the frame loop if the spring is moving.
    ///
    /// Only one loop runs per spring; asking for a second one logs a warning.
    pub fn start(&self) {
        let running = self.start_locked(&mut self.lock());

        if let Some(running) = running {
            self.spawn_loop(running);
        }
    }

    /// Raise the running flag. The returned flag must be handed to
    /// [`Self::spawn_loop`] once the lock is released.
    fn start_locked(&self, inner: &mut Inner) -> Option<RunningFlag> {
        if *inner.animating.borrow() {
            tracing::warn!("spring is already animating");
            return None;
        }

        if inner.destroyed || inner.spring.is_at_rest() {
            return None;
        }

        inner.animating.send_replace(true);
        inner.spring.notify_changed();

        tracing::trace!(to = inner.spring.target(), "spring loop started");

        Some(RunningFlag {
            shared: self.shared.clone(),
            finished: false,
        })
    }

    /// Must not be called with the lock held: a runtime that is shutting down
    /// drops the task, and with it the flag, inside `spawn`.
    fn spawn_loop(&self, running: RunningFlag) {
        let shared = self.shared.clone();
        let frames = self.frames.clone();
        self.runtime.spawn(animate_while_not_at_rest(shared, frames, running));
    }

    /// Stop the spring for good.
    ///
    /// The spring rests at its current value and a running loop exits the
    /// next time it wakes up. Later retargets are ignored. Calling this again
    /// does nothing.
    pub fn destroy(&self) {
        let mut inner = self.lock();

        if inner.destroyed {
            return;
        }

        inner.destroyed = true;
        inner.spring.stop();
    }

    /// Wait until no frame loop is running.
    pub async fn wait_until_idle(&self) {
        let mut animating = self.lock().animating.subscribe();
        let _ = animating.wait_for(|animating| !*animating).await;
    }
}

async fn animate_while_not_at_rest<F: FrameSource>(
    shared: Shared,
    frames: Arc<F>,
    mut running: RunningFlag,
) {
    let mut last_frame_time = frames.next_frame().await;

    loop {
        {
            let inner = lock(&shared);
            if inner.destroyed || inner.spring.is_at_rest() {
                running.finish(&inner);
                return;
            }
        }

        let time = frames.next_frame().await;

        let mut inner = lock(&shared);

        if inner.destroyed {
            running.finish(&inner);
            return;
        }

        let delta = time - last_frame_time;
        last_frame_time = time;

        if let Err(err) = inner.spring.advance_time_by(delta) {
            // Nobody to return this to from inside the loop
            tracing::error!(%err, delta, "spring frame failed, snapping to target");
            inner.spring.snap_to_target();
            continue;
        }

        inner.frames_since_target_change += 1;

        if inner.frames_since_target_change > MAX_FRAMES_WITHOUT_REST {
            tracing::warn!(
                frames = inner.frames_since_target_change,
                config = ?inner.spring.config(),
                "spring is not settling, snapping to target"
            );
            inner.spring.snap_to_target();
        }
    }
}

/// Owned by a frame loop for as long as it runs.
///
/// A loop that exits normally clears `animating` through [`RunningFlag::finish`].
/// If the task dies instead (a panicking frame source, a runtime that shuts
/// down or refuses the task), dropping the flag snaps the spring to its target
/// and clears `animating`, so the next retarget starts a fresh loop.
struct RunningFlag {
    shared: Shared,
    finished: bool,
}

impl RunningFlag {
    /// Called with the lock held so a concurrent retarget either lands before
    /// the final rest check or sees the loop as stopped.
    fn finish(&mut self, inner: &Inner) {
        self.finished = true;
        inner.animating.send_replace(false);
        tracing::trace!(time = inner.spring.time(), "spring loop finished");
    }
}

impl Drop for RunningFlag {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let mut inner = lock(&self.shared);

        tracing::warn!(
            time = inner.spring.time(),
            "spring loop ended before the spring came to rest, snapping to target"
        );

        if !inner.destroyed {
            inner.spring.snap_to_target();
        }
        inner.animating.send_replace(false);
    }
}
