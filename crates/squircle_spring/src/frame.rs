//! Frame timing sources
//!
//! A driven spring pulls timestamps from a [`FrameSource`], one per display
//! refresh. Timestamps are milliseconds and must increase monotonically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Resolves once per frame with a monotonically increasing timestamp (ms).
pub trait FrameSource: Send + Sync + 'static {
    fn next_frame(&self) -> impl Future<Output = f64> + Send;
}

/// Many springs can share one source.
impl<F: FrameSource> FrameSource for Arc<F> {
    fn next_frame(&self) -> impl Future<Output = f64> + Send {
        (**self).next_frame()
    }
}

/// Timer backed frame source ticking at a fixed refresh rate.
///
/// Frames are aligned to the grid `origin + n * period`, and the reported
/// timestamp is the frame's grid time, not the wake-up time, so deltas stay
/// whole periods even when the task wakes late.
#[derive(Clone, Copy, Debug)]
pub struct IntervalFrames {
    origin: Instant,
    period: Duration,
}

impl IntervalFrames {
    pub fn new(refresh_rate: u32) -> Self {
        Self::with_period(Duration::from_secs_f64(1.0 / refresh_rate.max(1) as f64))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            origin: Instant::now(),
            period: period.max(Duration::from_micros(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for IntervalFrames {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameSource for IntervalFrames {
    fn next_frame(&self) -> impl Future<Output = f64> + Send {
        let origin = self.origin;
        let period = self.period.as_nanos();

        async move {
            let frame = origin.elapsed().as_nanos() / period + 1;
            let offset = Duration::from_nanos((frame * period) as u64);

            tokio::time::sleep_until(origin + offset).await;

            offset.as_secs_f64() * 1000.0
        }
    }
}
