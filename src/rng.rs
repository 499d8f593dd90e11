use std::fmt::Debug;
use std::time::Duration;

/// [`DurationRng`] supplies a uniformly distributed [`Duration`] within `[min, max]`, used by
/// every `*_range` scheduling and manipulation overload on [`crate::Scheduler`].
///
/// # See Also
/// - [`FastrandRng`]
pub trait DurationRng: Debug {
    /// Draws a duration uniformly from `[min, max]`. Callers are expected to have already
    /// validated `min <= max`.
    fn uniform_duration(&self, min: Duration, max: Duration) -> Duration;
}

/// The default [`DurationRng`], backed by the `fastrand` crate's thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastrandRng;

impl DurationRng for FastrandRng {
    fn uniform_duration(&self, min: Duration, max: Duration) -> Duration {
        if min == max {
            return min;
        }
        let span = (max - min).as_nanos() as u64;
        min + Duration::from_nanos(fastrand::u64(0..=span))
    }
}
