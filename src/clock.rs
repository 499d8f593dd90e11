pub mod system_clock;
pub mod virtual_clock;

pub use system_clock::SystemClock;
pub use virtual_clock::VirtualClock;

use std::fmt::Debug;
use std::ops::Deref;
use std::time::Instant;

/// [`Clock`] supplies the monotonic, non-decreasing time source a [`crate::Scheduler`] measures
/// deadlines against.
///
/// # Required Methods
/// A single method, [`Clock::now`], returns the current instant. Unlike the host's wall clock,
/// this value only ever needs to compare and subtract consistently within one process run.
///
/// # Trait Implementation(s)
/// - [`SystemClock`], the default, wraps [`Instant::now`]
/// - [`VirtualClock`], a deterministic test double that only advances when told to
///
/// # See Also
/// - [`SystemClock`]
/// - [`VirtualClock`]
pub trait Clock: Debug {
    /// Returns the current instant as observed by this clock.
    fn now(&self) -> Instant;
}

/// Blanket impl so a caller can hand the [`Scheduler`](crate::Scheduler) builder an
/// `Rc<VirtualClock>` (or any other `Deref<Target: Clock>`) and keep a handle of their own to
/// advance it from outside, e.g. a test driving `Scheduler::tick`'s no-argument, clock-derived
/// form.
impl<T> Clock for T
where
    T: Deref + Debug,
    T::Target: Clock,
{
    fn now(&self) -> Instant {
        self.deref().now()
    }
}
