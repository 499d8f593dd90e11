use crate::clock::Clock;
use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

/// [`VirtualClock`] is a deterministic test double for [`Clock`]. Unlike [`SystemClock`], it
/// never moves forward on its own — only explicit calls to [`VirtualClock::advance`] or
/// [`VirtualClock::advance_to`] change what [`Clock::now`] returns, which makes scheduler tests
/// reproducible regardless of how long the test process actually takes to run.
///
/// # Constructor(s)
/// - [`VirtualClock::new`] starts the clock at `Instant::now()`
/// - [`VirtualClock::from_instant`] starts it at a caller-supplied instant
///
/// # Example
/// ```
/// use std::time::Duration;
/// use taskloop::clock::{Clock, VirtualClock};
///
/// let clock = VirtualClock::new();
/// let t0 = clock.now();
/// clock.advance(Duration::from_millis(10));
/// assert_eq!(clock.now(), t0 + Duration::from_millis(10));
/// ```
///
/// # See Also
/// - [`SystemClock`]
/// - [`Clock`]
pub struct VirtualClock {
    current: Cell<Instant>,
}

impl Debug for VirtualClock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualClock")
            .field("current", &self.current.get())
            .finish()
    }
}

impl VirtualClock {
    /// Creates a new [`VirtualClock`] starting at the current real instant.
    pub fn new() -> Self {
        Self::from_instant(Instant::now())
    }

    /// Creates a new [`VirtualClock`] starting at an arbitrary instant.
    pub fn from_instant(initial: Instant) -> Self {
        VirtualClock {
            current: Cell::new(initial),
        }
    }

    /// Advances the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.current.set(self.current.get() + duration);
    }

    /// Advances the clock forward to exactly `to`. Panics if `to` precedes the current value,
    /// since a virtual clock must stay non-decreasing like any other [`Clock`].
    pub fn advance_to(&self, to: Instant) {
        assert!(
            to >= self.current.get(),
            "VirtualClock cannot move backwards"
        );
        self.current.set(to);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.current.get()
    }
}

#[allow(unused_imports)]
use crate::clock::SystemClock;
