use std::time::Duration;

/// Errors produced by [`crate::Scheduler`] and its manipulation methods.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A `(min, max)` duration range was supplied with `min > max`.
    #[error("invalid duration range: min ({min:?}) is greater than max ({max:?})")]
    InvalidRange {
        /// The lower bound that was supplied.
        min: Duration,
        /// The upper bound that was supplied.
        max: Duration,
    },
}

pub(crate) fn check_range(min: Duration, max: Duration) -> Result<(), SchedulerError> {
    if min > max {
        return Err(SchedulerError::InvalidRange { min, max });
    }
    Ok(())
}
