//! A cooperative, single-threaded task scheduler meant to be driven from a host's own update
//! loop (a game server tick, a simulation step) rather than an OS thread or an async runtime.
//! There is no preemption, no parallel dispatch, and no hidden global clock — the host owns the
//! `Scheduler` and decides when to call `tick`.

mod async_queue;

#[allow(missing_docs)]
pub mod clock;

mod context;
mod errors;
mod queue;

#[allow(missing_docs)]
pub mod rng;

mod scheduler;
mod task;

pub use context::TaskContext;
pub use errors::SchedulerError;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerConfigBuilder};
pub use task::Group;
