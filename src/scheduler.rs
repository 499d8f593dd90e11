use crate::clock::{Clock, SystemClock};
use crate::context::{SchedulerShared, TaskContext};
use crate::errors::{check_range, SchedulerError};
use crate::queue::TaskQueue;
use crate::rng::{DurationRng, FastrandRng};
use crate::task::{Group, Task};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::{Duration, Instant};
use typed_builder::TypedBuilder;

type Validator = Box<dyn FnMut() -> bool>;

/// The builder configuration used to construct a [`Scheduler`]. By itself it should not be
/// used directly — it resides in [`Scheduler::builder`].
#[derive(TypedBuilder)]
#[builder(build_method(into = Scheduler))]
pub struct SchedulerConfig {
    /// The [`Clock`] the scheduler measures deadlines and the no-argument [`Scheduler::tick`]
    /// against.
    ///
    /// # Default Value
    /// [`SystemClock`]. For deterministic tests, supply a [`crate::clock::VirtualClock`] instead.
    #[builder(
        default = Box::new(SystemClock),
        setter(transform = |clock: impl Clock + 'static| Box::new(clock) as Box<dyn Clock>),
    )]
    clock: Box<dyn Clock>,

    /// The [`DurationRng`] used by every `*_range` scheduling and manipulation overload.
    ///
    /// # Default Value
    /// [`FastrandRng`].
    #[builder(
        default = Rc::new(FastrandRng) as Rc<dyn DurationRng>,
        setter(transform = |rng: impl DurationRng + 'static| Rc::new(rng) as Rc<dyn DurationRng>),
    )]
    rng: Rc<dyn DurationRng>,
}

impl From<SchedulerConfig> for Scheduler {
    fn from(config: SchedulerConfig) -> Self {
        let now = config.clock.now();
        Scheduler {
            now,
            task_queue: TaskQueue::new(),
            validator: Box::new(|| true),
            clock: config.clock,
            shared: SchedulerShared::new(config.rng),
        }
    }
}

/// [`Scheduler`] owns the pending task queue and drives every tick of the host's update loop.
/// It is intentionally single-threaded: its fields use [`Rc`]/[`std::cell::Cell`], not
/// `Arc`/`Mutex`, so sharing one across threads is a compile error rather than a runtime race.
///
/// # Constructor(s)
/// Use [`Scheduler::builder`] to construct one, optionally overriding the [`Clock`] and/or
/// [`DurationRng`].
///
/// # Re-entrancy
/// Task handlers never receive `&mut Scheduler` — only `&mut TaskContext`. Every manipulation
/// method below therefore has no call site inside a handler body; the discipline the original
/// design called a "contract" is, here, simply unreachable code.
pub struct Scheduler {
    now: Instant,
    task_queue: TaskQueue,
    validator: Validator,
    clock: Box<dyn Clock>,
    pub(crate) shared: Rc<SchedulerShared>,
}

impl Debug for Scheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.task_queue.len())
            .finish()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shared.alive.set(false);
    }
}

impl Scheduler {
    /// Starts building a [`Scheduler`] via [`SchedulerConfig`].
    pub fn builder() -> SchedulerConfigBuilder {
        SchedulerConfig::builder()
    }

    /// The current virtual time, as of the last tick (or construction, if `tick` hasn't run yet).
    pub fn now(&self) -> Instant {
        self.now
    }

    /// How many tasks are currently pending.
    pub fn len(&self) -> usize {
        self.task_queue.len()
    }

    /// Whether there are no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.task_queue.is_empty()
    }

    /// Replaces the validator consulted before dispatching each due task. A `false` verdict
    /// skips that task's firing for this tick without cancelling or consuming it.
    pub fn set_validator(&mut self, validator: impl FnMut() -> bool + 'static) -> &mut Self {
        self.validator = Box::new(validator);
        self
    }

    /// Restores the trivial "always fire" validator.
    pub fn clear_validator(&mut self) -> &mut Self {
        self.validator = Box::new(|| true);
        self
    }

    // ---- scheduling ----

    /// Schedules an ungrouped task to fire `duration` from now.
    pub fn schedule(
        &mut self,
        duration: Duration,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> &mut Self {
        self.schedule_task(duration, None, handler)
    }

    /// Schedules a task tagged with `group` to fire `duration` from now.
    pub fn schedule_in_group(
        &mut self,
        duration: Duration,
        group: Group,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> &mut Self {
        self.schedule_task(duration, Some(group), handler)
    }

    fn schedule_task(
        &mut self,
        duration: Duration,
        group: Option<Group>,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> &mut Self {
        let seq = self.task_queue.next_seq();
        let deadline = self.now + duration;
        self.task_queue
            .push(Task::new(deadline, duration, group, seq, Box::new(handler)));
        self
    }

    /// Schedules an ungrouped task with a duration drawn uniformly from `[min, max]`.
    pub fn schedule_range(
        &mut self,
        min: Duration,
        max: Duration,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let duration = self.shared.rng.uniform_duration(min, max);
        Ok(self.schedule(duration, handler))
    }

    /// Grouped counterpart of [`Scheduler::schedule_range`].
    pub fn schedule_range_in_group(
        &mut self,
        min: Duration,
        max: Duration,
        group: Group,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let duration = self.shared.rng.uniform_duration(min, max);
        Ok(self.schedule_in_group(duration, group, handler))
    }

    /// Enqueues a zero-argument callable to run once, at the start of the next tick.
    pub fn async_task(&mut self, callable: impl FnOnce(&mut Scheduler) + 'static) -> &mut Self {
        self.shared.async_queue.borrow_mut().push(Box::new(callable));
        self
    }

    // ---- manipulation ----

    /// Cancels every pending task.
    pub fn cancel_all(&mut self) -> &mut Self {
        self.task_queue.clear();
        self
    }

    /// Cancels every pending task tagged with `group`.
    pub fn cancel_group(&mut self, group: Group) -> &mut Self {
        self.task_queue.remove_if(|t| t.group == Some(group));
        self
    }

    /// Cancels every pending task tagged with any of `groups`.
    pub fn cancel_groups_of(&mut self, groups: &[Group]) -> &mut Self {
        self.task_queue
            .remove_if(|t| t.group.is_some_and(|g| groups.contains(&g)));
        self
    }

    /// Pushes every pending task's deadline forward by `delta`.
    pub fn delay_all(&mut self, delta: Duration) -> &mut Self {
        self.task_queue.modify_if(|_| true, |t| t.deadline += delta);
        self
    }

    /// Pushes every pending task in `group`'s deadline forward by `delta`.
    pub fn delay_group(&mut self, group: Group, delta: Duration) -> &mut Self {
        self.task_queue
            .modify_if(|t| t.group == Some(group), |t| t.deadline += delta);
        self
    }

    /// Resets every pending task's deadline to `now + delta` and its nominal duration to `delta`.
    pub fn reschedule_all(&mut self, delta: Duration) -> &mut Self {
        let now = self.now;
        self.task_queue.modify_if(
            |_| true,
            move |t| {
                t.deadline = now + delta;
                t.duration = delta;
            },
        );
        self
    }

    /// Grouped counterpart of [`Scheduler::reschedule_all`].
    pub fn reschedule_group(&mut self, group: Group, delta: Duration) -> &mut Self {
        let now = self.now;
        self.task_queue.modify_if(
            |t| t.group == Some(group),
            move |t| {
                t.deadline = now + delta;
                t.duration = delta;
            },
        );
        self
    }

    /// Draws a delta uniformly from `[min, max]` once, then applies [`Scheduler::delay_all`].
    pub fn delay_all_range(&mut self, min: Duration, max: Duration) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        Ok(self.delay_all(delta))
    }

    /// Draws a delta uniformly from `[min, max]` once, then applies [`Scheduler::delay_group`].
    pub fn delay_group_range(
        &mut self,
        group: Group,
        min: Duration,
        max: Duration,
    ) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        Ok(self.delay_group(group, delta))
    }

    /// Draws a delta uniformly from `[min, max]` once, then applies [`Scheduler::reschedule_all`].
    pub fn reschedule_all_range(
        &mut self,
        min: Duration,
        max: Duration,
    ) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        Ok(self.reschedule_all(delta))
    }

    /// Draws a delta uniformly from `[min, max]` once, then applies [`Scheduler::reschedule_group`].
    pub fn reschedule_group_range(
        &mut self,
        group: Group,
        min: Duration,
        max: Duration,
    ) -> Result<&mut Self, SchedulerError> {
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        Ok(self.reschedule_group(group, delta))
    }

    // ---- ticking ----

    /// Advances time to `clock.now()` and dispatches everything now due.
    pub fn tick(&mut self) -> &mut Self {
        let elapsed = self.clock.now().saturating_duration_since(self.now);
        self.tick_for(elapsed)
    }

    /// Like [`Scheduler::tick`], invoking `then` once dispatch has finished.
    pub fn tick_then(&mut self, then: impl FnOnce(&mut Self)) -> &mut Self {
        let elapsed = self.clock.now().saturating_duration_since(self.now);
        self.tick_for_then(elapsed, then)
    }

    /// Advances virtual time by `millis` milliseconds and dispatches everything now due.
    pub fn tick_millis(&mut self, millis: u64) -> &mut Self {
        self.tick_for(Duration::from_millis(millis))
    }

    /// Like [`Scheduler::tick_millis`], invoking `then` once dispatch has finished.
    pub fn tick_millis_then(&mut self, millis: u64, then: impl FnOnce(&mut Self)) -> &mut Self {
        self.tick_for_then(Duration::from_millis(millis), then)
    }

    /// Advances virtual time by `delta` and dispatches everything now due.
    pub fn tick_for(&mut self, delta: Duration) -> &mut Self {
        self.drive(delta);
        self
    }

    /// Like [`Scheduler::tick_for`], invoking `then` once dispatch has finished.
    pub fn tick_for_then(&mut self, delta: Duration, then: impl FnOnce(&mut Self)) -> &mut Self {
        self.drive(delta);
        then(self);
        self
    }

    fn drive(&mut self, delta: Duration) {
        self.now += delta;
        self.drain_async_queue();
        self.drain_due_tasks();
    }

    fn drain_async_queue(&mut self) {
        loop {
            let op = self.shared.async_queue.borrow_mut().pop_front();
            match op {
                Some(op) => op(self),
                None => break,
            }
        }
    }

    fn drain_due_tasks(&mut self) {
        loop {
            match self.task_queue.peek_deadline() {
                Some(deadline) if deadline <= self.now => {
                    if !(self.validator)() {
                        break;
                    }
                }
                _ => break,
            }

            let Some(task) = self.task_queue.pop() else {
                break;
            };
            self.dispatch_task(task);
        }
    }

    fn dispatch_task(&mut self, mut task: Task) {
        let mut ctx = TaskContext::new(task.duration, task.repeat_counter, task.group, self.shared.clone());
        (task.handler)(&mut ctx);

        if let Some(new_duration) = ctx.repeat_request() {
            task.deadline = self.now + new_duration;
            task.duration = new_duration;
            task.repeat_counter += 1;
            task.group = ctx.group_snapshot();
            task.seq = self.task_queue.next_seq();
            self.task_queue.push(task);
        }
    }
}
