use crate::async_queue::AsyncQueue;
use crate::errors::{check_range, SchedulerError};
use crate::rng::DurationRng;
use crate::scheduler::Scheduler;
use crate::task::Group;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// State shared between a [`Scheduler`] and every [`TaskContext`] it has ever handed out. Kept
/// in its own allocation (rather than inline in [`Scheduler`]) so that a context can still read
/// `alive` and push onto `async_queue` while the scheduler itself is borrowed elsewhere during
/// dispatch — the borrow checker sees two distinct allocations, not one struct borrowed twice.
pub(crate) struct SchedulerShared {
    pub(crate) alive: Cell<bool>,
    pub(crate) async_queue: RefCell<AsyncQueue>,
    pub(crate) rng: Rc<dyn DurationRng>,
}

impl SchedulerShared {
    pub(crate) fn new(rng: Rc<dyn DurationRng>) -> Rc<Self> {
        Rc::new(SchedulerShared {
            alive: Cell::new(true),
            async_queue: RefCell::new(AsyncQueue::new()),
            rng,
        })
    }
}

/// A one-shot handle passed to a firing task's handler as `&mut TaskContext`. Every
/// scheduler-mutating method on [`TaskContext`] is deferred: it buffers a closure on the
/// scheduler's async queue rather than touching live state, which is what makes it safe to call
/// from inside a handler while the scheduler is mid-dispatch. [`TaskContext::repeat`] and its
/// siblings are the one exception — see their docs.
///
/// Clones of a context share the same group cell, the same repeat/consumption cell, and the
/// same scheduler handle, so any clone observes the effects of another and the "at most one
/// repeat per firing" rule holds across all of them.
#[derive(Clone)]
pub struct TaskContext {
    duration: Duration,
    repeat_counter: u64,
    group: Rc<Cell<Option<Group>>>,
    repeat: Rc<Cell<Option<Duration>>>,
    shared: Rc<SchedulerShared>,
}

impl TaskContext {
    pub(crate) fn new(
        duration: Duration,
        repeat_counter: u64,
        group: Option<Group>,
        shared: Rc<SchedulerShared>,
    ) -> Self {
        TaskContext {
            duration,
            repeat_counter,
            group: Rc::new(Cell::new(group)),
            repeat: Rc::new(Cell::new(None)),
            shared,
        }
    }

    /// Whether the scheduler that produced this context has since been dropped. Once true,
    /// every mutating method below is a silent no-op.
    pub fn is_expired(&self) -> bool {
        !self.shared.alive.get()
    }

    /// The repeat counter of the task as of this firing: `0` on first invocation, `1` after one
    /// prior repeat, and so on.
    pub fn repeat_counter(&self) -> u64 {
        self.repeat_counter
    }

    /// Whether the task currently belongs to group `g`.
    pub fn is_in_group(&self, g: Group) -> bool {
        self.group.get() == Some(g)
    }

    /// Moves the task into group `g`. Takes effect immediately — it only touches this firing's
    /// group cell, not the live queue, so there's no re-entrancy hazard.
    pub fn set_group(&self, g: Group) {
        self.group.set(Some(g));
    }

    /// Removes the task from whatever group it was in.
    pub fn clear_group(&self) {
        self.group.set(None);
    }

    pub(crate) fn group_snapshot(&self) -> Option<Group> {
        self.group.get()
    }

    pub(crate) fn repeat_request(&self) -> Option<Duration> {
        self.repeat.get()
    }

    fn request_repeat(&self, duration: Duration) {
        if self.is_expired() {
            return;
        }
        if self.repeat.get().is_some() {
            panic!("TaskContext::repeat* called more than once for the same firing");
        }
        self.repeat.set(Some(duration));
    }

    /// Re-enqueues the firing task with the same nominal duration it already had. May be called
    /// at most once per firing across all clones of this context; a second call while the
    /// scheduler is still alive panics.
    pub fn repeat(&self) {
        let duration = self.duration;
        self.request_repeat(duration);
    }

    /// Re-enqueues the firing task with a new nominal duration.
    pub fn repeat_with(&self, duration: Duration) {
        self.request_repeat(duration);
    }

    /// Re-enqueues the firing task with a duration drawn uniformly from `[min, max]`. The draw
    /// happens immediately, synchronously with this call.
    pub fn repeat_range(&self, min: Duration, max: Duration) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let duration = self.shared.rng.uniform_duration(min, max);
        self.request_repeat(duration);
        Ok(())
    }

    fn dispatch(&self, op: impl FnOnce(&mut Scheduler) + 'static) {
        if self.is_expired() {
            return;
        }
        self.shared.async_queue.borrow_mut().push(Box::new(op));
    }

    /// Schedules a new ungrouped task `duration` from now. Deferred to the next tick.
    pub fn schedule(&self, duration: Duration, handler: impl FnMut(&mut TaskContext) + 'static) {
        self.dispatch(move |sched| {
            sched.schedule(duration, handler);
        });
    }

    /// Schedules a new task in group `group`, `duration` from now. Deferred to the next tick.
    pub fn schedule_in_group(
        &self,
        duration: Duration,
        group: Group,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) {
        self.dispatch(move |sched| {
            sched.schedule_in_group(duration, group, handler);
        });
    }

    /// Schedules a new ungrouped task with a duration drawn uniformly from `[min, max]`. The
    /// draw happens eagerly, at the point this method is called; only the resulting
    /// fixed-duration schedule is deferred.
    pub fn schedule_range(
        &self,
        min: Duration,
        max: Duration,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let duration = self.shared.rng.uniform_duration(min, max);
        self.schedule(duration, handler);
        Ok(())
    }

    /// Grouped counterpart of [`TaskContext::schedule_range`].
    pub fn schedule_range_in_group(
        &self,
        min: Duration,
        max: Duration,
        group: Group,
        handler: impl FnMut(&mut TaskContext) + 'static,
    ) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let duration = self.shared.rng.uniform_duration(min, max);
        self.schedule_in_group(duration, group, handler);
        Ok(())
    }

    /// Enqueues a zero-argument callable to run once, at the start of the next tick.
    pub fn async_task(&self, callable: impl FnOnce(&mut Scheduler) + 'static) {
        self.dispatch(callable);
    }

    /// Deferred counterpart of [`Scheduler::cancel_all`].
    pub fn cancel_all(&self) {
        self.dispatch(|sched| sched.cancel_all());
    }

    /// Deferred counterpart of [`Scheduler::cancel_group`].
    pub fn cancel_group(&self, group: Group) {
        self.dispatch(move |sched| sched.cancel_group(group));
    }

    /// Deferred counterpart of [`Scheduler::cancel_groups_of`].
    pub fn cancel_groups_of(&self, groups: Vec<Group>) {
        self.dispatch(move |sched| sched.cancel_groups_of(&groups));
    }

    /// Deferred counterpart of [`Scheduler::delay_all`].
    pub fn delay_all(&self, delta: Duration) {
        self.dispatch(move |sched| sched.delay_all(delta));
    }

    /// Deferred counterpart of [`Scheduler::delay_group`].
    pub fn delay_group(&self, group: Group, delta: Duration) {
        self.dispatch(move |sched| sched.delay_group(group, delta));
    }

    /// Deferred counterpart of [`Scheduler::reschedule_all`].
    pub fn reschedule_all(&self, delta: Duration) {
        self.dispatch(move |sched| sched.reschedule_all(delta));
    }

    /// Deferred counterpart of [`Scheduler::reschedule_group`].
    pub fn reschedule_group(&self, group: Group, delta: Duration) {
        self.dispatch(move |sched| sched.reschedule_group(group, delta));
    }

    /// Deferred counterpart of [`Scheduler::delay_all_range`]. The delta is drawn eagerly.
    pub fn delay_all_range(&self, min: Duration, max: Duration) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        self.delay_all(delta);
        Ok(())
    }

    /// Deferred counterpart of [`Scheduler::delay_group_range`]. The delta is drawn eagerly.
    pub fn delay_group_range(
        &self,
        group: Group,
        min: Duration,
        max: Duration,
    ) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        self.delay_group(group, delta);
        Ok(())
    }

    /// Deferred counterpart of [`Scheduler::reschedule_all_range`]. The delta is drawn eagerly.
    pub fn reschedule_all_range(&self, min: Duration, max: Duration) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        self.reschedule_all(delta);
        Ok(())
    }

    /// Deferred counterpart of [`Scheduler::reschedule_group_range`]. The delta is drawn eagerly.
    pub fn reschedule_group_range(
        &self,
        group: Group,
        min: Duration,
        max: Duration,
    ) -> Result<(), SchedulerError> {
        if self.is_expired() {
            return Ok(());
        }
        check_range(min, max)?;
        let delta = self.shared.rng.uniform_duration(min, max);
        self.reschedule_group(group, delta);
        Ok(())
    }
}
