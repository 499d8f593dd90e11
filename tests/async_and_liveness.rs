use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use taskloop::{Scheduler, TaskContext};

#[test]
fn async_task_queued_from_a_handler_runs_on_the_next_tick() {
    let counter = Rc::new(RefCell::new(0u32));
    let mut sched = Scheduler::builder().build();

    let counter2 = counter.clone();
    sched.schedule(Duration::from_millis(10), move |ctx| {
        let counter3 = counter2.clone();
        ctx.async_task(move |_sched| {
            *counter3.borrow_mut() += 1;
        });
    });

    sched.tick_for(Duration::from_millis(10));
    assert_eq!(*counter.borrow(), 0, "async op must not run within the same tick it was queued");

    sched.tick_for(Duration::from_millis(0));
    assert_eq!(*counter.borrow(), 1);
}

#[test]
fn async_task_can_chain_further_async_work_in_the_same_tick() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::builder().build();

    let log2 = log.clone();
    sched.async_task(move |sched| {
        log2.borrow_mut().push("first");
        let log3 = log2.clone();
        sched.async_task(move |_sched| {
            log3.borrow_mut().push("second");
        });
    });

    sched.tick_for(Duration::from_millis(0));
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn context_is_inert_once_the_scheduler_is_dropped() {
    let stash: Rc<RefCell<Option<TaskContext>>> = Rc::new(RefCell::new(None));
    let repeated = Rc::new(RefCell::new(false));
    let mut sched = Scheduler::builder().build();

    let stash2 = stash.clone();
    sched.schedule(Duration::from_millis(5), move |ctx| {
        *stash2.borrow_mut() = Some(ctx.clone());
    });
    sched.tick_for(Duration::from_millis(5));

    let ctx = stash.borrow().clone().expect("handler should have stashed a context");
    assert!(!ctx.is_expired());

    drop(sched);

    assert!(ctx.is_expired());

    // mutation methods on an expired context are silent no-ops, not panics
    ctx.cancel_all();
    ctx.repeat();
    let repeated2 = repeated.clone();
    ctx.async_task(move |_sched| {
        *repeated2.borrow_mut() = true;
    });
    assert!(!*repeated.borrow());
}

#[test]
fn range_methods_on_an_expired_context_are_ok_not_err_even_with_an_inverted_range() {
    let stash: Rc<RefCell<Option<TaskContext>>> = Rc::new(RefCell::new(None));
    let mut sched = Scheduler::builder().build();

    let stash2 = stash.clone();
    sched.schedule(Duration::from_millis(5), move |ctx| {
        *stash2.borrow_mut() = Some(ctx.clone());
    });
    sched.tick_for(Duration::from_millis(5));

    let ctx = stash.borrow().clone().expect("handler should have stashed a context");
    drop(sched);
    assert!(ctx.is_expired());

    let min = Duration::from_millis(20);
    let max = Duration::from_millis(10);

    // an expired context is a silent no-op, even when the range itself would otherwise be
    // rejected with InvalidRange: liveness is checked before the range is validated.
    assert!(ctx.repeat_range(min, max).is_ok());
    assert!(ctx.schedule_range(min, max, |_ctx| {}).is_ok());
    assert!(ctx.schedule_range_in_group(min, max, 1, |_ctx| {}).is_ok());
    assert!(ctx.delay_all_range(min, max).is_ok());
    assert!(ctx.delay_group_range(1, min, max).is_ok());
    assert!(ctx.reschedule_all_range(min, max).is_ok());
    assert!(ctx.reschedule_group_range(1, min, max).is_ok());
}
