use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use taskloop::Scheduler;

#[test]
fn false_validator_skips_a_firing_without_consuming_it() {
    let fired = Rc::new(RefCell::new(0u32));
    let allow = Rc::new(Cell::new(false));
    let mut sched = Scheduler::builder().build();

    let fired2 = fired.clone();
    sched.schedule(Duration::from_millis(10), move |_ctx| {
        *fired2.borrow_mut() += 1;
    });

    let allow2 = allow.clone();
    sched.set_validator(move || allow2.get());

    sched.tick_for(Duration::from_millis(100));
    assert_eq!(*fired.borrow(), 0, "task must stay queued while vetoed");
    assert_eq!(sched.len(), 1);

    allow.set(true);
    sched.tick_for(Duration::from_millis(0));
    assert_eq!(*fired.borrow(), 1);
    assert!(sched.is_empty());
}

#[test]
fn clear_validator_restores_the_trivial_always_fire_predicate() {
    let fired = Rc::new(RefCell::new(0u32));
    let mut sched = Scheduler::builder().build();

    let fired2 = fired.clone();
    sched.schedule(Duration::from_millis(10), move |_ctx| {
        *fired2.borrow_mut() += 1;
    });

    sched.set_validator(|| false);
    sched.clear_validator();

    sched.tick_for(Duration::from_millis(10));
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn validator_veto_stops_draining_the_rest_of_the_tick_too() {
    // A vetoed head-of-queue task must not be skipped over to let a later, also-due task fire —
    // draining stops entirely so ordering among due tasks is never violated by a veto.
    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::builder().build();

    let fired2 = fired.clone();
    sched.schedule(Duration::from_millis(10), move |_ctx| {
        fired2.borrow_mut().push("first");
    });
    let fired3 = fired.clone();
    sched.schedule(Duration::from_millis(20), move |_ctx| {
        fired3.borrow_mut().push("second");
    });

    sched.set_validator(|| false);
    sched.tick_for(Duration::from_millis(30));
    assert!(fired.borrow().is_empty());

    sched.clear_validator();
    sched.tick_for(Duration::from_millis(0));
    assert_eq!(*fired.borrow(), vec!["first", "second"]);
}
