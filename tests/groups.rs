use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use taskloop::Scheduler;

#[test]
fn cancel_group_only_removes_that_group() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::builder().build();

    for (label, group, delay) in [("c1", 7u64, 50u64), ("c2", 7, 60), ("c3", 8, 70)] {
        let fired2 = fired.clone();
        sched.schedule_in_group(Duration::from_millis(delay), group, move |_ctx| {
            fired2.borrow_mut().push(label);
        });
    }

    sched.cancel_group(7);
    sched.tick_for(Duration::from_millis(100));

    assert_eq!(*fired.borrow(), vec!["c3"]);
}

#[test]
fn cancel_groups_of_removes_every_named_group() {
    let fired = Rc::new(RefCell::new(0u32));
    let mut sched = Scheduler::builder().build();

    for group in [1u64, 2, 3] {
        let fired2 = fired.clone();
        sched.schedule_in_group(Duration::from_millis(10), group, move |_ctx| {
            *fired2.borrow_mut() += 1;
        });
    }

    sched.cancel_groups_of(&[1, 2]);
    sched.tick_for(Duration::from_millis(10));

    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn delay_all_pushes_every_deadline_forward_by_the_same_amount() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::builder().build();

    for (label, delay) in [("d1", 100u64), ("d2", 200)] {
        let fired2 = fired.clone();
        sched.schedule(Duration::from_millis(delay), move |_ctx| {
            fired2.borrow_mut().push(label);
        });
    }

    sched.delay_all(Duration::from_millis(50));

    sched.tick_for(Duration::from_millis(100));
    assert!(fired.borrow().is_empty());

    sched.tick_for(Duration::from_millis(50));
    assert_eq!(*fired.borrow(), vec!["d1"]);

    sched.tick_for(Duration::from_millis(100));
    assert_eq!(*fired.borrow(), vec!["d1", "d2"]);
}

#[test]
fn delay_group_only_affects_that_group() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::builder().build();

    let fired2 = fired.clone();
    sched.schedule_in_group(Duration::from_millis(50), 1, move |_ctx| {
        fired2.borrow_mut().push("grouped");
    });
    let fired3 = fired.clone();
    sched.schedule(Duration::from_millis(50), move |_ctx| {
        fired3.borrow_mut().push("ungrouped");
    });

    sched.delay_group(1, Duration::from_millis(100));

    sched.tick_for(Duration::from_millis(50));
    assert_eq!(*fired.borrow(), vec!["ungrouped"]);

    sched.tick_for(Duration::from_millis(100));
    assert_eq!(*fired.borrow(), vec!["ungrouped", "grouped"]);
}

#[test]
fn reschedule_all_resets_deadline_and_nominal_duration() {
    let fired = Rc::new(RefCell::new(0u32));
    let mut sched = Scheduler::builder().build();

    let fired2 = fired.clone();
    sched.schedule(Duration::from_millis(5), move |ctx| {
        *fired2.borrow_mut() += 1;
        ctx.repeat();
    });

    // before the first firing, push it way out and change its period
    sched.reschedule_all(Duration::from_millis(30));

    sched.tick_for(Duration::from_millis(5));
    assert_eq!(*fired.borrow(), 0);

    sched.tick_for(Duration::from_millis(25));
    assert_eq!(*fired.borrow(), 1);

    // repeat() keeps using whatever duration reschedule_all installed (30ms), not the original 5ms
    sched.tick_for(Duration::from_millis(29));
    assert_eq!(*fired.borrow(), 1);
    sched.tick_for(Duration::from_millis(1));
    assert_eq!(*fired.borrow(), 2);
}
