#![forbid(unsafe_code)]

//! Clock signals as streams.
//!
//! [`tick_from`] turns a [`ClockSource`] into a lazy single-shot stream:
//! every subscription registers one microtask, emits `()` when it runs, then
//! completes. Releasing the subscription first cancels the registration.

use std::rc::Rc;

use rxsched_core::ClockSource;

use crate::coalesce::DurationSelector;
use crate::reactive::{Stream, Subscriber, Subscription};

/// A single-shot stream that fires at the next microtask boundary.
#[must_use]
pub fn tick_from(clock: &ClockSource) -> Stream<()> {
    let clock = clock.clone();
    Stream::new(move |subscriber: Subscriber<()>| {
        let target = subscriber.clone();
        let pending = clock.schedule(move || {
            target.next(());
            target.complete();
        });
        Subscription::new(move || drop(pending))
    })
}

/// A duration selector whose windows close at the next microtask boundary of
/// `clock`.
///
/// `clock` should come from [`ClockSource::resolve`] so windows are measured
/// against the unpatched primitive.
#[must_use]
pub fn unpatched_duration_selector(clock: &ClockSource) -> DurationSelector {
    let clock = clock.clone();
    Rc::new(move || tick_from(&clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Notification;
    use rxsched_core::MicrotaskQueue;
    use std::cell::RefCell;

    fn clock() -> (MicrotaskQueue, ClockSource) {
        let queue = MicrotaskQueue::new();
        let clock = ClockSource::new(Rc::new(queue.clone()));
        (queue, clock)
    }

    #[test]
    fn tick_emits_once_then_completes() {
        let (queue, clock) = clock();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let _sub = tick_from(&clock).subscribe(move |n| l.borrow_mut().push(n));

        assert!(log.borrow().is_empty(), "tick must be lazy");
        queue.run_until_idle();
        assert_eq!(
            *log.borrow(),
            vec![Notification::Next(()), Notification::Complete]
        );
    }

    #[test]
    fn unsubscribed_tick_never_fires() {
        let (queue, clock) = clock();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = tick_from(&clock).subscribe(move |n| l.borrow_mut().push(n));
        drop(sub);
        queue.run_until_idle();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn selector_yields_fresh_signal_each_call() {
        let (queue, clock) = clock();
        let selector = unpatched_duration_selector(&clock);
        let _a = selector().subscribe(|_| {});
        let _b = selector().subscribe(|_| {});
        assert_eq!(queue.len(), 2);
    }
}
