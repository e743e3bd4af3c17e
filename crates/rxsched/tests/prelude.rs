#![forbid(unsafe_code)]

//! The prelude is enough to wire a consumer end to end.

use std::cell::Cell;
use std::rc::Rc;

use rxsched::prelude::*;

struct Counter {
    scope: ScopeKey,
    renders: Cell<u32>,
}

impl RenderEngine for Counter {
    fn mark_for_check(&self) {
        self.renders.set(self.renders.get() + 1);
    }
    fn mark_dirty(&self) {}
    fn detect_changes(&self) {
        self.renders.set(self.renders.get() + 1);
    }
    fn attach(&self) {}
    fn detach(&self) {}
    fn scope(&self) -> ScopeKey {
        self.scope
    }
}

#[test]
fn consumer_renders_through_resolved_clock() {
    let queue = MicrotaskQueue::new();
    let slots = PlatformSlots::new().with_native(Rc::new(queue.clone()));
    let clock = ClockSource::resolve(&slots).expect("native primitive present");
    let engine = Rc::new(Counter {
        scope: ScopeKey::unique(),
        renders: Cell::new(0),
    });
    let config = RenderStrategyFactoryConfig::new(engine.clone(), clock);
    let aware = RenderAware::new(get_strategies(&config), StrategyName::Local);

    let subject = Subject::new();
    aware.bind(subject.as_stream());
    for v in 0..10 {
        subject.next(v);
    }
    queue.run_until_idle();

    assert_eq!(engine.renders.get(), 1);
    assert_eq!(aware.latest(), Some(9));
}
