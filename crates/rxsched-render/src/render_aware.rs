#![forbid(unsafe_code)]

//! Render-aware consumer.
//!
//! [`RenderAware`] owns one component's strategy registry and a bound
//! notification stream. Every value that passes the active strategy's
//! behaviour is stored as the latest value and then rendered. Switching the
//! strategy re-subscribes the bound stream under the new behaviour; the old
//! subscription (and any open coalescing window it had) is torn down first.
//!
//! Errors from the bound stream are recorded, never re-thrown. A failed or
//! completed stream stays bound until [`RenderAware::bind`] or
//! [`RenderAware::unbind`] is called.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rxsched_runtime::{Notification, Stream, StreamError, Subscription};

use crate::config::SchedulerConfig;
use crate::error::RenderError;
use crate::registry::StrategyRegistry;
use crate::strategy::StrategyName;

struct RenderState<T> {
    latest: RefCell<Option<T>>,
    error: RefCell<Option<StreamError>>,
    complete: Cell<bool>,
    renders: Cell<u64>,
}

impl<T> RenderState<T> {
    fn reset_terminal(&self) {
        self.error.replace(None);
        self.complete.set(false);
    }
}

/// A consumer that renders a stream through a switchable strategy.
pub struct RenderAware<T> {
    registry: StrategyRegistry<T>,
    active: Cell<StrategyName>,
    source: RefCell<Option<Stream<T>>>,
    subscription: RefCell<Option<Subscription>>,
    state: Rc<RenderState<T>>,
}

impl<T: 'static> RenderAware<T> {
    /// Create a consumer that starts on the strategy called `name`.
    #[must_use]
    pub fn new(registry: StrategyRegistry<T>, name: StrategyName) -> Self {
        Self {
            registry,
            active: Cell::new(name),
            source: RefCell::new(None),
            subscription: RefCell::new(None),
            state: Rc::new(RenderState {
                latest: RefCell::new(None),
                error: RefCell::new(None),
                complete: Cell::new(false),
                renders: Cell::new(0),
            }),
        }
    }

    /// Create a consumer that starts on the configured default strategy.
    #[must_use]
    pub fn with_config(registry: StrategyRegistry<T>, config: &SchedulerConfig) -> Self {
        Self::new(registry, config.default_strategy)
    }

    /// Bind `source`, replacing any previously bound stream.
    pub fn bind(&self, source: Stream<T>) {
        self.source.replace(Some(source));
        self.resubscribe();
    }

    /// Drop the bound stream and its subscription.
    pub fn unbind(&self) {
        self.subscription.take();
        self.source.take();
    }

    /// Switch to the strategy called `name`, re-binding the current stream.
    pub fn set_strategy(&self, name: StrategyName) {
        if self.active.get() == name {
            return;
        }
        tracing::debug!(from = %self.active.get(), to = %name, "switching render strategy");
        self.active.set(name);
        self.resubscribe();
    }

    /// [`set_strategy`](Self::set_strategy) by configuration name.
    pub fn set_strategy_str(&self, name: &str) -> Result<(), RenderError> {
        self.set_strategy(name.parse()?);
        Ok(())
    }

    /// The active strategy.
    #[must_use]
    pub fn strategy_name(&self) -> StrategyName {
        self.active.get()
    }

    /// Whether a stream is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.source.borrow().is_some()
    }

    /// The error the bound stream failed with, if any.
    #[must_use]
    pub fn error(&self) -> Option<StreamError> {
        self.state.error.borrow().clone()
    }

    /// Whether the bound stream completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.complete.get()
    }

    /// Number of values rendered since construction.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.state.renders.get()
    }

    fn resubscribe(&self) {
        // The old subscription must be gone before the new one can emit.
        self.subscription.take();
        let Some(source) = self.source.borrow().clone() else {
            return;
        };
        self.state.reset_terminal();

        let strategy = self.registry.get(self.active.get()).clone();
        let behaviour = strategy.behaviour();
        let state = Rc::clone(&self.state);
        let subscription = source
            .pipe(&behaviour)
            .subscribe(move |notification| match notification {
                Notification::Next(value) => {
                    state.latest.replace(Some(value));
                    state.renders.set(state.renders.get() + 1);
                    strategy.render();
                }
                Notification::Error(err) => {
                    tracing::warn!(strategy = %strategy.name(), error = %err, "bound stream failed");
                    state.error.replace(Some(err));
                }
                Notification::Complete => state.complete.set(true),
            });
        self.subscription.replace(Some(subscription));
    }
}

impl<T: Clone + 'static> RenderAware<T> {
    /// The most recently rendered value.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.state.latest.borrow().clone()
    }
}

impl<T: 'static> fmt::Debug for RenderAware<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderAware")
            .field("strategy", &self.active.get())
            .field("bound", &self.is_bound())
            .field("renders", &self.render_count())
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::get_strategies;
    use crate::testing::config_with;
    use rxsched_runtime::Subject;

    fn consumer(
        name: StrategyName,
    ) -> (
        Rc<crate::testing::CountingEngine>,
        rxsched_core::MicrotaskQueue,
        RenderAware<i32>,
    ) {
        let (engine, queue, config) = config_with(3);
        let aware = RenderAware::new(get_strategies(&config), name);
        (engine, queue, aware)
    }

    #[test]
    fn native_renders_every_value() {
        let (engine, _queue, aware) = consumer(StrategyName::Native);
        let subject = Subject::new();
        aware.bind(subject.as_stream());
        subject.next(1);
        subject.next(2);
        assert_eq!(aware.latest(), Some(2));
        assert_eq!(aware.render_count(), 2);
        assert_eq!(engine.count("mark_for_check"), 2);
    }

    #[test]
    fn latest_snapshot_survives_later_notifications() {
        let (_engine, _queue, aware) = consumer(StrategyName::Native);
        let subject = Subject::new();
        aware.bind(subject.as_stream());
        subject.next(1);
        let seen = aware.latest();
        subject.next(2);
        assert_eq!(seen, Some(1));
        assert_eq!(aware.latest(), Some(2));
    }

    #[test]
    fn local_renders_latest_once_per_turn() {
        let (engine, queue, aware) = consumer(StrategyName::Local);
        let subject = Subject::new();
        aware.bind(subject.as_stream());
        for v in 1..=5 {
            subject.next(v);
        }
        assert_eq!(aware.latest(), None);
        queue.run_until_idle();
        assert_eq!(aware.latest(), Some(5));
        assert_eq!(engine.count("detect_changes"), 1);
    }

    #[test]
    fn with_config_uses_default_strategy() {
        let (_engine, _queue, config) = config_with(3);
        let cfg = SchedulerConfig::default().with_default_strategy(StrategyName::Global);
        let aware: RenderAware<i32> = RenderAware::with_config(get_strategies(&config), &cfg);
        assert_eq!(aware.strategy_name(), StrategyName::Global);
    }

    #[test]
    fn switching_strategy_rebinds_under_new_behaviour() {
        let (engine, queue, aware) = consumer(StrategyName::Local);
        let subject = Subject::new();
        aware.bind(subject.as_stream());
        subject.next(1);
        aware.set_strategy(StrategyName::Native);
        queue.run_until_idle();
        assert_eq!(engine.count("detect_changes"), 0);
        subject.next(2);
        assert_eq!(engine.calls(), vec!["mark_for_check"]);
        assert_eq!(aware.latest(), Some(2));
    }

    #[test]
    fn set_strategy_str_rejects_unknown_names() {
        let (_engine, _queue, aware) = consumer(StrategyName::Native);
        assert!(aware.set_strategy_str("detach").is_ok());
        assert_eq!(aware.strategy_name(), StrategyName::Detach);
        assert_eq!(
            aware.set_strategy_str("sometimes"),
            Err(RenderError::UnknownStrategy("sometimes".into()))
        );
        assert_eq!(aware.strategy_name(), StrategyName::Detach);
    }

    #[test]
    fn errors_are_recorded_not_rendered() {
        let (engine, _queue, aware) = consumer(StrategyName::Native);
        aware.bind(Stream::fail(StreamError::new("boom")));
        assert_eq!(aware.error(), Some(StreamError::new("boom")));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn completion_is_recorded() {
        let (engine, _queue, aware) = consumer(StrategyName::Global);
        aware.bind(Stream::from_values(vec![4, 5]));
        assert!(aware.is_complete());
        assert_eq!(aware.latest(), Some(5));
        assert_eq!(engine.count("mark_dirty"), 2);
    }

    #[test]
    fn unbind_stops_rendering() {
        let (engine, queue, aware) = consumer(StrategyName::Detach);
        let subject = Subject::new();
        aware.bind(subject.as_stream());
        subject.next(1);
        aware.unbind();
        queue.run_until_idle();
        subject.next(2);
        queue.run_until_idle();
        assert!(!aware.is_bound());
        assert!(engine.calls().is_empty());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn drop_unsubscribes() {
        let (_engine, _queue, aware) = consumer(StrategyName::Native);
        let subject: Subject<i32> = Subject::new();
        aware.bind(subject.as_stream());
        assert_eq!(subject.observer_count(), 1);
        drop(aware);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn rebinding_replaces_the_source() {
        let (_engine, _queue, aware) = consumer(StrategyName::Native);
        let first = Subject::new();
        let second = Subject::new();
        aware.bind(first.as_stream());
        aware.bind(second.as_stream());
        first.next(1);
        second.next(2);
        assert_eq!(aware.latest(), Some(2));
        assert_eq!(first.observer_count(), 0);
    }

    #[tracing_test::traced_test]
    #[test]
    fn stream_failure_is_logged() {
        let (_engine, _queue, aware) = consumer(StrategyName::Native);
        aware.bind(Stream::fail(StreamError::new("socket closed")));
        assert!(logs_contain("bound stream failed"));
        assert!(logs_contain("socket closed"));
    }
}
