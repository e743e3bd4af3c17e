#![forbid(unsafe_code)]

//! Test harness for rxsched.
//!
//! Provides engine and observer doubles plus fixtures shared by the
//! integration tests:
//!
//! - [`RecordingEngine`] records every render trigger in call order.
//! - [`Recorder`] collects the notifications a stream delivers.
//! - [`mock_strategy_config`] wires a recording engine to a fresh
//!   [`MicrotaskQueue`] the test drains by hand.
//! - [`strategies`] holds proptest generators for notification bursts.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rxsched_core::{ClockSource, MicrotaskQueue};
use rxsched_render::{RenderEngine, RenderStrategyFactoryConfig};
use rxsched_runtime::{Notification, ScopeKey, Stream, StreamError, Subscription};

// ============================================================================
// Engine Double
// ============================================================================

/// A render trigger, as seen by [`RecordingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineCall {
    /// [`RenderEngine::mark_for_check`].
    MarkForCheck,
    /// [`RenderEngine::mark_dirty`].
    MarkDirty,
    /// [`RenderEngine::detect_changes`].
    DetectChanges,
    /// [`RenderEngine::attach`].
    Attach,
    /// [`RenderEngine::detach`].
    Detach,
}

/// Engine double that records every trigger it receives.
pub struct RecordingEngine {
    scope: ScopeKey,
    calls: RefCell<Vec<EngineCall>>,
}

impl RecordingEngine {
    /// An engine for a fresh component scope.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scope(ScopeKey::unique())
    }

    /// An engine for the given scope.
    #[must_use]
    pub fn with_scope(scope: ScopeKey) -> Self {
        Self {
            scope,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Triggers received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    /// How many times `call` was received.
    #[must_use]
    pub fn count(&self, call: EngineCall) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    /// Whether no trigger was received.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Forget recorded triggers.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: EngineCall) {
        tracing::trace!(?call, scope = %self.scope, "engine trigger");
        self.calls.borrow_mut().push(call);
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for RecordingEngine {
    fn mark_for_check(&self) {
        self.record(EngineCall::MarkForCheck);
    }

    fn mark_dirty(&self) {
        self.record(EngineCall::MarkDirty);
    }

    fn detect_changes(&self) {
        self.record(EngineCall::DetectChanges);
    }

    fn attach(&self) {
        self.record(EngineCall::Attach);
    }

    fn detach(&self) {
        self.record(EngineCall::Detach);
    }

    fn scope(&self) -> ScopeKey {
        self.scope
    }
}

impl fmt::Debug for RecordingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingEngine")
            .field("scope", &self.scope)
            .field("calls", &self.calls.borrow().len())
            .finish()
    }
}

// ============================================================================
// Observer Double
// ============================================================================

/// Collects every notification delivered to it.
pub struct Recorder<T> {
    events: Rc<RefCell<Vec<Notification<T>>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<T: Clone + 'static> Recorder<T> {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Subscribe a recorder to `stream`.
    pub fn attach(stream: &Stream<T>) -> (Self, Subscription) {
        let recorder = Self::new();
        let sub = recorder.subscribe(stream);
        (recorder, sub)
    }

    /// Subscribe this recorder to `stream`.
    pub fn subscribe(&self, stream: &Stream<T>) -> Subscription {
        let events = Rc::clone(&self.events);
        stream.subscribe(move |n| events.borrow_mut().push(n))
    }

    /// Every notification, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<Notification<T>> {
        self.events.borrow().clone()
    }

    /// Delivered values only.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.events
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether a terminal notification was delivered.
    #[must_use]
    pub fn terminated(&self) -> bool {
        self.events.borrow().iter().any(Notification::is_terminal)
    }

    /// Whether a completion was delivered.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.events
            .borrow()
            .iter()
            .any(|n| matches!(n, Notification::Complete))
    }

    /// The delivered error, if any.
    #[must_use]
    pub fn error(&self) -> Option<StreamError> {
        self.events.borrow().iter().find_map(|n| match n {
            Notification::Error(e) => Some(e.clone()),
            _ => None,
        })
    }
}

impl<T: Clone + 'static> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A strategy config wired to a recording engine and a hand-drained queue.
pub struct MockStrategyConfig {
    /// The engine every strategy built from `config` renders through.
    pub engine: Rc<RecordingEngine>,
    /// The queue behind the clock; drain it to close windows.
    pub queue: MicrotaskQueue,
    /// Factory config for the strategies under test.
    pub config: RenderStrategyFactoryConfig,
}

/// Build a [`MockStrategyConfig`] for a fresh component scope.
#[must_use]
pub fn mock_strategy_config() -> MockStrategyConfig {
    mock_strategy_config_for(Rc::new(RecordingEngine::new()))
}

/// Build a [`MockStrategyConfig`] around an existing engine.
#[must_use]
pub fn mock_strategy_config_for(engine: Rc<RecordingEngine>) -> MockStrategyConfig {
    let queue = MicrotaskQueue::new();
    let clock = ClockSource::new(Rc::new(queue.clone()));
    let config = RenderStrategyFactoryConfig::new(Rc::clone(&engine) as Rc<dyn RenderEngine>, clock);
    MockStrategyConfig {
        engine,
        queue,
        config,
    }
}

/// Proptest generators.
pub mod strategies {
    use proptest::prelude::*;

    /// Per-turn bursts of values: each inner vec is emitted within one turn.
    pub fn bursts(max_turns: usize, max_burst: usize) -> impl Strategy<Value = Vec<Vec<i32>>> {
        prop::collection::vec(prop::collection::vec(any::<i32>(), 1..=max_burst), 1..=max_turns)
    }

    /// `(scope, value)` pairs over a small key space.
    pub fn scoped_values(scopes: u64, len: usize) -> impl Strategy<Value = Vec<(u64, i32)>> {
        prop::collection::vec((0..scopes, any::<i32>()), 0..=len)
    }
}
