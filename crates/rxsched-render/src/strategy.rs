#![forbid(unsafe_code)]

//! Render strategies.
//!
//! A strategy decides two things for a consumer: how its notification stream
//! is shaped before rendering (the *behaviour*), and which engine trigger a
//! passed-through notification fires (the *render*).
//!
//! | Name     | Behaviour                  | Render                                 |
//! |----------|----------------------------|----------------------------------------|
//! | `noop`   | identity                   | nothing                                |
//! | `native` | identity                   | `mark_for_check`                       |
//! | `global` | identity                   | `mark_dirty` (root level)              |
//! | `local`  | coalesce, component scope  | `detect_changes`                       |
//! | `detach` | coalesce, component scope  | `attach`, `detect_changes`, `detach`   |
//!
//! `native` and `global` only *request* a pass, and the engine already batches
//! requests. `local` and `detach` force a synchronous pass, which the engine
//! does not batch, so they coalesce bursts per component: every notification
//! that arrives within one microtask turn yields a single render.
//!
//! # Invariants
//!
//! 1. Factories are pure: the same config yields behaviourally identical
//!    strategies, and strategies built from different configs share nothing.
//! 2. `behaviour()` returns a fresh operator handle each call; every
//!    subscription through it owns its own coalescing windows.
//! 3. `render()` calls only the triggers listed above, in that order.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rxsched_core::ClockSource;
use rxsched_runtime::{CoalesceConfig, Operator, coalesce, unpatched_duration_selector};

use crate::engine::RenderEngine;
use crate::error::RenderError;

// =============================================================================
// Strategy Names
// =============================================================================

/// The closed set of render strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrategyName {
    /// No rendering; diagnostics only.
    Noop,
    /// Mark for check on every notification.
    Native,
    /// Root-level mark dirty on every notification.
    Global,
    /// Coalesced synchronous render of the component.
    Local,
    /// Coalesced synchronous render of an otherwise detached component.
    Detach,
}

/// Strategy a consumer gets when it names none.
pub const DEFAULT_STRATEGY_NAME: StrategyName = StrategyName::Native;

impl StrategyName {
    /// Every strategy, in registry order.
    pub const ALL: [StrategyName; 5] = [
        Self::Noop,
        Self::Native,
        Self::Global,
        Self::Local,
        Self::Detach,
    ];

    /// The configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Native => "native",
            Self::Global => "global",
            Self::Local => "local",
            Self::Detach => "detach",
        }
    }

    /// Whether the strategy's behaviour coalesces notifications.
    #[must_use]
    pub const fn coalesces(self) -> bool {
        matches!(self, Self::Local | Self::Detach)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Noop => 0,
            Self::Native => 1,
            Self::Global => 2,
            Self::Local => 3,
            Self::Detach => 4,
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyName {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RenderError::UnknownStrategy(s.to_string()))
    }
}

// =============================================================================
// Factory Configuration
// =============================================================================

/// Per-consumer capabilities the strategy factories need.
#[derive(Clone)]
pub struct RenderStrategyFactoryConfig {
    /// Render triggers of the owning component.
    pub engine: Rc<dyn RenderEngine>,
    /// Clock anchored to the unpatched microtask primitive.
    pub clock: ClockSource,
}

impl RenderStrategyFactoryConfig {
    /// Bundle an engine handle with a clock.
    #[must_use]
    pub fn new(engine: Rc<dyn RenderEngine>, clock: ClockSource) -> Self {
        Self { engine, clock }
    }

    fn coalescing<T: 'static>(&self) -> Operator<T> {
        coalesce(
            unpatched_duration_selector(&self.clock),
            CoalesceConfig::new(self.engine.scope()),
        )
    }
}

impl fmt::Debug for RenderStrategyFactoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStrategyFactoryConfig")
            .field("scope", &self.engine.scope())
            .field("clock", &self.clock)
            .finish()
    }
}

// =============================================================================
// Render Strategy
// =============================================================================

/// A render strategy bound to one consumer.
pub enum RenderStrategy<T> {
    /// See [`StrategyName::Noop`].
    Noop,
    /// See [`StrategyName::Native`].
    Native { engine: Rc<dyn RenderEngine> },
    /// See [`StrategyName::Global`].
    Global { engine: Rc<dyn RenderEngine> },
    /// See [`StrategyName::Local`].
    Local {
        engine: Rc<dyn RenderEngine>,
        coalescing: Operator<T>,
    },
    /// See [`StrategyName::Detach`].
    Detach {
        engine: Rc<dyn RenderEngine>,
        coalescing: Operator<T>,
    },
}

impl<T: 'static> RenderStrategy<T> {
    /// The strategy's name.
    #[must_use]
    pub fn name(&self) -> StrategyName {
        match self {
            Self::Noop => StrategyName::Noop,
            Self::Native { .. } => StrategyName::Native,
            Self::Global { .. } => StrategyName::Global,
            Self::Local { .. } => StrategyName::Local,
            Self::Detach { .. } => StrategyName::Detach,
        }
    }

    /// The transform to apply to the consumer's notification stream.
    #[must_use]
    pub fn behaviour(&self) -> Operator<T> {
        match self {
            Self::Noop | Self::Native { .. } | Self::Global { .. } => Operator::identity(),
            Self::Local { coalescing, .. } | Self::Detach { coalescing, .. } => {
                coalescing.clone()
            }
        }
    }

    /// Trigger a render through the engine.
    pub fn render(&self) {
        match self {
            Self::Noop => {}
            Self::Native { engine } => engine.mark_for_check(),
            Self::Global { engine } => engine.mark_dirty(),
            Self::Local { engine, .. } => engine.detect_changes(),
            Self::Detach { engine, .. } => {
                engine.attach();
                engine.detect_changes();
                engine.detach();
            }
        }
    }
}

impl<T> Clone for RenderStrategy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Noop => Self::Noop,
            Self::Native { engine } => Self::Native {
                engine: Rc::clone(engine),
            },
            Self::Global { engine } => Self::Global {
                engine: Rc::clone(engine),
            },
            Self::Local { engine, coalescing } => Self::Local {
                engine: Rc::clone(engine),
                coalescing: coalescing.clone(),
            },
            Self::Detach { engine, coalescing } => Self::Detach {
                engine: Rc::clone(engine),
                coalescing: coalescing.clone(),
            },
        }
    }
}

impl<T: 'static> fmt::Debug for RenderStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStrategy")
            .field("name", &self.name())
            .finish()
    }
}

// =============================================================================
// Factories
// =============================================================================

/// A strategy that never renders.
#[must_use]
pub fn create_noop_strategy<T>() -> RenderStrategy<T> {
    RenderStrategy::Noop
}

/// Mark for check on every notification, no coalescing.
#[must_use]
pub fn create_native_strategy<T>(config: &RenderStrategyFactoryConfig) -> RenderStrategy<T> {
    RenderStrategy::Native {
        engine: Rc::clone(&config.engine),
    }
}

/// Root-level mark dirty on every notification, no coalescing.
#[must_use]
pub fn create_global_strategy<T>(config: &RenderStrategyFactoryConfig) -> RenderStrategy<T> {
    RenderStrategy::Global {
        engine: Rc::clone(&config.engine),
    }
}

/// Synchronous render of this component, coalesced per microtask turn.
#[must_use]
pub fn create_local_strategy<T: 'static>(
    config: &RenderStrategyFactoryConfig,
) -> RenderStrategy<T> {
    RenderStrategy::Local {
        engine: Rc::clone(&config.engine),
        coalescing: config.coalescing(),
    }
}

/// Attach, render synchronously, detach again; coalesced per microtask turn.
#[must_use]
pub fn create_detach_strategy<T: 'static>(
    config: &RenderStrategyFactoryConfig,
) -> RenderStrategy<T> {
    RenderStrategy::Detach {
        engine: Rc::clone(&config.engine),
        coalescing: config.coalescing(),
    }
}

/// Build the strategy called `name`.
#[must_use]
pub fn create_strategy<T: 'static>(
    name: StrategyName,
    config: &RenderStrategyFactoryConfig,
) -> RenderStrategy<T> {
    tracing::debug!(strategy = %name, scope = %config.engine.scope(), "creating render strategy");
    match name {
        StrategyName::Noop => create_noop_strategy(),
        StrategyName::Native => create_native_strategy(config),
        StrategyName::Global => create_global_strategy(config),
        StrategyName::Local => create_local_strategy(config),
        StrategyName::Detach => create_detach_strategy(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingEngine, config_with};
    use rxsched_runtime::{Stream, Subject};
    use std::cell::RefCell;

    fn drive<T: Clone + 'static>(
        strategy: &RenderStrategy<T>,
        source: &Stream<T>,
    ) -> rxsched_runtime::Subscription {
        let strategy = strategy.clone();
        source
            .pipe(&strategy.behaviour())
            .subscribe_next(move |_| strategy.render())
    }

    #[test]
    fn names_round_trip_through_strings() {
        for name in StrategyName::ALL {
            assert_eq!(name.as_str().parse::<StrategyName>(), Ok(name));
            assert_eq!(name.to_string(), name.as_str());
        }
        assert_eq!(" Local ".parse::<StrategyName>(), Ok(StrategyName::Local));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "zoneless".parse::<StrategyName>().unwrap_err();
        assert_eq!(err, RenderError::UnknownStrategy("zoneless".into()));
        assert!(err.to_string().contains("zoneless"));
    }

    #[test]
    fn default_is_native() {
        assert_eq!(DEFAULT_STRATEGY_NAME, StrategyName::Native);
        assert_eq!(DEFAULT_STRATEGY_NAME.as_str(), "native");
    }

    #[test]
    fn only_local_and_detach_coalesce() {
        let coalescing: Vec<_> = StrategyName::ALL
            .into_iter()
            .filter(|n| n.coalesces())
            .collect();
        assert_eq!(coalescing, vec![StrategyName::Local, StrategyName::Detach]);
    }

    #[test]
    fn noop_render_touches_nothing() {
        let (engine, _queue, _config) = config_with(1);
        let strategy: RenderStrategy<i32> = create_noop_strategy();
        strategy.render();
        strategy.render();
        assert_eq!(strategy.name(), StrategyName::Noop);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn native_marks_for_check_once_per_render() {
        let (engine, _queue, config) = config_with(1);
        let strategy: RenderStrategy<i32> = create_native_strategy(&config);
        assert_eq!(strategy.name(), StrategyName::Native);
        strategy.render();
        assert_eq!(engine.calls(), vec!["mark_for_check"]);
    }

    #[test]
    fn native_behaviour_is_identity() {
        let (engine, _queue, config) = config_with(1);
        let strategy = create_native_strategy(&config);
        let subject = Subject::new();
        let _sub = drive(&strategy, &subject.as_stream());
        for v in 0..5 {
            subject.next(v);
        }
        assert_eq!(engine.count("mark_for_check"), 5);
    }

    #[test]
    fn global_marks_dirty() {
        let (engine, _queue, config) = config_with(1);
        let strategy: RenderStrategy<()> = create_global_strategy(&config);
        strategy.render();
        assert_eq!(engine.calls(), vec!["mark_dirty"]);
    }

    #[test]
    fn local_coalesces_and_detects_changes() {
        let (engine, queue, config) = config_with(1);
        let strategy = create_local_strategy(&config);
        let subject = Subject::new();
        let _sub = drive(&strategy, &subject.as_stream());
        for v in 0..5 {
            subject.next(v);
        }
        assert!(engine.calls().is_empty());
        queue.run_until_idle();
        assert_eq!(engine.calls(), vec!["detect_changes"]);
    }

    #[test]
    fn detach_reattaches_around_render() {
        let (engine, queue, config) = config_with(1);
        let strategy = create_detach_strategy(&config);
        let subject = Subject::new();
        let _sub = drive(&strategy, &subject.as_stream());
        subject.next(1);
        subject.next(2);
        queue.run_until_idle();
        assert_eq!(engine.calls(), vec!["attach", "detect_changes", "detach"]);
    }

    #[test]
    fn coalesced_value_is_latest() {
        let (_engine, queue, config) = config_with(1);
        let strategy = create_local_strategy(&config);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let subject = Subject::new();
        let _sub = subject
            .as_stream()
            .pipe(&strategy.behaviour())
            .subscribe_next(move |v| s.borrow_mut().push(v));
        subject.next(1);
        subject.next(2);
        subject.next(3);
        queue.run_until_idle();
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn strategies_from_different_configs_share_nothing() {
        let (engine_a, queue_a, config_a) = config_with(1);
        let (engine_b, _queue_b, config_b) = config_with(2);
        let a = create_local_strategy(&config_a);
        let b = create_local_strategy(&config_b);
        let subject = Subject::new();
        let _sa = drive(&a, &subject.as_stream());
        let _sb = drive(&b, &subject.as_stream());
        subject.next(1);
        queue_a.run_until_idle();
        assert_eq!(engine_a.count("detect_changes"), 1);
        assert_eq!(engine_b.count("detect_changes"), 0);
    }

    #[test]
    fn create_strategy_dispatches_by_name() {
        let (_engine, _queue, config) = config_with(1);
        for name in StrategyName::ALL {
            let strategy: RenderStrategy<u8> = create_strategy(name, &config);
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn unsubscribed_local_never_renders() {
        let (engine, queue, config) = config_with(1);
        let strategy = create_local_strategy(&config);
        let subject = Subject::new();
        let sub = drive(&strategy, &subject.as_stream());
        subject.next(1);
        drop(sub);
        queue.run_until_idle();
        assert!(engine.calls().is_empty());
    }
}
