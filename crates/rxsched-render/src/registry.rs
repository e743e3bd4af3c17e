#![forbid(unsafe_code)]

//! Per-consumer strategy registry.
//!
//! [`get_strategies`] builds all five strategies against one consumer's
//! capabilities. The registry is a fixed table indexed by [`StrategyName`],
//! so lookup by name never fails once the name has been parsed.

use std::fmt;
use std::ops::Index;

use crate::config::SchedulerConfig;
use crate::error::RenderError;
use crate::strategy::{
    DEFAULT_STRATEGY_NAME, RenderStrategy, RenderStrategyFactoryConfig, StrategyName,
    create_strategy,
};

/// All strategies for one consumer, keyed by name.
pub struct StrategyRegistry<T> {
    strategies: [RenderStrategy<T>; 5],
}

impl<T: 'static> StrategyRegistry<T> {
    /// Build every strategy against `config`.
    #[must_use]
    pub fn new(config: &RenderStrategyFactoryConfig) -> Self {
        Self {
            strategies: StrategyName::ALL.map(|name| create_strategy(name, config)),
        }
    }

    /// The strategy called `name`.
    #[must_use]
    pub fn get(&self, name: StrategyName) -> &RenderStrategy<T> {
        &self.strategies[name.index()]
    }

    /// The strategy whose configuration name is `name`.
    pub fn lookup(&self, name: &str) -> Result<&RenderStrategy<T>, RenderError> {
        Ok(self.get(name.parse()?))
    }

    /// The built-in default strategy.
    #[must_use]
    pub fn default_strategy(&self) -> &RenderStrategy<T> {
        self.get(DEFAULT_STRATEGY_NAME)
    }

    /// The default strategy `config` selects.
    #[must_use]
    pub fn select(&self, config: &SchedulerConfig) -> &RenderStrategy<T> {
        self.get(config.default_strategy)
    }

    /// Registered names, in registry order.
    pub fn names(&self) -> impl Iterator<Item = StrategyName> + '_ {
        self.strategies.iter().map(RenderStrategy::name)
    }

    /// Registered strategies, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderStrategy<T>> {
        self.strategies.iter()
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<T> Clone for StrategyRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for StrategyRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T: 'static> Index<StrategyName> for StrategyRegistry<T> {
    type Output = RenderStrategy<T>;

    fn index(&self, name: StrategyName) -> &Self::Output {
        self.get(name)
    }
}

/// Build the strategy registry for one consumer.
#[must_use]
pub fn get_strategies<T: 'static>(config: &RenderStrategyFactoryConfig) -> StrategyRegistry<T> {
    StrategyRegistry::new(config)
}
