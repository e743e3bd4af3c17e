#![forbid(unsafe_code)]

//! Render strategies for rxsched.
//!
//! This crate provides:
//! - [`RenderEngine`], the capability interface a UI engine adapter implements
//!   per component
//! - [`RenderStrategy`] and its factories: `noop`, `native`, `global`,
//!   `local` and `detach`
//! - [`StrategyRegistry`], built per consumer by [`get_strategies`]
//! - [`RenderAware`], a consumer that renders a bound stream through the
//!   active strategy
//! - [`SchedulerConfig`], optionally loaded from TOML (`policy-config`)
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rxsched_core::{ClockSource, MicrotaskQueue};
//! use rxsched_render::{
//!     RenderEngine, RenderStrategyFactoryConfig, StrategyName, get_strategies,
//! };
//! use rxsched_runtime::ScopeKey;
//!
//! struct Component;
//!
//! impl RenderEngine for Component {
//!     fn mark_for_check(&self) {}
//!     fn mark_dirty(&self) {}
//!     fn detect_changes(&self) {}
//!     fn attach(&self) {}
//!     fn detach(&self) {}
//!     fn scope(&self) -> ScopeKey {
//!         ScopeKey::from_raw(1)
//!     }
//! }
//!
//! let queue = MicrotaskQueue::new();
//! let config = RenderStrategyFactoryConfig::new(
//!     Rc::new(Component),
//!     ClockSource::new(Rc::new(queue.clone())),
//! );
//! let strategies = get_strategies::<u32>(&config);
//! assert_eq!(strategies[StrategyName::Local].name(), StrategyName::Local);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod render_aware;
pub mod strategy;

pub use config::SchedulerConfig;
pub use engine::RenderEngine;
pub use error::{ConfigError, RenderError};
pub use registry::{StrategyRegistry, get_strategies};
pub use render_aware::RenderAware;
pub use strategy::{
    DEFAULT_STRATEGY_NAME, RenderStrategy, RenderStrategyFactoryConfig, StrategyName,
    create_detach_strategy, create_global_strategy, create_local_strategy,
    create_native_strategy, create_noop_strategy, create_strategy,
};
