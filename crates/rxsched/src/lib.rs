#![forbid(unsafe_code)]

//! rxsched public facade.
//!
//! Render scheduling for reactive UI consumers: notification streams are
//! shaped by a render strategy and turned into render-engine triggers, with
//! bursts coalesced to one render per microtask turn where the strategy asks
//! for it.
//!
//! Most users only need the [`prelude`].

pub use rxsched_core::{ClockError, ClockSource, MicrotaskPrimitive, MicrotaskQueue, PlatformSlots};
pub use rxsched_runtime::{
    CoalesceConfig, Notification, Operator, ScopeKey, Stream, StreamError, Subject, Subscription,
    coalesce, coalesce_by, tick_from, unpatched_duration_selector,
};

#[cfg(feature = "render")]
pub use rxsched_render::{
    DEFAULT_STRATEGY_NAME, RenderAware, RenderEngine, RenderError, RenderStrategy,
    RenderStrategyFactoryConfig, SchedulerConfig, StrategyName, StrategyRegistry, get_strategies,
};

/// Common imports.
pub mod prelude {
    pub use rxsched_core::{ClockSource, MicrotaskQueue, PlatformSlots};
    pub use rxsched_runtime::{Notification, ScopeKey, Stream, Subject, Subscription};

    #[cfg(feature = "render")]
    pub use rxsched_render::{
        RenderAware, RenderEngine, RenderStrategyFactoryConfig, SchedulerConfig, StrategyName,
        get_strategies,
    };
}
