#![forbid(unsafe_code)]

//! Stream runtime for rxsched.
//!
//! This crate provides:
//! - [`reactive`]: single-threaded push streams, subjects and RAII
//!   subscriptions
//! - [`coalesce`]: the scoped coalescing operator that collapses notification
//!   bursts to one value per scheduling window
//! - [`tick`]: clock signals from [`rxsched_core::ClockSource`] as streams

pub mod coalesce;
pub mod reactive;
pub mod tick;

pub use coalesce::{CoalesceConfig, DurationSelector, ScopeKey, coalesce, coalesce_by};
pub use reactive::{
    Notification, Operator, Stream, StreamError, Subject, Subscriber, Subscription,
    SubscriptionScope,
};
pub use tick::{tick_from, unpatched_duration_selector};
