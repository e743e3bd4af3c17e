#![forbid(unsafe_code)]

//! Reactive stream primitives for rxsched.
//!
//! This module provides the push-based substrate render scheduling is built
//! on:
//!
//! - [`Stream`]: A cold stream; each subscription runs its producer afresh.
//! - [`Subscriber`]: The producer-facing sink, closed after a terminal
//!   notification or after its subscription is released.
//! - [`Subscription`]: RAII guard that tears the subscription down on drop.
//! - [`Subject`]: A hot multicast source for externally pushed notifications.
//! - [`Operator`]: A same-type stream transform (`identity`, composition).
//! - [`SubscriptionScope`]: Holds the subscriptions of one owner.
//!
//! # Architecture
//!
//! Everything is single-threaded and uses `Rc`/`Cell`/`RefCell`. Delivery is
//! synchronous; the only deferred work in the system is the clock signal that
//! closes a coalescing window (see [`crate::coalesce`]).
//!
//! # Invariants
//!
//! 1. At most one terminal notification reaches any subscriber.
//! 2. Nothing reaches a subscriber after its subscription is dropped.
//! 3. No `RefCell` borrow is held while a sink runs, so sinks may emit,
//!    subscribe, or unsubscribe re-entrantly.

pub mod scope;
pub mod stream;
pub mod subject;
pub mod subscription;

pub use scope::SubscriptionScope;
pub use stream::{Notification, Operator, Stream, StreamError, Subscriber};
pub use subject::Subject;
pub use subscription::Subscription;
