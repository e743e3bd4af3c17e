#![forbid(unsafe_code)]

//! Cold push streams and operators.
//!
//! A [`Stream<T>`] is a recipe: nothing happens until [`Stream::subscribe`]
//! runs the producer with a fresh [`Subscriber`]. Each subscription gets its
//! own producer run, so per-subscription state (such as coalescing windows)
//! lives inside the producer closure.
//!
//! # Invariants
//!
//! 1. A subscriber delivers nothing after its first terminal notification
//!    (`Error` or `Complete`).
//! 2. A subscriber delivers nothing after its subscription is released, even
//!    if the producer still holds a clone.
//! 3. Notifications are delivered synchronously, on the caller's stack.
//!
//! # Failure Modes
//!
//! - Sink panic: propagates to whoever emitted the notification.
//! - Re-entrant emission (a sink emitting into its own source): delivered
//!   depth-first; no borrow is held across a sink call.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::subscription::Subscription;

// ---------------------------------------------------------------------------
// Notification / StreamError
// ---------------------------------------------------------------------------

/// Error carried by a stream's `Error` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    message: Rc<str>,
}

impl StreamError {
    /// Create an error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            message: Rc::from(message),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream error: {}", self.message)
    }
}

impl std::error::Error for StreamError {}

/// One event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T> {
    /// A value.
    Next(T),
    /// Terminal failure.
    Error(StreamError),
    /// Terminal success.
    Complete,
}

impl<T> Notification<T> {
    /// Whether this notification ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Next(_))
    }
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// The producer-facing end of a subscription.
///
/// Cloning shares the closed flag and the sink.
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

struct SubscriberInner<T> {
    sink: Box<dyn Fn(Notification<T>)>,
    closed: Cell<bool>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Subscriber<T> {
    /// Wrap a notification sink.
    pub fn new(sink: impl Fn(Notification<T>) + 'static) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                sink: Box::new(sink),
                closed: Cell::new(false),
            }),
        }
    }

    /// Deliver a value unless closed.
    pub fn next(&self, value: T) {
        if !self.inner.closed.get() {
            (self.inner.sink)(Notification::Next(value));
        }
    }

    /// Deliver a terminal error unless closed; closes the subscriber.
    pub fn error(&self, error: StreamError) {
        if !self.inner.closed.replace(true) {
            (self.inner.sink)(Notification::Error(error));
        }
    }

    /// Deliver completion unless closed; closes the subscriber.
    pub fn complete(&self) {
        if !self.inner.closed.replace(true) {
            (self.inner.sink)(Notification::Complete);
        }
    }

    /// Dispatch any notification to the matching method.
    pub fn notify(&self, notification: Notification<T>) {
        match notification {
            Notification::Next(value) => self.next(value),
            Notification::Error(error) => self.error(error),
            Notification::Complete => self.complete(),
        }
    }

    /// Whether further notifications are dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Stop delivery without sending a terminal notification.
    pub fn close(&self) {
        self.inner.closed.set(true);
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// A cold, single-threaded push stream.
pub struct Stream<T> {
    producer: Rc<dyn Fn(Subscriber<T>) -> Subscription>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Stream<T> {
    /// Create a stream from a producer.
    ///
    /// The producer runs once per subscription and returns the teardown for
    /// whatever it set up.
    pub fn new(producer: impl Fn(Subscriber<T>) -> Subscription + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// A stream that completes immediately.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|subscriber| {
            subscriber.complete();
            Subscription::empty()
        })
    }

    /// A stream that never notifies.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// A stream that fails immediately with `error`.
    pub fn fail(error: StreamError) -> Self {
        Self::new(move |subscriber| {
            subscriber.error(error.clone());
            Subscription::empty()
        })
    }

    /// Subscribe with a notification sink.
    pub fn subscribe(&self, sink: impl Fn(Notification<T>) + 'static) -> Subscription {
        self.subscribe_with(Subscriber::new(sink))
    }

    /// Subscribe with a sink that only sees values.
    pub fn subscribe_next(&self, on_next: impl Fn(T) + 'static) -> Subscription {
        self.subscribe(move |notification| {
            if let Notification::Next(value) = notification {
                on_next(value);
            }
        })
    }

    /// Subscribe an existing subscriber.
    pub fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription {
        let guard = subscriber.clone();
        let mut subscription = Subscription::empty();
        subscription.add((self.producer)(subscriber));
        // Added last so it runs first: the subscriber is closed before the
        // producer's teardown can emit anything.
        subscription.add(Subscription::new(move || guard.close()));
        subscription
    }

    /// Apply an operator.
    #[must_use]
    pub fn pipe(&self, operator: &Operator<T>) -> Stream<T> {
        operator.apply(self.clone())
    }

    /// Transform each value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |downstream: Subscriber<U>| {
            let f = Rc::clone(&f);
            source.subscribe(move |notification| match notification {
                Notification::Next(value) => downstream.next(f(value)),
                Notification::Error(error) => downstream.error(error),
                Notification::Complete => downstream.complete(),
            })
        })
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit `values` synchronously on subscribe, then complete.
    pub fn from_values(values: impl Into<Vec<T>>) -> Self {
        let values: Vec<T> = values.into();
        let values: Rc<[T]> = Rc::from(values);
        Self::new(move |subscriber| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
            Subscription::empty()
        })
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// A same-type stream transform.
pub struct Operator<T> {
    transform: Rc<dyn Fn(Stream<T>) -> Stream<T>>,
}

impl<T> Clone for Operator<T> {
    fn clone(&self) -> Self {
        Self {
            transform: Rc::clone(&self.transform),
        }
    }
}

impl<T: 'static> Operator<T> {
    /// Wrap a transform.
    pub fn new(transform: impl Fn(Stream<T>) -> Stream<T> + 'static) -> Self {
        Self {
            transform: Rc::new(transform),
        }
    }

    /// The transform that returns its input unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(|source| source)
    }

    /// Transform `source`.
    #[must_use]
    pub fn apply(&self, source: Stream<T>) -> Stream<T> {
        (self.transform)(source)
    }

    /// Run `self`, then `next`.
    #[must_use]
    pub fn then(self, next: Operator<T>) -> Operator<T> {
        Operator::new(move |source| next.apply(self.apply(source)))
    }
}

impl<T> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").finish_non_exhaustive()
    }
}
