#![forbid(unsafe_code)]

//! Lifecycle holder for the subscriptions of one logical owner.

use std::fmt;

use super::stream::Stream;
use super::subscription::Subscription;

/// Collects subscriptions for a logical scope (e.g., a component).
///
/// When the scope is dropped, all held subscriptions are released, cleanly
/// disconnecting every stream the owner was listening to.
///
/// # Usage
///
/// ```ignore
/// let mut scope = SubscriptionScope::new();
///
/// let changes = Subject::new();
/// scope.subscribe(&changes.as_stream(), |v| println!("value: {v}"));
///
/// // When scope drops, all subscriptions are released.
/// ```
///
/// # Invariants
///
/// 1. Subscriptions are released in reverse registration order.
/// 2. After drop or `clear()`, no callback registered through this scope fires.
/// 3. `clear()` leaves the scope empty and reusable.
#[derive(Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the scope is dropped or cleared.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to the values of `source` within this scope.
    ///
    /// Returns the scope for chaining.
    pub fn subscribe<T: 'static>(
        &mut self,
        source: &Stream<T>,
        on_next: impl Fn(T) + 'static,
    ) -> &mut Self {
        let sub = source.subscribe_next(on_next);
        self.subscriptions.push(sub);
        self
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything now.
    pub fn clear(&mut self) {
        while let Some(sub) = self.subscriptions.pop() {
            drop(sub);
        }
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
