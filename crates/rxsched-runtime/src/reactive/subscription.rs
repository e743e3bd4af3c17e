#![forbid(unsafe_code)]

//! RAII subscription handle.

use std::fmt;

/// Handle to an active stream subscription.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe)) runs
/// every registered teardown exactly once, most recently added first.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardowns: Vec<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that runs `teardown` when released.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardowns: vec![Box::new(teardown)],
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self {
            teardowns: Vec::new(),
        }
    }

    /// Tie `child` to this subscription's lifetime.
    pub fn add(&mut self, child: Subscription) {
        if child.teardowns.is_empty() {
            return;
        }
        self.teardowns.push(Box::new(move || drop(child)));
    }

    /// Number of pending teardowns.
    #[must_use]
    pub fn teardown_count(&self) -> usize {
        self.teardowns.len()
    }

    /// Release now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        while let Some(teardown) = self.teardowns.pop() {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("teardowns", &self.teardowns.len())
            .finish()
    }
}
