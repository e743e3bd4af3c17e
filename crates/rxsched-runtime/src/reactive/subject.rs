#![forbid(unsafe_code)]

//! Hot multicast source.
//!
//! A [`Subject<T>`] is how external code pushes "state changed" notifications
//! into the stream world. Every live subscriber sees every value emitted
//! after it subscribed.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in subscription order.
//! 2. After `complete()` or `error()`, the subject is stopped: further
//!    emissions are ignored and late subscribers receive the terminal
//!    notification immediately.
//! 3. Releasing a subscription removes the subscriber before the next
//!    emission.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::stream::{Notification, Stream, StreamError, Subscriber};
use super::subscription::Subscription;

#[derive(Clone)]
enum Terminal {
    Error(StreamError),
    Complete,
}

struct SubjectState<T> {
    observers: Vec<(u64, Subscriber<T>)>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// Multicast notification source.
///
/// Cloning shares the subscriber list.
pub struct Subject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a subject with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                observers: Vec::new(),
                next_id: 0,
                terminal: None,
            })),
        }
    }

    /// Emit `value` to every current subscriber.
    pub fn next(&self, value: T) {
        for subscriber in self.snapshot() {
            subscriber.next(value.clone());
        }
    }

    /// Fail every subscriber and stop the subject.
    pub fn error(&self, error: StreamError) {
        for subscriber in self.stop(Terminal::Error(error.clone())) {
            subscriber.error(error.clone());
        }
    }

    /// Complete every subscriber and stop the subject.
    pub fn complete(&self) {
        for subscriber in self.stop(Terminal::Complete) {
            subscriber.complete();
        }
    }

    /// Whether `complete()` or `error()` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.borrow().terminal.is_some()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// View this subject as a stream.
    #[must_use]
    pub fn as_stream(&self) -> Stream<T> {
        let state = Rc::clone(&self.state);
        Stream::new(move |subscriber: Subscriber<T>| {
            let terminal = state.borrow().terminal.clone();
            if let Some(terminal) = terminal {
                subscriber.notify(match terminal {
                    Terminal::Error(error) => Notification::Error(error),
                    Terminal::Complete => Notification::Complete,
                });
                return Subscription::empty();
            }

            let id = {
                let mut state = state.borrow_mut();
                let id = state.next_id;
                state.next_id += 1;
                state.observers.push((id, subscriber));
                id
            };
            let weak: Weak<RefCell<SubjectState<T>>> = Rc::downgrade(&state);
            Subscription::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().observers.retain(|(other, _)| *other != id);
                }
            })
        })
    }

    fn snapshot(&self) -> Vec<Subscriber<T>> {
        let state = self.state.borrow();
        if state.terminal.is_some() {
            return Vec::new();
        }
        state.observers.iter().map(|(_, s)| s.clone()).collect()
    }

    fn stop(&self, terminal: Terminal) -> Vec<Subscriber<T>> {
        let mut state = self.state.borrow_mut();
        if state.terminal.is_some() {
            return Vec::new();
        }
        state.terminal = Some(terminal);
        state.observers.drain(..).map(|(_, s)| s).collect()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Subject")
            .field("observers", &state.observers.len())
            .field("stopped", &state.terminal.is_some())
            .finish()
    }
}
