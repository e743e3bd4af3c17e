#![forbid(unsafe_code)]

//! Scoped coalescing of notification bursts.
//!
//! [`coalesce`] collapses every burst of values that arrives within one
//! scheduling window into a single emission: the latest value seen before the
//! window closed. A window opens on the first value of a burst and closes when
//! the clock signal obtained from the [`DurationSelector`] fires.
//!
//! Windows are tracked per [`ScopeKey`] in an arena owned by one
//! subscription. [`coalesce`] uses a single scope; [`coalesce_by`] derives the
//! scope from each value so one operator application can serve many scopes
//! without cross-talk.
//!
//! # Algorithm
//!
//! ```text
//! on value v (scope s):
//!   window[s] absent  -> window[s] = { latest: v }, subscribe selector()
//!   window[s] present -> window[s].latest = v
//! on clock signal for window[s] (first Next, or Complete):
//!   remove window[s], emit its latest
//! on upstream Complete / Error:
//!   drop every open window (pending values are discarded), forward
//! on clock Error:
//!   drop every open window, release upstream, forward the error
//! ```
//!
//! # Invariants
//!
//! 1. At most one open window per scope.
//! 2. At most one emission per window, always the latest value offered to it.
//! 3. A window never outlives its closing signal; no window exists before the
//!    first value of its scope.
//! 4. Windows of one scope close, and so emit, in the order they were opened.
//! 5. Releasing the subscription drops every open window and cancels its
//!    clock registration, so nothing is emitted afterwards.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Upstream completes mid-window | Completion forwarded at once, pending value lost |
//! | Upstream errors mid-window | Error forwarded at once, pending value lost |
//! | Clock signal errors | Error forwarded, all windows dropped, upstream released |
//! | Clock signal fires synchronously | Window closes during the value's delivery |
//!
//! The first row is deliberate: a burst followed by a synchronous teardown
//! yields completion without the burst's final value. Callers that need the
//! value must keep the source open until the window closes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;

use crate::reactive::{Notification, Operator, Stream, StreamError, Subscriber, Subscription};

/// Factory for fresh window-closing signals.
///
/// Each call must return a new stream; the operator subscribes to it once
/// per window.
pub type DurationSelector = Rc<dyn Fn() -> Stream<()>>;

// ---------------------------------------------------------------------------
// ScopeKey / CoalesceConfig
// ---------------------------------------------------------------------------

/// Identifies the grouping unit windows are tracked under.
///
/// Typically one component instance. Keys are plain values; identity is
/// whatever the issuer decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(u64);

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

impl ScopeKey {
    /// A key from a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// A key distinct from every other key returned by this function.
    #[must_use]
    pub fn unique() -> Self {
        Self(NEXT_SCOPE.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Configuration for [`coalesce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalesceConfig {
    /// Scope the windows are tracked under.
    pub scope: ScopeKey,
}

impl CoalesceConfig {
    /// Coalesce under `scope`.
    #[must_use]
    pub const fn new(scope: ScopeKey) -> Self {
        Self { scope }
    }
}

// ---------------------------------------------------------------------------
// ScopeArena
// ---------------------------------------------------------------------------

struct Window<T> {
    id: u64,
    latest: T,
    pending: Option<Subscription>,
}

/// Open scheduling windows, keyed by scope.
///
/// Entries are created by the first value of a burst and removed when the
/// window closes or the arena is cleared.
pub(crate) struct ScopeArena<T> {
    windows: AHashMap<ScopeKey, Window<T>>,
    next_window: u64,
}

impl<T> ScopeArena<T> {
    /// An arena with no open windows.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            windows: AHashMap::new(),
            next_window: 0,
        }
    }

    /// Number of open windows.
    #[must_use]
    pub(crate) fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Record `value` for `scope`. Returns the new window id if this opened
    /// a window, `None` if it overwrote an open one.
    fn offer(&mut self, scope: ScopeKey, value: T) -> Option<u64> {
        if let Some(window) = self.windows.get_mut(&scope) {
            window.latest = value;
            return None;
        }
        let id = self.next_window;
        self.next_window = self.next_window.wrapping_add(1);
        self.windows.insert(
            scope,
            Window {
                id,
                latest: value,
                pending: None,
            },
        );
        Some(id)
    }

    /// Store the clock subscription of window `id`. Hands it back if that
    /// window has already closed.
    fn attach(&mut self, scope: ScopeKey, id: u64, pending: Subscription) -> Option<Subscription> {
        match self.windows.get_mut(&scope) {
            Some(window) if window.id == id => {
                window.pending = Some(pending);
                None
            }
            _ => Some(pending),
        }
    }

    /// Remove window `id` of `scope`, if it is still the open one.
    fn close(&mut self, scope: ScopeKey, id: u64) -> Option<Window<T>> {
        match self.windows.get(&scope) {
            Some(window) if window.id == id => self.windows.remove(&scope),
            _ => None,
        }
    }

    /// Remove every window.
    fn drain(&mut self) -> Vec<Window<T>> {
        self.windows.drain().map(|(_, window)| window).collect()
    }
}

impl<T> Default for ScopeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ScopeArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeArena")
            .field("open_windows", &self.open_windows())
            .finish()
    }
}

type SharedArena<T> = Rc<RefCell<ScopeArena<T>>>;

/// The operator's own upstream subscription, once `subscribe` has returned.
type UpstreamSlot = Rc<RefCell<Option<Subscription>>>;

/// Release the upstream subscription outside the slot borrow.
fn release_upstream(slot: &Weak<RefCell<Option<Subscription>>>) {
    if let Some(slot) = slot.upgrade() {
        let upstream = slot.borrow_mut().take();
        drop(upstream);
    }
}

/// Drop every open window. Clock subscriptions are released after the
/// arena borrow ends.
fn discard_windows<T>(arena: &SharedArena<T>, reason: &'static str) {
    let dropped = arena.borrow_mut().drain();
    if !dropped.is_empty() {
        tracing::debug!(
            windows = dropped.len(),
            reason,
            "discarding open coalescing windows"
        );
    }
    drop(dropped);
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Coalesce bursts under a single scope.
///
/// Equivalent to [`coalesce_by`] with a constant key.
#[must_use]
pub fn coalesce<T: 'static>(selector: DurationSelector, config: CoalesceConfig) -> Operator<T> {
    let scope = config.scope;
    coalesce_by(selector, move |_: &T| scope)
}

/// Coalesce bursts, deriving each value's scope with `key`.
///
/// Every subscription to the resulting stream owns a fresh window arena.
#[must_use]
pub fn coalesce_by<T: 'static>(
    selector: DurationSelector,
    key: impl Fn(&T) -> ScopeKey + 'static,
) -> Operator<T> {
    let key: Rc<dyn Fn(&T) -> ScopeKey> = Rc::new(key);
    Operator::new(move |source: Stream<T>| {
        let selector = Rc::clone(&selector);
        let key = Rc::clone(&key);
        Stream::new(move |downstream: Subscriber<T>| {
            let arena: SharedArena<T> = Rc::new(RefCell::new(ScopeArena::new()));
            let upstream: UpstreamSlot = Rc::new(RefCell::new(None));
            let terminated = downstream.clone();

            let subscription = {
                let arena = Rc::clone(&arena);
                let selector = Rc::clone(&selector);
                let key = Rc::clone(&key);
                let slot = Rc::downgrade(&upstream);
                source.subscribe(move |notification| match notification {
                    Notification::Next(_) if downstream.is_closed() => {}
                    Notification::Next(value) => {
                        let scope = key(&value);
                        let opened = arena.borrow_mut().offer(scope, value);
                        if let Some(id) = opened {
                            open_window(&arena, &selector, &downstream, &slot, scope, id);
                        }
                    }
                    Notification::Error(error) => {
                        discard_windows(&arena, "upstream error");
                        downstream.error(error);
                    }
                    Notification::Complete => {
                        discard_windows(&arena, "upstream complete");
                        downstream.complete();
                    }
                })
            };

            // Downstream may already be terminated, e.g. by a synchronous clock error.
            if terminated.is_closed() {
                drop(subscription);
            } else {
                upstream.replace(Some(subscription));
            }

            Subscription::new(move || {
                discard_windows(&arena, "unsubscribed");
                let upstream = upstream.borrow_mut().take();
                drop(upstream);
            })
        })
    })
}

fn open_window<T: 'static>(
    arena: &SharedArena<T>,
    selector: &DurationSelector,
    downstream: &Subscriber<T>,
    upstream: &Weak<RefCell<Option<Subscription>>>,
    scope: ScopeKey,
    id: u64,
) {
    tracing::trace!(%scope, window = id, "coalescing window opened");

    let weak: Weak<RefCell<ScopeArena<T>>> = Rc::downgrade(arena);
    let target = downstream.clone();
    let upstream = Weak::clone(upstream);
    let signal = selector();
    let pending = signal.subscribe(move |notification| {
        let Some(arena) = weak.upgrade() else {
            return;
        };
        match notification {
            Notification::Next(()) | Notification::Complete => {
                let closed = arena.borrow_mut().close(scope, id);
                if let Some(Window {
                    latest, pending, ..
                }) = closed
                {
                    drop(pending);
                    tracing::trace!(%scope, window = id, "coalescing window closed");
                    target.next(latest);
                }
            }
            Notification::Error(error) => {
                discard_windows(&arena, "clock error");
                release_upstream(&upstream);
                target.error(clock_error(error));
            }
        }
    });

    let rejected = arena.borrow_mut().attach(scope, id, pending);
    drop(rejected);
}

fn clock_error(error: StreamError) -> StreamError {
    StreamError::new(format!("clock signal failed: {}", error.message()))
}
