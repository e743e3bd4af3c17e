#![forbid(unsafe_code)]

//! Microtask primitives.
//!
//! The scheduler only ever asks the host for one thing: "run this closure once
//! the current synchronous burst has finished". [`MicrotaskPrimitive`] is that
//! contract. Hosts with a real event loop implement it directly; everything
//! else (tests, headless runtimes, embedders that pump their own loop) can use
//! [`MicrotaskQueue`], a FIFO queue drained explicitly with
//! [`MicrotaskQueue::run_until_idle`].
//!
//! # Invariants
//!
//! 1. Tasks run in the order they were queued.
//! 2. A task queued while the queue is draining runs in the same drain, after
//!    every task that was already queued.
//! 3. A re-entrant `run_until_idle` call (from inside a task) is a no-op; the
//!    outer drain picks up whatever was queued.
//! 4. No task runs during `queue_microtask`.
//!
//! # Failure Modes
//!
//! - Task panic: propagates out of `run_until_idle`. The queue is left in a
//!   consistent state (not draining) and the remaining tasks stay queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Host primitive that defers a task to the next microtask checkpoint.
pub trait MicrotaskPrimitive {
    /// Queue `task` to run once the current synchronous burst has drained.
    fn queue_microtask(&self, task: Task);

    /// Short label used in diagnostics.
    fn label(&self) -> &str {
        "microtask"
    }
}

// ---------------------------------------------------------------------------
// MicrotaskQueue
// ---------------------------------------------------------------------------

/// Single-threaded FIFO microtask queue.
///
/// Cloning shares the underlying queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    inner: Rc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    tasks: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
    executed: Cell<u64>,
}

/// Resets the draining flag even if a task panics.
struct DrainGuard<'a> {
    draining: &'a Cell<bool>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.draining.set(false);
    }
}

impl MicrotaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Whether no task is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// Total number of tasks run over the queue's lifetime.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.inner.executed.get()
    }

    /// Run the oldest queued task, if any. Returns whether a task ran.
    pub fn run_one(&self) -> bool {
        let task = self.inner.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                self.inner.executed.set(self.inner.executed.get() + 1);
                true
            }
            None => false,
        }
    }

    /// Drain the queue, including tasks queued by the tasks being run.
    ///
    /// Returns the number of tasks run. Re-entrant calls return `0`.
    pub fn run_until_idle(&self) -> usize {
        if self.inner.draining.replace(true) {
            return 0;
        }
        let _guard = DrainGuard {
            draining: &self.inner.draining,
        };

        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl MicrotaskPrimitive for MicrotaskQueue {
    fn queue_microtask(&self, task: Task) {
        self.inner.tasks.borrow_mut().push_back(task);
    }

    fn label(&self) -> &str {
        "microtask-queue"
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .field("executed", &self.executed())
            .field("draining", &self.inner.draining.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Instrumented
// ---------------------------------------------------------------------------

/// A primitive wrapped by an instrumentation layer.
///
/// Every task is counted, then forwarded to `target`. Instrumentation layers
/// commonly forward to a *different* queue than the one they replaced, which
/// reorders or defers firing relative to real microtask boundaries. That is
/// why [`ClockSource`](crate::ClockSource) resolution prefers the unpatched
/// slot over whatever is installed in its place.
pub struct Instrumented {
    target: Rc<dyn MicrotaskPrimitive>,
    intercepted: Cell<usize>,
}

impl Instrumented {
    /// Wrap `target`.
    #[must_use]
    pub fn new(target: Rc<dyn MicrotaskPrimitive>) -> Self {
        Self {
            target,
            intercepted: Cell::new(0),
        }
    }

    /// Number of tasks that went through the wrapper.
    #[must_use]
    pub fn intercepted(&self) -> usize {
        self.intercepted.get()
    }
}

impl MicrotaskPrimitive for Instrumented {
    fn queue_microtask(&self, task: Task) {
        self.intercepted.set(self.intercepted.get() + 1);
        self.target.queue_microtask(task);
    }

    fn label(&self) -> &str {
        "instrumented"
    }
}

impl fmt::Debug for Instrumented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented")
            .field("target", &self.target.label())
            .field("intercepted", &self.intercepted.get())
            .finish()
    }
}
