#![forbid(unsafe_code)]

//! Clock source for scheduling windows.
//!
//! A [`ClockSource`] answers one question: "when has the current microtask
//! fully drained?". Each call to [`ClockSource::schedule`] registers exactly
//! one callback with the underlying [`MicrotaskPrimitive`] and returns a
//! [`PendingTick`] guard; the callback fires once at the next checkpoint
//! unless the guard was dropped first.
//!
//! # Resolution
//!
//! Instrumentation layers often replace the host's asynchronous primitive with
//! a wrapper that defers or reorders work. The host keeps the original around
//! in a well-known slot. [`resolve_unpatched`] inspects [`PlatformSlots`]:
//!
//! 1. `unpatched` slot present: use it.
//! 2. otherwise `native` present: use it (assumed unpatched).
//! 3. neither: [`ClockError::PrimitiveUnavailable`]. There is no other timing
//!    source, so callers must treat this as fatal.
//!
//! Resolution happens once at start-up; the result is injected wherever a
//! clock is needed. Nothing here reads global state.
//!
//! # Invariants
//!
//! 1. One `schedule` call queues exactly one task.
//! 2. The callback runs at most once.
//! 3. Dropping (or cancelling) the [`PendingTick`] before the checkpoint
//!    guarantees the callback never runs.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::microtask::MicrotaskPrimitive;

/// Error raised when no microtask primitive can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// Neither the unpatched slot nor the native primitive is available.
    PrimitiveUnavailable,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimitiveUnavailable => {
                write!(f, "no unpatched or native microtask primitive is available")
            }
        }
    }
}

impl std::error::Error for ClockError {}

// ---------------------------------------------------------------------------
// PlatformSlots
// ---------------------------------------------------------------------------

/// The host's view of its asynchronous primitives.
#[derive(Clone, Default)]
pub struct PlatformSlots {
    /// The original primitive, stashed by an instrumentation layer before it
    /// installed its wrapper.
    pub unpatched: Option<Rc<dyn MicrotaskPrimitive>>,
    /// The primitive the platform currently exposes.
    pub native: Option<Rc<dyn MicrotaskPrimitive>>,
}

impl PlatformSlots {
    /// Slots with nothing installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform primitive.
    #[must_use]
    pub fn with_native(mut self, primitive: Rc<dyn MicrotaskPrimitive>) -> Self {
        self.native = Some(primitive);
        self
    }

    /// Set the unpatched slot.
    #[must_use]
    pub fn with_unpatched(mut self, primitive: Rc<dyn MicrotaskPrimitive>) -> Self {
        self.unpatched = Some(primitive);
        self
    }
}

impl fmt::Debug for PlatformSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformSlots")
            .field("unpatched", &self.unpatched.as_ref().map(|p| p.label()))
            .field("native", &self.native.as_ref().map(|p| p.label()))
            .finish()
    }
}

/// Resolve the primitive a [`ClockSource`] should be anchored to.
pub fn resolve_unpatched(
    slots: &PlatformSlots,
) -> Result<Rc<dyn MicrotaskPrimitive>, ClockError> {
    if let Some(primitive) = &slots.unpatched {
        return Ok(Rc::clone(primitive));
    }

    match &slots.native {
        Some(primitive) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                primitive = primitive.label(),
                "unpatched slot empty, using native microtask primitive"
            );
            Ok(Rc::clone(primitive))
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::error!("no microtask primitive available for clock source");
            Err(ClockError::PrimitiveUnavailable)
        }
    }
}

// ---------------------------------------------------------------------------
// ClockSource
// ---------------------------------------------------------------------------

/// Produces single-shot microtask-boundary signals.
///
/// Cloning is cheap and shares the primitive.
#[derive(Clone)]
pub struct ClockSource {
    primitive: Rc<dyn MicrotaskPrimitive>,
}

impl ClockSource {
    /// Anchor a clock to an already-resolved primitive.
    #[must_use]
    pub fn new(primitive: Rc<dyn MicrotaskPrimitive>) -> Self {
        Self { primitive }
    }

    /// Resolve the unpatched primitive from `slots` and anchor a clock to it.
    pub fn resolve(slots: &PlatformSlots) -> Result<Self, ClockError> {
        resolve_unpatched(slots).map(Self::new)
    }

    /// Label of the primitive this clock is anchored to.
    #[must_use]
    pub fn primitive_label(&self) -> &str {
        self.primitive.label()
    }

    /// Run `callback` once the current microtask has drained.
    ///
    /// The returned guard must be held; dropping it cancels the signal.
    pub fn schedule(&self, callback: impl FnOnce() + 'static) -> PendingTick {
        let armed = Rc::new(Cell::new(true));
        let flag = Rc::clone(&armed);
        self.primitive.queue_microtask(Box::new(move || {
            if flag.replace(false) {
                callback();
            }
        }));
        PendingTick { armed }
    }
}

impl fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockSource")
            .field("primitive", &self.primitive.label())
            .finish()
    }
}

/// Guard for one scheduled clock signal.
#[must_use = "dropping a PendingTick cancels the signal"]
pub struct PendingTick {
    armed: Rc<Cell<bool>>,
}

impl PendingTick {
    /// Whether the signal has neither fired nor been cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.armed.get()
    }

    /// Cancel the signal explicitly.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PendingTick {
    fn drop(&mut self) {
        self.armed.set(false);
    }
}

impl fmt::Debug for PendingTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTick")
            .field("pending", &self.armed.get())
            .finish()
    }
}
