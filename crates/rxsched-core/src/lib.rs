#![forbid(unsafe_code)]

//! Platform timing primitives for rxsched.
//!
//! This crate provides:
//! - [`MicrotaskPrimitive`], the narrow contract the scheduler needs from the
//!   host event loop, plus [`MicrotaskQueue`] as a single-threaded host model
//! - [`ClockSource`] for single-shot "end of the current microtask" signals,
//!   resolved from the *unpatched* primitive via [`PlatformSlots`]

pub mod clock;
pub mod microtask;

pub use clock::{ClockError, ClockSource, PendingTick, PlatformSlots, resolve_unpatched};
pub use microtask::{Instrumented, MicrotaskPrimitive, MicrotaskQueue, Task};
