#![forbid(unsafe_code)]

//! Render engine capability interface.
//!
//! The scheduling core never talks to a concrete UI engine. An adapter for
//! the engine implements [`RenderEngine`] once per component, resolving the
//! component's internal render-graph handle itself, and the strategies call
//! only the trigger they need. Engine generations that differ in how a
//! trigger is implemented are the adapter's concern; nothing here branches
//! on engine version.
//!
//! The engine is externally owned. Strategies call the documented triggers
//! and nothing else; calling a trigger after the component was torn down is
//! undefined at this layer and must be prevented by the consumer
//! (by unsubscribing first).

use rxsched_runtime::ScopeKey;

/// Render triggers for one component.
pub trait RenderEngine {
    /// Mark the component for the engine's next scheduled pass.
    fn mark_for_check(&self);

    /// Mark the component dirty at root level, bypassing component-local
    /// delegation.
    fn mark_dirty(&self);

    /// Synchronously re-render the component and its dirty descendants,
    /// bypassing the engine's own batching.
    fn detect_changes(&self);

    /// Re-attach the component to the engine's scheduling graph.
    fn attach(&self);

    /// Detach the component from the engine's scheduling graph, so it gets
    /// no unsolicited passes.
    fn detach(&self);

    /// Scope coalescing windows for this component are tracked under.
    fn scope(&self) -> ScopeKey;
}
