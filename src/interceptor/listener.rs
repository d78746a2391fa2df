//! Outward callbacks and main-thread dispatch used by the interception core.

use super::snap::CompanionPlacement;

/// Callbacks the surrounding application shell consumes to drive its UI. Called from the
/// tap thread (`on_drag_selection_detected`) or the main thread (everything else).
pub trait EngineListener: Send + Sync {
    fn on_drag_selection_detected(&self) {}

    fn on_geometry_changed(&self, _placement: CompanionPlacement) {}

    fn on_activation_shortcut_triggered(&self) {}

    fn on_escape_triggered(&self) {}

    fn on_panel_toggle_triggered(&self) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl EngineListener for NoopListener {}

/// Runs a closure on the UI thread and waits for it. Geometry of UI-owned windows is only
/// touched through this.
pub trait MainThreadDispatch: Send + Sync {
    /// Returns `false` when the closure could not be scheduled or did not complete.
    fn run_sync(&self, job: Box<dyn FnOnce() + Send>) -> bool;
}

/// Runs the closure on the calling thread. For tests and for callers already on the
/// main thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatch;

impl MainThreadDispatch for InlineDispatch {
    fn run_sync(&self, job: Box<dyn FnOnce() + Send>) -> bool {
        job();
        true
    }
}
