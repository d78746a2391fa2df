//! Bounded hand-off from geometry notifications to the recompute loop.
//!
//! Capacity is one: a pending recompute already covers any notification that arrives
//! before it runs, because a recompute reads the current geometry from scratch.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapReason {
    WindowMoved,
    WindowResized,
    FocusedWindowChanged,
    ApplicationActivated,
    /// Observation (re)started; align once without waiting for a notification.
    ObserverStarted,
    /// Requested by the shell.
    Manual,
}

impl SnapReason {
    /// Map an accessibility notification name.
    pub fn from_notification(name: &str) -> Option<Self> {
        match name {
            "AXWindowMoved" => Some(SnapReason::WindowMoved),
            "AXWindowResized" => Some(SnapReason::WindowResized),
            "AXFocusedWindowChanged" => Some(SnapReason::FocusedWindowChanged),
            "AXApplicationActivated" => Some(SnapReason::ApplicationActivated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapReason::WindowMoved => "window_moved",
            SnapReason::WindowResized => "window_resized",
            SnapReason::FocusedWindowChanged => "focused_window_changed",
            SnapReason::ApplicationActivated => "application_activated",
            SnapReason::ObserverStarted => "observer_started",
            SnapReason::Manual => "manual",
        }
    }
}

/// Producer side. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct SnapTrigger(SyncSender<SnapReason>);

impl SnapTrigger {
    /// Returns `true` if a new recompute was queued, `false` if one was already pending
    /// (coalesced) or the consumer is gone.
    pub fn notify(&self, reason: SnapReason) -> bool {
        match self.0.try_send(reason) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapRequest {
    Snap(SnapReason),
    /// Nothing arrived within the timeout.
    Idle,
    /// Every trigger was dropped.
    Closed,
}

/// Consumer side, owned by the single recompute loop.
#[derive(Debug)]
pub struct SnapRequests(Receiver<SnapReason>);

impl SnapRequests {
    pub fn next(&self, timeout: Duration) -> SnapRequest {
        match self.0.recv_timeout(timeout) {
            Ok(reason) => SnapRequest::Snap(reason),
            Err(RecvTimeoutError::Timeout) => SnapRequest::Idle,
            Err(RecvTimeoutError::Disconnected) => SnapRequest::Closed,
        }
    }
}

pub fn snap_channel() -> (SnapTrigger, SnapRequests) {
    let (tx, rx) = mpsc::sync_channel(1);
    (SnapTrigger(tx), SnapRequests(rx))
}
