//! Topmost-owner hit testing over a window snapshot.

use super::types::{OwnerResult, TargetIdentity, WindowSnapshotEntry};
use crate::interceptor::geometry::{Rect, ScreenPoint};

/// Resolve who owns the topmost window at `point`.
///
/// `entries` must be in front-to-back order. The first entry whose bounds contain the
/// point decides the result; anything listed after it is never consulted, so an
/// occluding surface (Dock, Spotlight, a notification) blocks a match against the
/// target's own rectangle. `None` means the window list could not be read and resolves
/// to `Unknown` so callers fail closed.
pub fn resolve_owner_at(
    point: ScreenPoint,
    entries: Option<&[WindowSnapshotEntry]>,
    target: &TargetIdentity,
) -> OwnerResult {
    let Some(entries) = entries else {
        return OwnerResult::Unknown;
    };

    match entries.iter().find(|entry| entry.bounds.contains(point)) {
        Some(entry) if target.owns(entry) => OwnerResult::TargetApp,
        Some(entry) => OwnerResult::OtherApp(entry.owner_name.clone()),
        None => OwnerResult::Unknown,
    }
}

/// The target's primary on-screen window: the first normal-layer window it owns that is
/// at least `min_size` in both dimensions (thumbnails and badges are smaller).
pub fn primary_target_window(
    entries: &[WindowSnapshotEntry],
    target: &TargetIdentity,
    min_size: f64,
) -> Option<Rect> {
    entries
        .iter()
        .filter(|entry| entry.layer == 0 && target.owns(entry))
        .find(|entry| entry.bounds.width >= min_size && entry.bounds.height >= min_size)
        .map(|entry| entry.bounds)
}
