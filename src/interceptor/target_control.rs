//! Write-only control of the target's front window, via AppleScript.

use std::process::Command;

use tracing::{debug, warn};

use super::geometry::Rect;
use super::window_list::TargetApp;
use crate::errors::EngineError;

pub trait TargetWindowControl: Send + Sync {
    /// Move/resize the target's front window to `frame` (top-left coordinates).
    fn set_frame(&self, target: &TargetApp, frame: Rect) -> Result<(), EngineError>;
}

impl<T: TargetWindowControl + ?Sized> TargetWindowControl for std::sync::Arc<T> {
    fn set_frame(&self, target: &TargetApp, frame: Rect) -> Result<(), EngineError> {
        (**self).set_frame(target, frame)
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// AppleScript that sets the front window's bounds. AppleScript bounds are
/// `{left, top, right, bottom}` in top-left screen coordinates.
pub fn bounds_script(bundle_id: &str, frame: Rect) -> String {
    format!(
        "tell application id \"{}\" to set bounds of front window to {{{}, {}, {}, {}}}",
        applescript_escape(bundle_id),
        frame.x.round() as i64,
        frame.y.round() as i64,
        frame.right().round() as i64,
        frame.bottom().round() as i64
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsascriptControl;

impl TargetWindowControl for OsascriptControl {
    fn set_frame(&self, target: &TargetApp, frame: Rect) -> Result<(), EngineError> {
        let script = bounds_script(&target.bundle_id, frame);
        debug!(event = "interceptor.target_control.set_bounds_started", script = %script);

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .map_err(|e| {
                warn!(event = "interceptor.target_control.command_failed", error = %e);
                EngineError::ProcessControlFailed {
                    reason: format!("Failed to execute osascript: {e}"),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                event = "interceptor.target_control.set_bounds_failed",
                bundle_id = %target.bundle_id,
                stderr = %stderr
            );
            return Err(EngineError::ProcessControlFailed {
                reason: stderr.trim().to_string(),
            });
        }

        debug!(event = "interceptor.target_control.set_bounds_completed");
        Ok(())
    }
}
