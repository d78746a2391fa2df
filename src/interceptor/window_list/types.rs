use serde::{Deserialize, Serialize};

use crate::interceptor::geometry::Rect;

/// One on-screen window as reported by the window server, in front-to-back order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshotEntry {
    pub owner_pid: i32,
    pub owner_name: String,
    pub bounds: Rect,
    /// Position in the front-to-back list (0 = frontmost).
    pub z_index: usize,
    /// Window server layer; 0 is the normal application window layer.
    pub layer: i32,
}

/// Who owns the topmost window at a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerResult {
    TargetApp,
    OtherApp(String),
    Unknown,
}

/// A running application as seen by the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub pid: i32,
    pub bundle_id: Option<String>,
    pub name: Option<String>,
}

/// The configured application this companion tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetApp {
    pub bundle_id: String,
    pub process_name: String,
}

impl Default for TargetApp {
    fn default() -> Self {
        Self {
            bundle_id: "com.apple.Terminal".to_string(),
            process_name: "Terminal".to_string(),
        }
    }
}

impl TargetApp {
    pub fn is(&self, app: &AppIdentity) -> bool {
        app.bundle_id.as_deref() == Some(self.bundle_id.as_str())
    }

    /// Identity used to match window-list owners while `app` is the running target.
    pub fn identity(&self, app: Option<&AppIdentity>) -> TargetIdentity {
        TargetIdentity {
            pid: app.map(|a| a.pid),
            process_name: self.process_name.clone(),
        }
    }
}

/// Matches window-list entries against the target. The pid wins when known; the owner
/// name is only a fallback because it is localized and not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentity {
    pub pid: Option<i32>,
    pub process_name: String,
}

impl TargetIdentity {
    pub fn owns(&self, entry: &WindowSnapshotEntry) -> bool {
        match self.pid {
            Some(pid) => entry.owner_pid == pid,
            None => entry.owner_name == self.process_name,
        }
    }
}

#[cfg(test)]
impl WindowSnapshotEntry {
    pub fn sample(owner_pid: i32, owner_name: &str, bounds: Rect, z_index: usize) -> Self {
        Self {
            owner_pid,
            owner_name: owner_name.to_string(),
            bounds,
            z_index,
            layer: 0,
        }
    }
}
