//! Frontmost / running application queries and focus transfer.

use super::window_list::{AppIdentity, TargetApp};

pub trait Workspace: Send + Sync {
    /// The application currently receiving keyboard focus.
    fn frontmost(&self) -> Option<AppIdentity>;

    /// The running instance of `target`, if any.
    fn running(&self, target: &TargetApp) -> Option<AppIdentity>;

    /// Bring `target` to the front, launching it when it is not running.
    /// Returns `false` when neither worked.
    fn activate(&self, target: &TargetApp) -> bool;

    fn target_is_frontmost(&self, target: &TargetApp) -> bool {
        self.frontmost().is_some_and(|app| target.is(&app))
    }
}

impl<T: Workspace + ?Sized> Workspace for std::sync::Arc<T> {
    fn frontmost(&self) -> Option<AppIdentity> {
        (**self).frontmost()
    }

    fn running(&self, target: &TargetApp) -> Option<AppIdentity> {
        (**self).running(target)
    }

    fn activate(&self, target: &TargetApp) -> bool {
        (**self).activate(target)
    }
}

#[cfg(target_os = "macos")]
pub use imp::MacWorkspace;

#[cfg(target_os = "macos")]
mod imp {
    use objc2_app_kit::{NSApplicationActivationOptions, NSRunningApplication, NSWorkspace};
    use objc2_foundation::NSString;
    use tracing::{debug, warn};

    use super::Workspace;
    use crate::interceptor::window_list::{AppIdentity, TargetApp};

    #[derive(Debug, Clone, Copy, Default)]
    pub struct MacWorkspace;

    fn identity_of(app: &NSRunningApplication) -> AppIdentity {
        AppIdentity {
            pid: app.processIdentifier(),
            bundle_id: app.bundleIdentifier().map(|s| s.to_string()),
            name: app.localizedName().map(|s| s.to_string()),
        }
    }

    impl Workspace for MacWorkspace {
        fn frontmost(&self) -> Option<AppIdentity> {
            let workspace = NSWorkspace::sharedWorkspace();
            let frontmost = workspace.frontmostApplication()?;
            Some(identity_of(&frontmost))
        }

        fn running(&self, target: &TargetApp) -> Option<AppIdentity> {
            let bundle_id = NSString::from_str(&target.bundle_id);
            let apps = NSRunningApplication::runningApplicationsWithBundleIdentifier(&bundle_id);
            apps.iter()
                .find(|app| !app.isTerminated())
                .map(|app| identity_of(&app))
        }

        #[allow(deprecated)]
        fn activate(&self, target: &TargetApp) -> bool {
            let bundle_id = NSString::from_str(&target.bundle_id);
            let apps = NSRunningApplication::runningApplicationsWithBundleIdentifier(&bundle_id);
            if let Some(app) = apps.iter().find(|app| !app.isTerminated()) {
                let activated =
                    app.activateWithOptions(NSApplicationActivationOptions::ActivateIgnoringOtherApps);
                debug!(
                    event = "interceptor.workspace.activate",
                    bundle_id = %target.bundle_id,
                    activated
                );
                return activated;
            }

            // Not running: let LaunchServices start it, which also brings it forward.
            match std::process::Command::new("open")
                .args(["-b", &target.bundle_id])
                .status()
            {
                Ok(status) if status.success() => {
                    debug!(event = "interceptor.workspace.launched", bundle_id = %target.bundle_id);
                    true
                }
                Ok(status) => {
                    warn!(
                        event = "interceptor.workspace.launch_failed",
                        bundle_id = %target.bundle_id,
                        status = %status
                    );
                    false
                }
                Err(e) => {
                    warn!(
                        event = "interceptor.workspace.launch_failed",
                        bundle_id = %target.bundle_id,
                        error = %e
                    );
                    false
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::Workspace;
    use crate::interceptor::window_list::{AppIdentity, TargetApp};

    /// Scriptable workspace for tests.
    #[derive(Debug, Default)]
    pub struct FakeWorkspace {
        pub frontmost: Mutex<Option<AppIdentity>>,
        pub running: Mutex<Option<AppIdentity>>,
        pub activations: Mutex<Vec<String>>,
    }

    pub fn terminal(pid: i32) -> AppIdentity {
        AppIdentity {
            pid,
            bundle_id: Some("com.apple.Terminal".to_string()),
            name: Some("Terminal".to_string()),
        }
    }

    pub fn finder() -> AppIdentity {
        AppIdentity {
            pid: 9,
            bundle_id: Some("com.apple.finder".to_string()),
            name: Some("Finder".to_string()),
        }
    }

    impl FakeWorkspace {
        pub fn with_frontmost(app: Option<AppIdentity>) -> Self {
            let ws = Self::default();
            *ws.running.lock().unwrap() = app
                .clone()
                .filter(|a| a.bundle_id.as_deref() == Some("com.apple.Terminal"));
            *ws.frontmost.lock().unwrap() = app;
            ws
        }

        pub fn set_frontmost(&self, app: Option<AppIdentity>) {
            *self.frontmost.lock().unwrap() = app;
        }
    }

    impl Workspace for FakeWorkspace {
        fn frontmost(&self) -> Option<AppIdentity> {
            self.frontmost.lock().unwrap().clone()
        }

        fn running(&self, _target: &TargetApp) -> Option<AppIdentity> {
            self.running.lock().unwrap().clone()
        }

        fn activate(&self, target: &TargetApp) -> bool {
            self.activations.lock().unwrap().push(target.bundle_id.clone());
            true
        }
    }

    #[test]
    fn target_is_frontmost_checks_bundle() {
        let target = TargetApp::default();
        let ws = FakeWorkspace::with_frontmost(Some(terminal(1)));
        assert!(ws.target_is_frontmost(&target));
        ws.set_frontmost(Some(finder()));
        assert!(!ws.target_is_frontmost(&target));
        ws.set_frontmost(None);
        assert!(!ws.target_is_frontmost(&target));
    }
}
