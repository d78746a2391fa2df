use serde::Serialize;

use crate::errors::EngineError;

pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    /// Accessibility trust covers both the event tap and the AX observer.
    pub accessibility: bool,
}

#[cfg(target_os = "macos")]
pub fn accessibility_trusted() -> bool {
    unsafe { accessibility_sys::AXIsProcessTrusted() }
}

#[cfg(not(target_os = "macos"))]
pub fn accessibility_trusted() -> bool {
    false
}

/// Ask the system to show its trust prompt. Must run on the main thread.
#[cfg(target_os = "macos")]
pub fn prompt_accessibility() -> bool {
    unsafe {
        use core_foundation::base::TCFType;
        use core_foundation::boolean::CFBoolean;
        use core_foundation::dictionary::CFDictionary;
        use core_foundation::string::CFString;

        let key = CFString::wrap_under_get_rule(accessibility_sys::kAXTrustedCheckOptionPrompt);
        let dict = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        accessibility_sys::AXIsProcessTrustedWithOptions(dict.as_concrete_TypeRef())
    }
}

pub fn check() -> PermissionStatus {
    let status = PermissionStatus {
        accessibility: accessibility_trusted(),
    };
    tracing::debug!(event = "permissions.checked", accessibility = status.accessibility);
    status
}

/// Startup precondition for the tap and the observer. Missing trust is reported as
/// `PermissionDenied`, never as a runtime failure.
pub fn require_accessibility() -> Result<(), EngineError> {
    if accessibility_trusted() {
        Ok(())
    } else {
        Err(EngineError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NativeTabError;

    #[test]
    fn permission_status_defaults_false() {
        let status = PermissionStatus::default();
        assert!(!status.accessibility);
    }

    #[test]
    fn require_matches_check() {
        let trusted = check().accessibility;
        match require_accessibility() {
            Ok(()) => assert!(trusted),
            Err(e) => {
                assert!(!trusted);
                assert!(e.is_permission_error());
            }
        }
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&PermissionStatus {
            accessibility: true,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"accessibility":true}"#);
    }
}
