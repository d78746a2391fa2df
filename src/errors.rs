use std::error::Error;

/// Base trait for all NativeTab errors
pub trait NativeTabError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether the fix is granting a system permission rather than retrying
    fn is_permission_error(&self) -> bool {
        false
    }
}

/// Failures of the interception and tracking subsystem.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Accessibility permission not granted")]
    PermissionDenied,

    #[error("Failed to create event tap. Check accessibility permissions.")]
    TapCreationFailed,

    #[error("Failed to create run loop source for {component}")]
    RunLoopSourceFailed { component: &'static str },

    #[error("Timeout waiting for {component} setup")]
    SetupTimeout { component: &'static str },

    #[error("Target application '{bundle_id}' is not running")]
    TargetNotRunning { bundle_id: String },

    #[error("Failed to create accessibility observer for pid {pid} (AXError {code})")]
    ObserverCreationFailed { pid: i32, code: i32 },

    #[error("Process control failed: {reason}")]
    ProcessControlFailed { reason: String },
}

impl NativeTabError for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            EngineError::PermissionDenied => "PERMISSION_DENIED",
            EngineError::TapCreationFailed => "TAP_CREATION_FAILED",
            EngineError::RunLoopSourceFailed { .. } => "RUN_LOOP_SOURCE_FAILED",
            EngineError::SetupTimeout { .. } => "SETUP_TIMEOUT",
            EngineError::TargetNotRunning { .. } => "TARGET_NOT_RUNNING",
            EngineError::ObserverCreationFailed { .. } => "OBSERVER_CREATION_FAILED",
            EngineError::ProcessControlFailed { .. } => "PROCESS_CONTROL_FAILED",
        }
    }

    fn is_permission_error(&self) -> bool {
        matches!(self, EngineError::PermissionDenied)
    }
}

/// Synthetic event construction failures. Never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("Failed to create event source")]
    EventSourceFailed,

    #[error("Failed to create keyboard event for keycode {keycode}")]
    KeyboardEventFailed { keycode: u16 },
}

impl NativeTabError for InjectError {
    fn error_code(&self) -> &'static str {
        match self {
            InjectError::EventSourceFailed => "EVENT_SOURCE_FAILED",
            InjectError::KeyboardEventFailed { .. } => "KEYBOARD_EVENT_FAILED",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not locate the configuration directory")]
    ConfigDirMissing,

    #[error("Invalid shortcut key '{key}': expected a single letter or digit")]
    InvalidShortcutKey { key: String },

    #[error("Invalid shortcut modifier '{modifier}': expected command, control or option")]
    InvalidShortcutModifier { modifier: String },

    #[error("Invalid companion width {width}")]
    InvalidCompanionWidth { width: f64 },

    #[error("Failed to serialize settings: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error writing settings: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl NativeTabError for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            SettingsError::ConfigDirMissing => "CONFIG_DIR_MISSING",
            SettingsError::InvalidShortcutKey { .. } => "INVALID_SHORTCUT_KEY",
            SettingsError::InvalidShortcutModifier { .. } => "INVALID_SHORTCUT_MODIFIER",
            SettingsError::InvalidCompanionWidth { .. } => "INVALID_COMPANION_WIDTH",
            SettingsError::Serialize { .. } => "SETTINGS_SERIALIZE_ERROR",
            SettingsError::Io { .. } => "SETTINGS_IO_ERROR",
        }
    }
}
