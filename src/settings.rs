use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::SettingsError;
use crate::interceptor::keys::{keycode_for_char, Modifier};
use crate::interceptor::shortcuts::{ShortcutRules, ShortcutScope, ShortcutSpec};
use crate::interceptor::window_list::TargetApp;

/// Product-tuning constants for the tap filter and the snap logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    /// Pointer travel beyond which a down/up pair counts as a drag selection.
    pub drag_threshold_px: f64,
    /// Pause before a synthetic chord is posted.
    pub settle_delay_ms: u64,
    /// Target adjustments smaller than this are ignored.
    pub snap_noise_px: f64,
    /// Smallest width and height accepted as the target's primary window.
    pub min_target_window_px: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            settle_delay_ms: 10,
            snap_noise_px: 1.0,
            min_target_window_px: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub copy_on_select: bool,
    pub paste_on_right_click: bool,
    pub debug_mode: bool,
    pub snap_to_target: bool,
    pub global_shortcut_key: String,
    pub global_shortcut_modifier: String,
    /// `true` makes the activation shortcut global, `false` limits it to the main window.
    pub global_shortcut_anywhere: bool,
    pub second_activation_to_terminal: bool,
    pub esc_to_terminal: bool,
    pub enable_clipboard_manager: bool,
    pub clipboard_shortcut_key: String,
    pub clipboard_shortcut_modifier: String,
    pub companion_width: f64,
    pub target: TargetApp,
    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            copy_on_select: true,
            paste_on_right_click: true,
            debug_mode: false,
            snap_to_target: true,
            global_shortcut_key: "n".to_string(),
            global_shortcut_modifier: "command".to_string(),
            global_shortcut_anywhere: false,
            second_activation_to_terminal: true,
            esc_to_terminal: false,
            enable_clipboard_manager: false,
            clipboard_shortcut_key: "u".to_string(),
            clipboard_shortcut_modifier: "command".to_string(),
            companion_width: 320.0,
            target: TargetApp::default(),
            tuning: Tuning::default(),
        }
    }
}

fn parse_shortcut(
    key: &str,
    modifier: &str,
    scope: ShortcutScope,
) -> Result<ShortcutSpec, SettingsError> {
    let mut chars = key.trim().chars();
    let key_char = match (chars.next(), chars.next()) {
        (Some(c), None) if keycode_for_char(c).is_some() => c.to_ascii_lowercase(),
        _ => {
            return Err(SettingsError::InvalidShortcutKey {
                key: key.to_string(),
            })
        }
    };
    let modifier: Modifier =
        modifier
            .parse()
            .map_err(|_| SettingsError::InvalidShortcutModifier {
                modifier: modifier.to_string(),
            })?;
    Ok(ShortcutSpec {
        key_char,
        modifier,
        scope,
    })
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.try_activation_shortcut()?;
        parse_shortcut(
            &self.clipboard_shortcut_key,
            &self.clipboard_shortcut_modifier,
            ShortcutScope::TargetOnly,
        )?;
        if !self.companion_width.is_finite() || self.companion_width <= 0.0 {
            return Err(SettingsError::InvalidCompanionWidth {
                width: self.companion_width,
            });
        }
        Ok(())
    }

    pub fn activation_scope(&self) -> ShortcutScope {
        if self.global_shortcut_anywhere {
            ShortcutScope::Global
        } else {
            ShortcutScope::TargetOnly
        }
    }

    fn try_activation_shortcut(&self) -> Result<ShortcutSpec, SettingsError> {
        parse_shortcut(
            &self.global_shortcut_key,
            &self.global_shortcut_modifier,
            self.activation_scope(),
        )
    }

    /// The activation shortcut, or `None` (with a warning) when the stored value is invalid.
    pub fn activation_shortcut(&self) -> Option<ShortcutSpec> {
        self.try_activation_shortcut()
            .map_err(|e| warn!(event = "settings.activation_shortcut_invalid", error = %e))
            .ok()
    }

    /// The clipboard panel shortcut, only while the clipboard manager is enabled.
    pub fn clipboard_shortcut(&self) -> Option<ShortcutSpec> {
        if !self.enable_clipboard_manager {
            return None;
        }
        parse_shortcut(
            &self.clipboard_shortcut_key,
            &self.clipboard_shortcut_modifier,
            ShortcutScope::TargetOnly,
        )
        .map_err(|e| warn!(event = "settings.clipboard_shortcut_invalid", error = %e))
        .ok()
    }

    pub fn shortcut_rules(&self) -> ShortcutRules {
        ShortcutRules {
            activation: self.activation_shortcut(),
            panel_toggle: self.clipboard_shortcut(),
            second_activation_to_target: self.second_activation_to_terminal,
            escape_to_target: self.esc_to_terminal,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.tuning.settle_delay_ms)
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("com.nativetab.app").join("settings.json"))
}

pub fn load() -> Settings {
    match settings_path() {
        Some(path) => load_from(&path),
        None => Settings::default(),
    }
}

pub fn load_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(event = "settings.load_corrupt", path = %path.display(), error = %e);
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn save(settings: &Settings) -> Result<(), SettingsError> {
    let path = settings_path().ok_or(SettingsError::ConfigDirMissing)?;
    save_to(&path, settings)
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read-only view of the current configuration. Read on every relevant event.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> Settings;
}

/// Process-wide settings snapshot. Writers swap the whole value.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Arc<RwLock<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    pub fn replace(&self, settings: Settings) {
        match self.0.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }
}

impl SettingsSource for SharedSettings {
    fn current(&self) -> Settings {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
