//! System-wide registration of the activation shortcut.

use tauri::AppHandle;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut};
use tracing::{debug, warn};

use crate::interceptor::keys::{Key, KeyDown, Modifier, Modifiers as KeyModifiers};
use crate::interceptor::shortcuts::{ShortcutScope, ShortcutSpec};
use crate::settings::Settings;

fn code_for(c: char) -> Option<Code> {
    let name = if c.is_ascii_digit() {
        format!("Digit{c}")
    } else {
        format!("Key{}", c.to_ascii_uppercase())
    };
    name.parse::<Code>().ok()
}

fn char_for(code: Code) -> Option<char> {
    let name = code.to_string();
    let rest = name
        .strip_prefix("Key")
        .or_else(|| name.strip_prefix("Digit"))?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

fn modifiers_for(modifier: Modifier) -> Modifiers {
    match modifier {
        Modifier::Command => Modifiers::SUPER,
        Modifier::Control => Modifiers::CONTROL,
        Modifier::Option => Modifiers::ALT,
    }
}

fn to_shortcut(spec: &ShortcutSpec) -> Option<Shortcut> {
    let code = code_for(spec.key_char)?;
    Some(Shortcut::new(Some(modifiers_for(spec.modifier)), code))
}

/// Translate a fired global shortcut into the key-down the arbitrator understands.
pub fn key_down_for(shortcut: &Shortcut) -> KeyDown {
    let key = char_for(shortcut.key).map(Key::Char).unwrap_or(Key::Other);
    let mods = shortcut.mods;
    KeyDown::new(
        key,
        KeyModifiers {
            command: mods.contains(Modifiers::SUPER),
            control: mods.contains(Modifiers::CONTROL),
            option: mods.contains(Modifiers::ALT),
            shift: mods.contains(Modifiers::SHIFT),
        },
    )
}

/// Register the activation shortcut system-wide when its scope is global, and drop any
/// previous registration otherwise.
pub fn sync(app: &AppHandle, settings: &Settings) {
    let shortcuts = app.global_shortcut();
    if let Err(e) = shortcuts.unregister_all() {
        warn!(event = "hotkey.unregister_failed", error = %e);
    }

    let Some(spec) = settings
        .activation_shortcut()
        .filter(|spec| spec.scope == ShortcutScope::Global)
    else {
        debug!(event = "hotkey.global_disabled");
        return;
    };

    let Some(shortcut) = to_shortcut(&spec) else {
        warn!(event = "hotkey.unmapped_key", key = %spec.key_char);
        return;
    };

    match shortcuts.register(shortcut) {
        Ok(()) => debug!(
            event = "hotkey.registered",
            key = %spec.key_char,
            modifier = %spec.modifier
        ),
        Err(e) => warn!(event = "hotkey.register_failed", error = %e),
    }
}
