//! Shortcut arbitration for key-downs aimed at the companion window.
//!
//! Decides, in priority order, whether a key-down is the activation shortcut, the
//! clipboard panel toggle, the escape binding, or list navigation. Anything else passes
//! through untouched. Pure logic: the caller performs the returned action.

use serde::{Deserialize, Serialize};

use super::keys::{Key, KeyDown, Modifier};
use super::listener::EngineListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutScope {
    /// Fires whichever window has focus.
    Global,
    /// Fires only while the companion's main window is key.
    TargetOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutSpec {
    pub key_char: char,
    pub modifier: Modifier,
    pub scope: ShortcutScope,
}

impl ShortcutSpec {
    pub fn matches(&self, event: &KeyDown) -> bool {
        event.key == Key::Char(self.key_char.to_ascii_lowercase())
            && event.modifiers.is_exactly(self.modifier)
    }
}

/// Configured bindings, rebuilt from settings on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutRules {
    pub activation: Option<ShortcutSpec>,
    pub panel_toggle: Option<ShortcutSpec>,
    /// A repeated activation while the search field is focused returns to the target.
    pub second_activation_to_target: bool,
    /// Escape returns to the target instead of resetting the window.
    pub escape_to_target: bool,
}

/// Focus state of the companion at the time of the key-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusContext {
    pub key_window_is_main: bool,
    pub search_focused: bool,
    pub editing_item: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Activation,
    PanelToggle,
    Escape,
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ShortcutAction<T> {
    /// Clear in-progress edits and put focus in the search field.
    FocusSearch,
    /// Hand OS focus back to the target application.
    ReturnToTarget,
    /// Clear edits and search text, refocus search.
    ResetLocal,
    TogglePanel,
    Highlight(T),
    Launch(T),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome<T> {
    Consumed {
        trigger: Trigger,
        action: ShortcutAction<T>,
    },
    PassThrough,
}

impl<T> KeyOutcome<T> {
    pub fn is_consumed(&self) -> bool {
        matches!(self, KeyOutcome::Consumed { .. })
    }

    /// Fire the outward callback that belongs to this outcome, if any.
    pub fn notify(&self, listener: &dyn EngineListener) {
        match self {
            KeyOutcome::Consumed {
                trigger: Trigger::Activation,
                ..
            } => listener.on_activation_shortcut_triggered(),
            KeyOutcome::Consumed {
                trigger: Trigger::Escape,
                ..
            } => listener.on_escape_triggered(),
            KeyOutcome::Consumed {
                trigger: Trigger::PanelToggle,
                ..
            } => listener.on_panel_toggle_triggered(),
            _ => {}
        }
    }
}

/// Highlight cursor over the currently visible list. Moves clamp at both ends.
#[derive(Debug, Clone)]
pub struct ListNavigator<T> {
    highlighted: Option<T>,
}

impl<T> Default for ListNavigator<T> {
    fn default() -> Self {
        Self { highlighted: None }
    }
}

impl<T: Clone + PartialEq> ListNavigator<T> {
    pub fn highlighted(&self) -> Option<&T> {
        self.highlighted.as_ref()
    }

    pub fn clear(&mut self) {
        self.highlighted = None;
    }

    pub fn step(&mut self, key: Key, visible: &[T]) -> Option<ShortcutAction<T>> {
        match key {
            Key::ArrowDown | Key::ArrowUp => {
                let last = visible.len().checked_sub(1)?;
                let current = self
                    .highlighted
                    .as_ref()
                    .and_then(|h| visible.iter().position(|item| item == h));
                let next = match (key, current) {
                    (Key::ArrowDown, Some(idx)) => (idx + 1).min(last),
                    (Key::ArrowUp, Some(idx)) => idx.saturating_sub(1),
                    _ => 0,
                };
                let item = visible[next].clone();
                self.highlighted = Some(item.clone());
                Some(ShortcutAction::Highlight(item))
            }
            Key::Enter => {
                let current = self.highlighted.as_ref()?;
                visible
                    .iter()
                    .find(|item| *item == current)
                    .cloned()
                    .map(ShortcutAction::Launch)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutArbitrator<T> {
    navigator: ListNavigator<T>,
}

impl<T: Clone + PartialEq> ShortcutArbitrator<T> {
    pub fn new() -> Self {
        Self {
            navigator: ListNavigator::default(),
        }
    }

    pub fn navigator(&self) -> &ListNavigator<T> {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut ListNavigator<T> {
        &mut self.navigator
    }

    pub fn handle(
        &mut self,
        event: KeyDown,
        ctx: FocusContext,
        rules: &ShortcutRules,
        visible: &[T],
    ) -> KeyOutcome<T> {
        if let Some(spec) = rules.activation.filter(|spec| spec.matches(&event)) {
            let in_scope = match spec.scope {
                ShortcutScope::Global => true,
                ShortcutScope::TargetOnly => ctx.key_window_is_main,
            };
            if !in_scope {
                return KeyOutcome::PassThrough;
            }

            // A stale search focus in a background companion must not count.
            if rules.second_activation_to_target
                && ctx.key_window_is_main
                && ctx.search_focused
                && !ctx.editing_item
            {
                return KeyOutcome::Consumed {
                    trigger: Trigger::Activation,
                    action: ShortcutAction::ReturnToTarget,
                };
            }

            self.navigator.clear();
            return KeyOutcome::Consumed {
                trigger: Trigger::Activation,
                action: ShortcutAction::FocusSearch,
            };
        }

        // Everything below is local to the main window (not settings, not clipboard history).
        if !ctx.key_window_is_main {
            return KeyOutcome::PassThrough;
        }

        if rules.panel_toggle.is_some_and(|spec| spec.matches(&event)) {
            return KeyOutcome::Consumed {
                trigger: Trigger::PanelToggle,
                action: ShortcutAction::TogglePanel,
            };
        }

        if event.key == Key::Escape {
            let action = if rules.escape_to_target {
                ShortcutAction::ReturnToTarget
            } else {
                self.navigator.clear();
                ShortcutAction::ResetLocal
            };
            return KeyOutcome::Consumed {
                trigger: Trigger::Escape,
                action,
            };
        }

        match self.navigator.step(event.key, visible) {
            Some(action) => KeyOutcome::Consumed {
                trigger: Trigger::Navigation,
                action,
            },
            None => KeyOutcome::PassThrough,
        }
    }
}
