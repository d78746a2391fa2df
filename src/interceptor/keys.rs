//! Key and modifier vocabulary shared by the injector and the shortcut arbitrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// macOS virtual key codes (ANSI layout) of the injected chords.
pub mod keycode {
    pub const C: u16 = 8;
    pub const V: u16 = 9;
}

const LETTER_KEYCODES: [(char, u16); 26] = [
    ('a', 0),
    ('s', 1),
    ('d', 2),
    ('f', 3),
    ('h', 4),
    ('g', 5),
    ('z', 6),
    ('x', 7),
    ('c', 8),
    ('v', 9),
    ('b', 11),
    ('q', 12),
    ('w', 13),
    ('e', 14),
    ('r', 15),
    ('y', 16),
    ('t', 17),
    ('o', 31),
    ('u', 32),
    ('i', 34),
    ('p', 35),
    ('l', 37),
    ('j', 38),
    ('k', 40),
    ('n', 45),
    ('m', 46),
];

const DIGIT_KEYCODES: [(char, u16); 10] = [
    ('1', 18),
    ('2', 19),
    ('3', 20),
    ('4', 21),
    ('6', 22),
    ('5', 23),
    ('9', 25),
    ('7', 26),
    ('8', 28),
    ('0', 29),
];

/// Virtual key code for a letter or digit on an ANSI keyboard.
pub fn keycode_for_char(c: char) -> Option<u16> {
    let c = c.to_ascii_lowercase();
    LETTER_KEYCODES
        .iter()
        .chain(DIGIT_KEYCODES.iter())
        .find(|(ch, _)| *ch == c)
        .map(|(_, code)| *code)
}

pub fn char_for_keycode(code: u16) -> Option<char> {
    LETTER_KEYCODES
        .iter()
        .chain(DIGIT_KEYCODES.iter())
        .find(|(_, kc)| *kc == code)
        .map(|(ch, _)| *ch)
}

/// The single modifier a shortcut or synthetic chord carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Command,
    Control,
    Option,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Command => "command",
            Modifier::Control => "control",
            Modifier::Option => "option",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "cmd" => Ok(Modifier::Command),
            "control" | "ctrl" => Ok(Modifier::Control),
            "option" | "alt" => Ok(Modifier::Option),
            other => Err(format!("unknown modifier '{other}'")),
        }
    }
}

/// Modifier state of a key-down event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub command: bool,
    pub control: bool,
    pub option: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn only(modifier: Modifier) -> Self {
        let mut m = Self::default();
        match modifier {
            Modifier::Command => m.command = true,
            Modifier::Control => m.control = true,
            Modifier::Option => m.option = true,
        }
        m
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// `modifier` is held and neither of the other two is. Shift does not matter.
    pub fn is_exactly(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Command => self.command && !self.control && !self.option,
            Modifier::Control => self.control && !self.command && !self.option,
            Modifier::Option => self.option && !self.command && !self.control,
        }
    }
}

/// Logical key of a key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent` (`code` first, since Option rewrites `key` into dead
    /// keys and symbols on macOS).
    pub fn from_dom(key: &str, code: &str) -> Self {
        match key {
            "Escape" => return Key::Escape,
            "Enter" => return Key::Enter,
            "ArrowUp" => return Key::ArrowUp,
            "ArrowDown" => return Key::ArrowDown,
            _ => {}
        }

        let from_code = code
            .strip_prefix("Key")
            .or_else(|| code.strip_prefix("Digit"))
            .filter(|rest| rest.len() == 1)
            .and_then(|rest| rest.chars().next());
        if let Some(c) = from_code {
            return Key::Char(c.to_ascii_lowercase());
        }

        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Key::Char(c.to_ascii_lowercase()),
            _ => Key::Other,
        }
    }
}

/// A key-down as seen by the shortcut arbitrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDown {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyDown {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// A synthetic key chord: one key with exactly one modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key_code: u16,
    pub modifier: Modifier,
}

impl KeyChord {
    pub const COPY: KeyChord = KeyChord {
        key_code: keycode::C,
        modifier: Modifier::Command,
    };

    pub const PASTE: KeyChord = KeyChord {
        key_code: keycode::V,
        modifier: Modifier::Command,
    };

    pub fn label(&self) -> String {
        match char_for_keycode(self.key_code) {
            Some(c) => format!("{}+{c}", self.modifier),
            None => format!("{}+#{}", self.modifier, self.key_code),
        }
    }
}
