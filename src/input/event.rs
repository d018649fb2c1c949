use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers::new(false, false, false);

    pub const fn new(ctrl: bool, shift: bool, alt: bool) -> Self {
        Self { ctrl, shift, alt }
    }

    pub const fn ctrl() -> Self {
        Self::new(true, false, false)
    }

    pub const fn is_empty(&self) -> bool {
        !self.ctrl && !self.shift && !self.alt
    }
}

/// A keyboard key, written in event scripts as `"enter"`, `"escape"`,
/// `"delete"`, `"backspace"` or a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized key name {0:?}")]
pub struct KeyParseError(pub String);

impl Key {
    /// Folds ASCII letters to lowercase so bindings ignore caps and shift.
    pub fn normalized(self) -> Self {
        match self {
            Self::Character(ch) => Self::Character(ch.to_ascii_lowercase()),
            other => other,
        }
    }
}

impl TryFrom<String> for Key {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "enter" => return Ok(Self::Enter),
            "escape" | "esc" => return Ok(Self::Escape),
            "delete" => return Ok(Self::Delete),
            "backspace" => return Ok(Self::Backspace),
            _ => {}
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Self::Character(ch)),
            _ => Err(KeyParseError(value)),
        }
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        match key {
            Key::Character(ch) => ch.to_string(),
            Key::Enter => "enter".to_string(),
            Key::Escape => "escape".to_string(),
            Key::Delete => "delete".to_string(),
            Key::Backspace => "backspace".to_string(),
        }
    }
}

/// One host input, resolved once at the boundary. Positions are in screen
/// space relative to the client rect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown {
        position: Point,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        position: Point,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel {
        position: Point,
        /// Positive scrolls toward the user, which zooms out.
        delta: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Tick {
        elapsed_ms: u64,
    },
}
