mod event;
mod keymap;

pub use event::{InputEvent, Key, KeyParseError, Modifiers, PointerButton};
pub use keymap::{DefaultKeymap, Keymap};
