use super::{Key, Modifiers, PointerButton};
use crate::editor::tools::ToolKind;

/// Gesture predicates the editor consults before dispatching input.
pub trait Keymap {
    fn is_pan(&self, button: PointerButton, modifiers: Modifiers) -> bool;
    fn is_wheel_zoom(&self, modifiers: Modifiers) -> bool;
    fn is_color_sample(&self, button: PointerButton, modifiers: Modifiers) -> bool;
    fn tool_selection(&self, key: Key, modifiers: Modifiers) -> Option<ToolKind>;
    fn is_undo(&self, key: Key, modifiers: Modifiers) -> bool;
    fn is_redo(&self, key: Key, modifiers: Modifiers) -> bool;
    fn is_save(&self, key: Key, modifiers: Modifiers) -> bool;
    fn is_load(&self, key: Key, modifiers: Modifiers) -> bool;
}

/// Middle or alt-primary drag pans, plain wheel zooms, ctrl-click samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeymap;

fn resolve_tool_key(key: Key) -> Option<ToolKind> {
    match key {
        Key::Character('p') => Some(ToolKind::Pencil),
        Key::Character('s') => Some(ToolKind::Spray),
        Key::Character('c') => Some(ToolKind::Crop),
        Key::Character('h') => Some(ToolKind::Pan),
        Key::Character('i') => Some(ToolKind::ColorPicker),
        _ => None,
    }
}

impl Keymap for DefaultKeymap {
    fn is_pan(&self, button: PointerButton, modifiers: Modifiers) -> bool {
        match button {
            PointerButton::Middle => true,
            PointerButton::Primary => modifiers.alt && !modifiers.ctrl,
            PointerButton::Secondary => false,
        }
    }

    fn is_wheel_zoom(&self, modifiers: Modifiers) -> bool {
        !modifiers.shift
    }

    fn is_color_sample(&self, button: PointerButton, modifiers: Modifiers) -> bool {
        button == PointerButton::Primary && modifiers.ctrl && !modifiers.alt
    }

    fn tool_selection(&self, key: Key, modifiers: Modifiers) -> Option<ToolKind> {
        if modifiers.ctrl || modifiers.alt {
            return None;
        }
        resolve_tool_key(key.normalized())
    }

    fn is_undo(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!(
            (key.normalized(), modifiers.ctrl, modifiers.shift),
            (Key::Character('z'), true, false)
        )
    }

    fn is_redo(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!(
            (key.normalized(), modifiers.ctrl, modifiers.shift),
            (Key::Character('z'), true, true) | (Key::Character('y'), true, false)
        )
    }

    fn is_save(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!((key.normalized(), modifiers.ctrl), (Key::Character('s'), true))
    }

    fn is_load(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!((key.normalized(), modifiers.ctrl), (Key::Character('o'), true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIFT: Modifiers = Modifiers::new(false, true, false);
    const ALT: Modifiers = Modifiers::new(false, false, true);
    const CTRL_SHIFT: Modifiers = Modifiers::new(true, true, false);

    #[test]
    fn pan_gesture_uses_middle_or_alt_drag() {
        let keymap = DefaultKeymap;
        assert!(keymap.is_pan(PointerButton::Middle, Modifiers::NONE));
        assert!(keymap.is_pan(PointerButton::Primary, ALT));
        assert!(!keymap.is_pan(PointerButton::Primary, Modifiers::NONE));
        assert!(!keymap.is_pan(PointerButton::Secondary, ALT));
    }

    #[test]
    fn shift_wheel_does_not_zoom() {
        let keymap = DefaultKeymap;
        assert!(keymap.is_wheel_zoom(Modifiers::NONE));
        assert!(keymap.is_wheel_zoom(Modifiers::ctrl()));
        assert!(!keymap.is_wheel_zoom(SHIFT));
    }

    #[test]
    fn ctrl_click_samples_color() {
        let keymap = DefaultKeymap;
        assert!(keymap.is_color_sample(PointerButton::Primary, Modifiers::ctrl()));
        assert!(!keymap.is_color_sample(PointerButton::Primary, Modifiers::NONE));
        assert!(!keymap.is_color_sample(PointerButton::Middle, Modifiers::ctrl()));
    }

    #[test]
    fn tool_keys_ignore_case_but_not_ctrl() {
        let keymap = DefaultKeymap;
        assert_eq!(
            keymap.tool_selection(Key::Character('P'), SHIFT),
            Some(ToolKind::Pencil)
        );
        assert_eq!(
            keymap.tool_selection(Key::Character('i'), Modifiers::NONE),
            Some(ToolKind::ColorPicker)
        );
        assert_eq!(keymap.tool_selection(Key::Character('s'), Modifiers::ctrl()), None);
        assert_eq!(keymap.tool_selection(Key::Enter, Modifiers::NONE), None);
    }

    #[test]
    fn history_and_file_chords_resolve() {
        let keymap = DefaultKeymap;
        let z = Key::Character('z');
        assert!(keymap.is_undo(z, Modifiers::ctrl()));
        assert!(!keymap.is_undo(z, CTRL_SHIFT));
        assert!(keymap.is_redo(Key::Character('Z'), CTRL_SHIFT));
        assert!(keymap.is_redo(Key::Character('y'), Modifiers::ctrl()));
        assert!(!keymap.is_redo(z, Modifiers::NONE));
        assert!(keymap.is_save(Key::Character('s'), Modifiers::ctrl()));
        assert!(keymap.is_load(Key::Character('o'), Modifiers::ctrl()));
        assert!(!keymap.is_save(Key::Character('s'), Modifiers::NONE));
    }
}
