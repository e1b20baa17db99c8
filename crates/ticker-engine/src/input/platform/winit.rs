use ::winit::event::{ElementState, WindowEvent};
use ::winit::keyboard::{Key as LogicalKey, ModifiersState, NamedKey};

use crate::input::{InputEvent, Key, KeyState, Modifiers};

/// Translates the keyboard and focus events the exercises can react to.
/// Lifecycle events (close, redraw, resize) are handled by the runtime and
/// yield `None`.
pub(crate) fn translate_window_event(modifiers: Modifiers, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::ModifiersChanged(m) => Some(InputEvent::ModifiersChanged(map_modifiers(m.state()))),

        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: map_key(&event.logical_key),
            state: match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            },
            modifiers,
            repeat: event.repeat,
        }),

        _ => None,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_key(key: &LogicalKey) -> Key {
    match key {
        LogicalKey::Named(named) => match named {
            NamedKey::Escape => Key::Escape,
            NamedKey::Enter => Key::Enter,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Space => Key::Space,
            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,
            NamedKey::F1 => Key::F(1),
            NamedKey::F2 => Key::F(2),
            NamedKey::F3 => Key::F(3),
            NamedKey::F4 => Key::F(4),
            NamedKey::F5 => Key::F(5),
            NamedKey::F6 => Key::F(6),
            NamedKey::F7 => Key::F(7),
            NamedKey::F8 => Key::F(8),
            NamedKey::F9 => Key::F(9),
            NamedKey::F10 => Key::F(10),
            NamedKey::F11 => Key::F(11),
            NamedKey::F12 => Key::F(12),
            _ => Key::Other,
        },
        LogicalKey::Character(s) => match s.chars().next() {
            Some(' ') => Key::Space,
            Some(c) => Key::Char(c.to_ascii_lowercase()),
            None => Key::Other,
        },
        _ => Key::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map_directly() {
        assert_eq!(map_key(&LogicalKey::Named(NamedKey::Escape)), Key::Escape);
        assert_eq!(map_key(&LogicalKey::Named(NamedKey::F5)), Key::F(5));
        assert_eq!(map_key(&LogicalKey::Named(NamedKey::CapsLock)), Key::Other);
    }

    #[test]
    fn characters_are_lowercased() {
        assert_eq!(map_key(&LogicalKey::Character("Q".into())), Key::Char('q'));
        assert_eq!(map_key(&LogicalKey::Character(" ".into())), Key::Space);
    }
}
