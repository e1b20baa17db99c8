/// Logical key identifier.
///
/// Named keys the exercises care about get variants; printable keys arrive as
/// `Char` (lowercased); everything else is `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    /// Function key `F1`..`F12`.
    F(u8),

    Char(char),

    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Platform-agnostic input events; the runtime translates winit events into these.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        /// True for OS key-repeat.
        repeat: bool,
    },

    ModifiersChanged(Modifiers),

    /// Losing focus releases every held key.
    Focused(bool),
}

impl InputEvent {
    /// Convenience constructor for a key press without modifiers.
    pub fn key_down(key: Key) -> Self {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    pub fn key_up(key: Key) -> Self {
        InputEvent::Key {
            key,
            state: KeyState::Released,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    /// True for a press (including repeats) of `key`.
    pub fn is_key_down(&self, key: Key) -> bool {
        matches!(self, InputEvent::Key { key: k, state: KeyState::Pressed, .. } if *k == key)
    }
}
