//! Toolkit-neutral keyboard events.
//!
//! The interaction components only see [`KeyInput`]; the terminal shell maps
//! crossterm events onto it (see `app::input`).

/// The key that was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character, already shifted (`G`, `$`, `N`).
    Char(char),
    Enter,
    Escape,
    Backspace,
    /// Anything the viewer does not bind.
    Other,
}

/// A key press with its modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    /// Command key on macOS, Super elsewhere.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyInput {
    /// A key with no modifiers.
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    /// A printable character with no modifiers.
    pub const fn char(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    /// A character with ctrl held.
    pub const fn ctrl(c: char) -> Self {
        Self {
            ctrl: true,
            ..Self::char(c)
        }
    }

    pub const fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub const fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// True when neither ctrl nor meta is held.
    pub const fn is_unmodified(&self) -> bool {
        !self.ctrl && !self.meta
    }
}
