//! Vi-style scrolling keys.
//!
//! `j`/`k`/`h`/`l` step by one line unit, `0`/`$` jump horizontally,
//! `gg`/`G` jump to the ends, and `Ctrl-d`/`Ctrl-u`/`Ctrl-f`/`Ctrl-b` page.
//! `gg` is the only sequence: the first `g` arms a pending state that a
//! second `g` within [`GG_TIMEOUT_MS`] completes.

use crate::input::{Key, KeyInput};
use crate::ui::viewport::{ScrollBehavior, Viewport};

/// Scroll step for `j`/`k`/`h`/`l`, in pixels.
pub const LINE_PX: f64 = 40.0;
/// Window for the second `g` of `gg`.
pub const GG_TIMEOUT_MS: u64 = 500;

/// A scroll command produced by a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViAction {
    LineDown,
    LineUp,
    ColumnLeft,
    ColumnRight,
    LineStart,
    LineEnd,
    Top,
    Bottom,
    HalfPageDown,
    HalfPageUp,
    PageDown,
    PageUp,
}

impl ViAction {
    pub const fn behavior(self) -> ScrollBehavior {
        match self {
            Self::LineStart | Self::LineEnd | Self::Top | Self::Bottom => ScrollBehavior::Instant,
            _ => ScrollBehavior::Smooth,
        }
    }

    /// Apply the action to `viewport`.
    pub fn apply(self, viewport: &mut Viewport, now_ms: u64) {
        let behavior = self.behavior();
        let x = viewport.scroll_x();
        let y = viewport.scroll_y();
        let page = viewport.height();
        match self {
            Self::LineDown => viewport.scroll_by(0.0, LINE_PX, behavior, now_ms),
            Self::LineUp => viewport.scroll_by(0.0, -LINE_PX, behavior, now_ms),
            Self::ColumnLeft => viewport.scroll_by(-LINE_PX, 0.0, behavior, now_ms),
            Self::ColumnRight => viewport.scroll_by(LINE_PX, 0.0, behavior, now_ms),
            Self::LineStart => viewport.scroll_to(0.0, y, behavior, now_ms),
            Self::LineEnd => viewport.scroll_to(viewport.content_width(), y, behavior, now_ms),
            Self::Top => viewport.scroll_to(x, 0.0, behavior, now_ms),
            Self::Bottom => viewport.scroll_to(x, viewport.content_height(), behavior, now_ms),
            Self::HalfPageDown => viewport.scroll_by(0.0, page / 2.0, behavior, now_ms),
            Self::HalfPageUp => viewport.scroll_by(0.0, -page / 2.0, behavior, now_ms),
            Self::PageDown => viewport.scroll_by(0.0, page, behavior, now_ms),
            Self::PageUp => viewport.scroll_by(0.0, -page, behavior, now_ms),
        }
    }
}

/// Result of feeding a key to the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Not a vi key; the default action proceeds.
    Ignored,
    /// First half of `gg`; consumed.
    Pending,
    /// A complete binding; consumed.
    Action(ViAction),
}

impl KeyDisposition {
    pub const fn prevents_default(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Vi key state machine.
#[derive(Debug, Clone, Default)]
pub struct ViNavigator {
    pending_g_since: Option<u64>,
}

impl ViNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_pending(&self) -> bool {
        self.pending_g_since.is_some()
    }

    /// Feed a key pressed at `now_ms` while the document has focus.
    ///
    /// # Example
    ///
    /// ```
    /// use marksight::input::KeyInput;
    /// use marksight::vi::{KeyDisposition, ViAction, ViNavigator};
    ///
    /// let mut vi = ViNavigator::new();
    /// assert_eq!(vi.handle_key(&KeyInput::char('g'), 0), KeyDisposition::Pending);
    /// assert_eq!(
    ///     vi.handle_key(&KeyInput::char('g'), 200),
    ///     KeyDisposition::Action(ViAction::Top)
    /// );
    /// ```
    pub fn handle_key(&mut self, key: &KeyInput, now_ms: u64) -> KeyDisposition {
        let pending = self.pending_g_since.take();
        let Key::Char(c) = key.key else {
            return KeyDisposition::Ignored;
        };

        if key.ctrl {
            let action = match c {
                'd' => ViAction::HalfPageDown,
                'u' => ViAction::HalfPageUp,
                'f' => ViAction::PageDown,
                'b' => ViAction::PageUp,
                _ => return KeyDisposition::Ignored,
            };
            return KeyDisposition::Action(action);
        }
        if key.meta {
            return KeyDisposition::Ignored;
        }

        let action = match c {
            'j' => ViAction::LineDown,
            'k' => ViAction::LineUp,
            'h' => ViAction::ColumnLeft,
            'l' => ViAction::ColumnRight,
            '0' => ViAction::LineStart,
            '$' => ViAction::LineEnd,
            'G' => ViAction::Bottom,
            'g' => {
                if pending.is_some_and(|since| now_ms.saturating_sub(since) < GG_TIMEOUT_MS) {
                    return KeyDisposition::Action(ViAction::Top);
                }
                self.pending_g_since = Some(now_ms);
                return KeyDisposition::Pending;
            }
            _ => return KeyDisposition::Ignored,
        };
        KeyDisposition::Action(action)
    }

    /// Drop any half-typed sequence.
    pub fn reset(&mut self) {
        self.pending_g_since = None;
    }
}
