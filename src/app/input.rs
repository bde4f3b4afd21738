use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Message, Model};
use crate::bridge::HostCommand;
use crate::input::{Key, KeyInput};
use crate::search::SearchState;
use crate::ui::DOCUMENT_LEFT_PADDING;

use super::event_loop::ResizeDebouncer;

/// Help lines moved by PageUp/PageDown.
const HELP_PAGE: i16 = 10;

/// Translate a crossterm key event for the viewer.
pub(super) fn key_input(key: &KeyEvent) -> KeyInput {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    };
    KeyInput {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        meta: key
            .modifiers
            .intersects(KeyModifiers::SUPER | KeyModifiers::META),
        // Alt+Enter stands in for Shift+Enter on terminals that send both as \r
        shift: key.modifiers.contains(KeyModifiers::SHIFT)
            || (key.code == KeyCode::Enter && key.modifiers.contains(KeyModifiers::ALT)),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    }
}

impl App {
    pub(super) fn handle_event(
        &self,
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key(*key, model, now_ms)
            }
            Event::Mouse(mouse) => self.handle_mouse(*mouse, model, now_ms),
            Event::Resize(w, h) => {
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(&self, key: KeyEvent, model: &Model, now_ms: u64) -> Option<Message> {
        let _ = self;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Some(Message::Quit);
        }

        if model.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') | KeyCode::F(1) => Some(Message::HideHelp),
                KeyCode::Char('j') | KeyCode::Down => Some(Message::ScrollHelp(1)),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::ScrollHelp(-1)),
                KeyCode::PageDown => Some(Message::ScrollHelp(HELP_PAGE)),
                KeyCode::PageUp => Some(Message::ScrollHelp(-HELP_PAGE)),
                _ => None,
            };
        }

        if let Some(text) = &model.open_prompt {
            return match key.code {
                KeyCode::Esc => Some(Message::CancelOpenPrompt),
                KeyCode::Enter => Some(Message::SubmitOpenPrompt),
                KeyCode::Backspace => {
                    let mut text = text.clone();
                    text.pop();
                    Some(Message::OpenPromptInput(text))
                }
                KeyCode::Char(c) if !ctrl => Some(Message::OpenPromptInput(format!("{text}{c}"))),
                _ => None,
            };
        }

        // the search field takes every key while it has focus
        if model.viewer.search().input_focused() {
            return Some(Message::Key(key_input(&key), now_ms));
        }

        let search_state = model.viewer.search().state();
        match (key.code, ctrl) {
            (KeyCode::Char('q'), false) => Some(Message::Quit),
            (KeyCode::Char('?'), false) | (KeyCode::F(1), _) => Some(Message::ToggleHelp),
            (KeyCode::Char('T'), false) => Some(Message::CycleTheme),
            (KeyCode::Char('+'), false) => Some(Message::Command(HostCommand::ZoomIn)),
            (KeyCode::Char('-'), false) => Some(Message::Command(HostCommand::ZoomOut)),
            (KeyCode::Char('='), false) => Some(Message::Command(HostCommand::ZoomReset)),
            (KeyCode::Char('p'), true) => Some(Message::Command(HostCommand::Print)),
            (KeyCode::Char('O'), false) => Some(Message::StartOpenPrompt),
            (KeyCode::Char('r'), false) => Some(Message::ForceReload),
            (KeyCode::Char('w'), false) => Some(Message::ToggleWatch),
            (KeyCode::Esc, _) if search_state != SearchState::Closed => {
                Some(Message::Command(HostCommand::CloseSearch))
            }
            (KeyCode::Down, _) => Some(Message::Key(KeyInput::char('j'), now_ms)),
            (KeyCode::Up, _) => Some(Message::Key(KeyInput::char('k'), now_ms)),
            (KeyCode::Left, _) => Some(Message::Key(KeyInput::char('h'), now_ms)),
            (KeyCode::Right, _) => Some(Message::Key(KeyInput::char('l'), now_ms)),
            (KeyCode::PageDown, _) => Some(Message::Key(KeyInput::ctrl('f'), now_ms)),
            (KeyCode::PageUp, _) => Some(Message::Key(KeyInput::ctrl('b'), now_ms)),
            _ => Some(Message::Key(key_input(&key), now_ms)),
        }
    }

    pub(super) fn handle_mouse(
        &self,
        mouse: MouseEvent,
        model: &Model,
        now_ms: u64,
    ) -> Option<Message> {
        let _ = self;
        if model.help_visible || model.open_prompt.is_some() {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Message::Wheel(1, now_ms)),
            MouseEventKind::ScrollUp => Some(Message::Wheel(-1, now_ms)),
            MouseEventKind::Down(MouseButton::Left) => {
                let rows = model.viewer.viewport().height() / crate::layout::ROW_PX;
                if mouse.column < DOCUMENT_LEFT_PADDING || f64::from(mouse.row) >= rows {
                    return None;
                }
                Some(Message::Click(
                    mouse.column - DOCUMENT_LEFT_PADDING,
                    mouse.row,
                    now_ms,
                ))
            }
            _ => None,
        }
    }
}
