use std::path::PathBuf;

use crate::app::Model;
use crate::bridge::HostCommand;
use crate::input::KeyInput;
use crate::layout::ROW_PX;
use crate::ui::help_lines;

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: f64 = 3.0;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Page interaction
    /// Key press for the viewer (vi keys, search input), with its time
    Key(KeyInput, u64),
    /// Primary click on a document cell (column, row), with its time
    Click(u16, u16, u64),
    /// Mouse wheel: negative scrolls up
    Wheel(i8, u64),
    /// Viewer command (search, theme, zoom, print)
    Command(HostCommand),
    /// Cycle the appearance and remember it
    CycleTheme,
    /// Advance animations
    Tick(u64),

    // Files
    /// Show the open-file prompt
    StartOpenPrompt,
    /// Replace the prompt text
    OpenPromptInput(String),
    /// Open the typed path
    SubmitOpenPrompt,
    /// Dismiss the prompt
    CancelOpenPrompt,
    /// Open a file in place of the current one
    OpenFile(PathBuf),
    /// Toggle file watching
    ToggleWatch,
    /// File changed externally, reload
    FileChanged,
    /// Force reload file
    ForceReload,

    // Window
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,
    /// Scroll the help overlay by lines
    ScrollHelp(i16),
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// Messages that need the outside world (files, the system opener, the
/// config file) only change state in the effects pass.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Key(key, now_ms) => {
            model.viewer.handle_key(&key, now_ms);
        }
        Message::Wheel(notches, now_ms) => {
            let dy = f64::from(notches) * WHEEL_ROWS * ROW_PX;
            model.viewer.scroll_by(0.0, dy, now_ms);
        }
        Message::Tick(now_ms) => {
            model.viewer.tick(now_ms);
        }
        Message::StartOpenPrompt => {
            model.open_prompt = Some(String::new());
        }
        Message::OpenPromptInput(text) => {
            if model.open_prompt.is_some() {
                model.open_prompt = Some(text);
            }
        }
        Message::CancelOpenPrompt => {
            model.open_prompt = None;
        }
        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll = 0;
        }
        Message::HideHelp => {
            model.help_visible = false;
            model.help_scroll = 0;
        }
        Message::ScrollHelp(lines) => {
            let last = help_lines(&model).len().saturating_sub(1);
            let offset = model
                .help_scroll
                .saturating_add_signed(isize::from(lines));
            model.help_scroll = offset.min(last);
        }
        Message::Resize(width, height) => {
            model.resize(width, height);
        }
        Message::Quit => {
            model.should_quit = true;
        }
        // Click, Command, CycleTheme, SubmitOpenPrompt, OpenFile,
        // FileChanged, ForceReload: handled in effects
        Message::Click(..)
        | Message::Command(_)
        | Message::CycleTheme
        | Message::SubmitOpenPrompt
        | Message::OpenFile(_)
        | Message::FileChanged
        | Message::ForceReload => {}
    }
    model
}
