use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use ratatui::DefaultTerminal;
use tracing::{debug, warn};

use crate::app::{App, Message, Model, TerminalHost, ToastLevel, update};
use crate::files::read_markdown_file;
use crate::watcher::FileWatcher;

/// Frame interval while something is animating.
const ANIMATION_FRAME_MS: u64 = 16;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization, reading the starting
    /// file, or the event loop encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let source = match &self.file_path {
            Some(path) => read_markdown_file(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
            None => String::new(),
        };

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - marksight requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(
            self.file_path.clone(),
            &source,
            self.theme,
            (size.width, size.height),
        );
        model.watch_enabled = self.watch_enabled && self.file_path.is_some();
        model.system_dark = self.system_dark;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        // Shift+Enter is only distinguishable from Enter with the kitty protocol
        let enhanced = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )
            .is_ok();
        debug!(enhanced, "keyboard enhancement");

        let result = execute!(stdout(), EnableMouseCapture)
            .context("Failed to enable mouse capture")
            .and_then(|()| self.event_loop(&mut terminal, &mut model));

        // Restore terminal
        let _ = execute!(stdout(), DisableMouseCapture);
        if enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();

        result
    }

    fn apply(
        &self,
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        host: &mut TerminalHost,
        msg: Message,
        now_ms: u64,
    ) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, file_watcher, host, &side_msg, now_ms);
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let clock = || u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut host = TerminalHost::new();
        let mut file_watcher = None;
        let mut watched_path = None;
        let mut needs_render = true;

        loop {
            // Recreate watcher if the viewed file changed (e.g. opened from a link)
            if model.watch_enabled && model.file_path != watched_path {
                if let Some(path) = model.file_path.clone() {
                    match Self::make_file_watcher(&path) {
                        Ok(watcher) => file_watcher = Some(watcher),
                        Err(err) => {
                            model.watch_enabled = false;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            warn!(%err, path = %path.display(), "watcher failed");
                        }
                    }
                }
                watched_path.clone_from(&model.file_path);
            }

            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = clock();

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                debug!(width, height, "resize");
                self.apply(
                    model,
                    &mut file_watcher,
                    &mut host,
                    Message::Resize(width, height),
                    now_ms,
                );
                needs_render = true;
            }

            if model.watch_enabled
                && file_watcher
                    .as_mut()
                    .is_some_and(FileWatcher::take_change_ready)
            {
                self.apply(
                    model,
                    &mut file_watcher,
                    &mut host,
                    Message::FileChanged,
                    now_ms,
                );
                needs_render = true;
            }

            let animating = model.viewer.is_animating();
            if animating {
                self.apply(
                    model,
                    &mut file_watcher,
                    &mut host,
                    Message::Tick(now_ms),
                    now_ms,
                );
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render && !animating {
                0
            } else if animating {
                ANIMATION_FRAME_MS
            } else if resize_debouncer.is_pending() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Coalesce key repeat bursts into a single render.
                loop {
                    let event_ms = clock();
                    let msg = self.handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        self.apply(model, &mut file_watcher, &mut host, msg, event_ms);
                        needs_render = true;
                    }
                    if !event::poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }

            if needs_render || animating {
                let frame_ms = clock();
                terminal.draw(|frame| crate::ui::render(model, frame, frame_ms))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
