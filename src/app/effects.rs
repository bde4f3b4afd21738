use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::anchor::ClickOutcome;
use crate::app::{App, Message, Model, ToastLevel};
use crate::bridge::{HostCommand, HostServices};
use crate::document::{Document, has_scheme};
use crate::files::is_markdown_file;
use crate::watcher::FileWatcher;

/// File name of the page handed to the system opener for printing.
const PRINT_FILE_NAME: &str = "marksight-print.html";

/// Platform services for the terminal: the system opener stands in for the
/// browser and the print dialog.
#[derive(Debug, Default)]
pub struct TerminalHost {
    zoom: Option<f64>,
    printed: Option<PathBuf>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zoom most recently applied.
    pub const fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    /// Where the last printed page was written.
    pub fn printed(&self) -> Option<&Path> {
        self.printed.as_deref()
    }
}

impl HostServices for TerminalHost {
    fn print(&mut self, page_html: &str) -> Result<()> {
        let path = std::env::temp_dir().join(PRINT_FILE_NAME);
        std::fs::write(&path, page_html)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        open_external_link(&path.to_string_lossy())
            .with_context(|| format!("Failed to open {}", path.display()))?;
        self.printed = Some(path);
        Ok(())
    }

    fn open_external(&mut self, url: &str) -> Result<()> {
        open_external_link(url).with_context(|| format!("Failed to open {url}"))
    }

    fn set_page_zoom(&mut self, zoom: f64) {
        debug!(zoom, "page zoom");
        self.zoom = Some(zoom);
    }
}

/// What following a non-fragment link does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Hand to the system opener (web and mail links).
    External(String),
    /// Show another Markdown file in the viewer.
    OpenFile(PathBuf),
    /// Hand a local non-Markdown file to the system opener.
    OpenPath(PathBuf),
    /// Nothing sensible to do.
    Unsupported(String),
}

/// Decide how to follow `href` from `doc`.
pub fn link_action(doc: &Document, href: &str) -> LinkAction {
    if has_scheme(href) {
        let scheme = href
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();
        return match scheme.as_str() {
            "http" | "https" | "mailto" => LinkAction::External(href.to_string()),
            _ => LinkAction::Unsupported(href.to_string()),
        };
    }
    match doc.resolve_resource(href) {
        Some(path) if is_markdown_file(&path) => LinkAction::OpenFile(path),
        Some(path) => LinkAction::OpenPath(path),
        None => LinkAction::Unsupported(href.to_string()),
    }
}

impl App {
    pub(super) fn make_file_watcher(path: &Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path)
    }

    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        host: &mut TerminalHost,
        msg: &Message,
        now_ms: u64,
    ) {
        match msg {
            Message::ToggleWatch => {
                let Some(path) = model.file_path.clone() else {
                    model.watch_enabled = false;
                    return;
                };
                if model.watch_enabled {
                    match Self::make_file_watcher(&path) {
                        Ok(watcher) => {
                            *file_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *file_watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            warn!(%err, path = %path.display(), "watcher failed");
                        }
                    }
                } else {
                    *file_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::FileChanged => {
                // live reload stays quiet on failure
                if let Err(err) = model.reload_from_disk() {
                    debug!(%err, "live reload failed");
                }
            }
            Message::ForceReload => match model.reload_from_disk() {
                Ok(_) => model.show_toast(ToastLevel::Info, "Reloaded"),
                Err(err) => model.show_toast(ToastLevel::Error, format!("Reload failed: {err}")),
            },
            Message::Click(column, row, at_ms) => {
                let outcome = model.viewer.handle_click_cell(*column, *row, *at_ms);
                if let ClickOutcome::External(href) = outcome {
                    Self::follow_link(model, host, &href);
                }
            }
            Message::Command(command) => Self::run_command(model, host, *command, now_ms),
            Message::CycleTheme => {
                Self::run_command(model, host, HostCommand::CycleTheme, now_ms);
                let theme = model.viewer.context().appearance;
                model.show_toast(ToastLevel::Info, format!("Theme: {theme}"));
                if let Some(path) = model.config_global_path.clone()
                    && let Err(err) = crate::config::save_theme(&path, theme)
                {
                    warn!(%err, "could not persist theme");
                    model.show_toast(ToastLevel::Warning, format!("Theme not saved: {err}"));
                }
            }
            Message::SubmitOpenPrompt => {
                let Some(text) = model.open_prompt.take() else {
                    return;
                };
                let text = text.trim();
                if !text.is_empty() {
                    Self::open_file(model, &expand_home(text));
                }
            }
            Message::OpenFile(path) => Self::open_file(model, path),
            _ => {}
        }
    }

    fn run_command(model: &mut Model, host: &mut TerminalHost, command: HostCommand, now_ms: u64) {
        if let Err(err) = model.viewer.execute(command, host, now_ms) {
            model.show_toast(ToastLevel::Error, format!("{err:#}"));
            return;
        }
        match command {
            HostCommand::ZoomIn | HostCommand::ZoomOut | HostCommand::ZoomReset => {
                let percent = (model.viewer.context().zoom * 100.0).round();
                model.show_toast(ToastLevel::Info, format!("Zoom {percent}%"));
            }
            HostCommand::Print => {
                if let Some(path) = host.printed() {
                    let message = format!("Print page opened: {}", path.display());
                    model.show_toast(ToastLevel::Info, message);
                }
            }
            _ => {}
        }
    }

    fn open_file(model: &mut Model, path: &Path) {
        match model.load_file(path) {
            Ok(()) => {
                let title = model.title();
                model.show_toast(ToastLevel::Info, format!("Opened {title}"));
            }
            Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
        }
    }

    fn follow_link(model: &mut Model, host: &mut TerminalHost, href: &str) {
        match link_action(model.viewer.document(), href) {
            LinkAction::External(url) => match host.open_external(&url) {
                Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
                Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err:#}")),
            },
            LinkAction::OpenFile(path) => Self::open_file(model, &path),
            LinkAction::OpenPath(path) => {
                if let Err(err) = host.open_external(&path.to_string_lossy()) {
                    model.show_toast(ToastLevel::Error, format!("Open failed: {err:#}"));
                }
            }
            LinkAction::Unsupported(href) => {
                model.show_toast(ToastLevel::Warning, format!("Cannot open {href}"));
            }
        }
    }
}

fn expand_home(text: &str) -> PathBuf {
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(text)
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
}
