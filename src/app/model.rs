use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::bridge::{Viewer, ViewerContext};
use crate::files::{FileError, abbreviate_path, read_markdown_file};
use crate::theme::{Palette, ThemeMode};

use super::TOAST_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug, Clone)]
pub struct Model {
    /// The page and its interaction state
    pub viewer: Viewer,
    /// File being shown, if any
    pub file_path: Option<PathBuf>,
    /// Whether file watching is enabled
    pub watch_enabled: bool,
    /// Whether the terminal background looks dark (system theme)
    pub system_dark: bool,
    /// Global config path shown in help and used to persist the theme
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// First help line shown
    pub help_scroll: usize,
    /// Path being typed into the open-file prompt
    pub open_prompt: Option<String>,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(None, "", ThemeMode::System, (80, 24))
    }
}

impl Model {
    /// Create a model showing `source`.
    ///
    /// `terminal_size` is the full terminal; one row is kept for the status bar.
    pub fn new(
        file_path: Option<PathBuf>,
        source: &str,
        theme: ThemeMode,
        terminal_size: (u16, u16),
    ) -> Self {
        let (columns, rows) = document_area(terminal_size);
        let mut viewer = Viewer::new(ViewerContext::with_appearance(theme), columns, rows);
        viewer.load_content(source, base_dir_of(file_path.as_deref()), theme);
        Self {
            viewer,
            file_path,
            watch_enabled: false,
            system_dark: true,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            help_scroll: 0,
            open_prompt: None,
            toast: None,
            should_quit: false,
        }
    }

    /// Window title: the abbreviated file path.
    pub fn title(&self) -> String {
        abbreviate_path(self.file_path.as_deref())
    }

    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.viewer.context().appearance, self.system_dark)
    }

    /// Open another file, replacing the page.
    pub fn load_file(&mut self, path: &Path) -> Result<(), FileError> {
        let source = read_markdown_file(path)?;
        let theme = self.viewer.context().appearance;
        self.viewer
            .load_content(&source, base_dir_of(Some(path)), theme);
        self.file_path = Some(path.to_path_buf());
        info!(path = %path.display(), "file opened");
        Ok(())
    }

    /// Re-read the current file, keeping the scroll position. Returns true if
    /// the page changed.
    pub fn reload_from_disk(&mut self) -> Result<bool, FileError> {
        let Some(path) = self.file_path.clone() else {
            return Ok(false);
        };
        let source = read_markdown_file(&path)?;
        let changed = self.viewer.reload(&source, true);
        // the terminal page is ready as soon as it is rendered
        self.viewer.on_load_finished();
        debug!(changed, path = %path.display(), "reloaded from disk");
        Ok(changed)
    }

    pub(super) fn resize(&mut self, width: u16, height: u16) {
        let (columns, rows) = document_area((width, height));
        self.viewer.resize(columns, rows);
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

fn base_dir_of(path: Option<&Path>) -> Option<PathBuf> {
    path.map(|path| {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    })
}

/// Cells available to the page: the left padding and the status row are
/// taken out.
pub(super) const fn document_area(terminal_size: (u16, u16)) -> (u16, u16) {
    (
        terminal_size
            .0
            .saturating_sub(crate::ui::DOCUMENT_LEFT_PADDING),
        terminal_size.1.saturating_sub(1),
    )
}
