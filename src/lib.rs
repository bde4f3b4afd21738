// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. search::SearchEngine)
    clippy::module_name_repetitions
)]

//! # marksight
//!
//! A terminal Markdown viewer.
//!
//! marksight renders a Markdown file into an HTML page model and shows it in
//! the terminal with:
//! - System, light and dark appearances
//! - Fragment links that scroll to their target and flash it
//! - vi-style scrolling (`j`/`k`, `gg`/`G`, `Ctrl-d`, ...)
//! - Incremental, case-insensitive in-page search
//! - Zoom, print and live reload
//!
//! ## Architecture
//!
//! The page layer ([`bridge::Viewer`]) owns the rendered page and every
//! interaction controller. The terminal host uses The Elm Architecture (TEA):
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`bridge`]: The viewer and its host commands
//! - [`document`]: Markdown rendering into the page model
//! - [`dom`]: Arena tree the page lives in
//! - [`layout`]: Line-box layout of the page
//! - [`theme`]: Appearance control and palettes
//! - [`anchor`]: In-page link navigation
//! - [`vi`]: vi key navigation
//! - [`search`]: In-page search
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: File watching

pub mod anchor;
pub mod app;
pub mod bridge;
pub mod config;
pub mod document;
pub mod dom;
pub mod files;
pub mod input;
pub mod layout;
pub mod search;
pub mod theme;
pub mod ui;
pub mod vi;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::bridge::{HostCommand, HostServices, Viewer, ViewerContext};
    pub use crate::document::Document;
    pub use crate::input::{Key, KeyInput};
    pub use crate::theme::ThemeMode;
    pub use crate::ui::viewport::Viewport;
}
