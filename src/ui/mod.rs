//! Terminal UI components.
//!
//! - [`viewport`]: scroll position and smooth scrolling
//! - [`style`]: span styles from the active palette
//! - [`render`]: drawing the page, bars and overlays

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

pub use overlays::help_lines;
pub use render::{render, visible_lines};

pub const DOCUMENT_LEFT_PADDING: u16 = 2;
