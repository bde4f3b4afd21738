//! Appearance control: theme classes on the page and the terminal palette.
//!
//! The page carries exactly one of `theme-light`, `theme-dark` or
//! `theme-system` on its `html` element, and a matching `color-scheme` hint
//! on `meta#colorSchemeTag`.

use std::fmt;

use ratatui::style::Color;
use tracing::debug;

use crate::document::{COLOR_SCHEME_META_ID, Document};

/// Every theme class the controller manages.
pub const THEME_CLASSES: [&str; 3] = ["theme-light", "theme-dark", "theme-system"];

/// Appearance preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ThemeMode {
    /// Follow the system colour scheme.
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    /// Parse a mode, treating anything unknown as [`ThemeMode::System`].
    ///
    /// # Example
    ///
    /// ```
    /// use marksight::theme::ThemeMode;
    ///
    /// assert_eq!(ThemeMode::parse_lenient("dark"), ThemeMode::Dark);
    /// assert_eq!(ThemeMode::parse_lenient("sepia"), ThemeMode::System);
    /// ```
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse_strict(value).unwrap_or_default()
    }

    /// Parse a mode, rejecting unknown tokens.
    pub fn parse_strict(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Next mode in the appearance cycle: system, light, dark, system.
    pub const fn next(self) -> Self {
        match self {
            Self::System => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
        }
    }

    /// Value for the `color-scheme` meta hint.
    pub const fn color_scheme(self) -> &'static str {
        match self {
            Self::System => "light dark",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn class_name(self) -> &'static str {
        match self {
            Self::System => "theme-system",
            Self::Light => "theme-light",
            Self::Dark => "theme-dark",
        }
    }

    /// Resolve to a concrete dark/light answer.
    pub const fn is_dark(self, system_dark: bool) -> bool {
        match self {
            Self::System => system_dark,
            Self::Light => false,
            Self::Dark => true,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply `mode` to the page in place.
///
/// Safe to call repeatedly; only the class for `mode` remains afterwards.
pub fn apply_theme(doc: &mut Document, mode: ThemeMode) {
    let html = doc.html();
    let dom = doc.dom_mut();
    for class in THEME_CLASSES {
        dom.remove_class(html, class);
    }
    if let Some(meta) = dom.element_by_id(COLOR_SCHEME_META_ID) {
        dom.set_attr(meta, "content", mode.color_scheme());
    }
    dom.add_class(html, mode.class_name());
    debug!(theme = mode.as_str(), "theme applied");
}

/// Guess whether the terminal background is dark from `COLORFGBG`.
///
/// Terminals that do not set it are assumed dark.
pub fn system_prefers_dark() -> bool {
    background_is_dark(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_is_dark(colorfgbg: Option<&str>) -> bool {
    let Some(value) = colorfgbg else {
        return true;
    };
    let bg = value.rsplit(';').next().unwrap_or(value);
    bg.parse::<u8>().map_or(true, |bg| bg < 7)
}

/// Anchor highlight colour (`#ffd000`).
const HIGHLIGHT_RGB: (u8, u8, u8) = (255, 208, 0);

/// Terminal colours for one resolved appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub dark: bool,
    /// `None` leaves the terminal's own colours alone (system mode).
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub headings: [Color; 6],
    pub link: Color,
    pub code: Color,
    pub quote: Color,
    pub rule: Color,
    pub marker: Color,
    pub search_match: Color,
    pub search_current: Color,
    /// Peak opacity of the anchor highlight.
    pub highlight_strength: f64,
    base_rgb: (u8, u8, u8),
}

impl Palette {
    /// Resolve the palette for `mode`. `system_dark` is consulted only in
    /// system mode.
    pub fn for_mode(mode: ThemeMode, system_dark: bool) -> Self {
        let dark = mode.is_dark(system_dark);
        let (foreground, background) = match mode {
            ThemeMode::System => (None, None),
            ThemeMode::Light => (Some(Color::Rgb(31, 35, 40)), Some(Color::Rgb(255, 255, 255))),
            ThemeMode::Dark => (Some(Color::Rgb(230, 237, 243)), Some(Color::Rgb(13, 17, 23))),
        };
        if dark {
            Self {
                dark,
                foreground,
                background,
                headings: [
                    Color::Cyan,
                    Color::Green,
                    Color::Yellow,
                    Color::Blue,
                    Color::Magenta,
                    Color::Cyan,
                ],
                link: Color::Rgb(68, 147, 248),
                code: Color::Indexed(245),
                quote: Color::Blue,
                rule: Color::Indexed(240),
                marker: Color::Indexed(245),
                search_match: Color::Rgb(110, 90, 0),
                search_current: Color::Rgb(200, 110, 0),
                highlight_strength: 0.3,
                base_rgb: (13, 17, 23),
            }
        } else {
            Self {
                dark,
                foreground,
                background,
                headings: [
                    Color::Indexed(24),
                    Color::Indexed(22),
                    Color::Indexed(58),
                    Color::Indexed(24),
                    Color::Indexed(54),
                    Color::Indexed(24),
                ],
                link: Color::Rgb(9, 105, 218),
                code: Color::Indexed(238),
                quote: Color::Indexed(24),
                rule: Color::Indexed(241),
                marker: Color::Indexed(241),
                search_match: Color::Rgb(255, 232, 128),
                search_current: Color::Rgb(255, 170, 60),
                highlight_strength: 0.5,
                base_rgb: (255, 255, 255),
            }
        }
    }

    pub fn heading(&self, level: u8) -> Color {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.headings[index]
    }

    /// Anchor highlight background at `intensity` (1.0 at the start of the
    /// fade, 0.0 once it has finished).
    pub fn anchor_highlight(&self, intensity: f64) -> Option<Color> {
        if intensity <= 0.0 {
            return None;
        }
        let alpha = self.highlight_strength * intensity.min(1.0);
        Some(blend(self.base_rgb, HIGHLIGHT_RGB, alpha))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(base: (u8, u8, u8), over: (u8, u8, u8), alpha: f64) -> Color {
    let mix = |b: u8, o: u8| -> u8 {
        (f64::from(b) + (f64::from(o) - f64::from(b)) * alpha)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::Rgb(
        mix(base.0, over.0),
        mix(base.1, over.1),
        mix(base.2, over.2),
    )
}
