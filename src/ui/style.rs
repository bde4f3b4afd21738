//! Terminal styles for laid-out spans.

use ratatui::style::{Color, Modifier, Style};

use crate::layout::SpanStyle;
use crate::theme::Palette;

/// Base style for the page: the palette's own colours, if it has any.
pub fn page_style(palette: &Palette) -> Style {
    let mut style = Style::default();
    if let Some(fg) = palette.foreground {
        style = style.fg(terminal_color(fg));
    }
    if let Some(bg) = palette.background {
        style = style.bg(terminal_color(bg));
    }
    style
}

/// Style for one span. `highlight` is the current anchor highlight
/// background, if a fade is running.
pub fn span_style(span: SpanStyle, palette: &Palette, highlight: Option<Color>) -> Style {
    let mut style = page_style(palette);

    if span.heading > 0 {
        style = style
            .fg(terminal_color(palette.heading(span.heading)))
            .add_modifier(Modifier::BOLD);
        if span.heading == 1 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
    }
    if span.quote {
        style = style
            .fg(terminal_color(palette.quote))
            .add_modifier(Modifier::ITALIC);
    }
    if span.marker {
        style = style.fg(terminal_color(palette.marker));
    }
    if span.rule {
        style = style.fg(terminal_color(palette.rule));
    }
    if span.code {
        style = style.fg(terminal_color(palette.code));
    }
    if span.link {
        style = style
            .fg(terminal_color(palette.link))
            .add_modifier(Modifier::UNDERLINED);
    }
    if span.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if span.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if span.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }

    if span.anchor_highlight
        && let Some(bg) = highlight
    {
        style = style.bg(terminal_color(bg));
    }
    // search marks sit above the anchor fade
    if span.search_current {
        style = style
            .bg(terminal_color(palette.search_current))
            .fg(Color::Black);
    } else if span.search_match {
        style = style
            .bg(terminal_color(palette.search_match))
            .fg(if palette.dark { Color::White } else { Color::Black });
    }

    style
}

/// Map an RGB colour to what the terminal can show.
pub fn terminal_color(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) if !supports_truecolor() => Color::Indexed(rgb_to_xterm_256(r, g, b)),
        other => other,
    }
}

fn supports_truecolor() -> bool {
    if let Ok(force) = std::env::var("MARKSIGHT_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    if let Some(t) = term {
        let lower = t.to_ascii_lowercase();
        if lower.contains("direct") || lower.contains("truecolor") {
            return true;
        }
    }
    false
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // Result is always 0-5, fits in u8
    #[allow(clippy::cast_possible_truncation)]
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    let ri = to_cube(r);
    let gi = to_cube(g);
    let bi = to_cube(b);
    16 + (36 * ri) + (6 * gi) + bi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeMode;

    fn dark() -> Palette {
        Palette::for_mode(ThemeMode::Dark, true)
    }

    #[test]
    fn test_heading_styles_are_bold() {
        for level in 1..=6 {
            let span = SpanStyle {
                heading: level,
                ..SpanStyle::default()
            };
            let style = span_style(span, &dark(), None);
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn test_h1_is_underlined() {
        let span = SpanStyle {
            heading: 1,
            ..SpanStyle::default()
        };
        let style = span_style(span, &dark(), None);
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_system_palette_leaves_terminal_colours() {
        let palette = Palette::for_mode(ThemeMode::System, true);
        let style = span_style(SpanStyle::default(), &palette, None);
        assert_eq!(style.fg, None);
        assert_eq!(style.bg, None);
    }

    #[test]
    fn test_fixed_palette_sets_page_colours() {
        let style = page_style(&Palette::for_mode(ThemeMode::Light, true));
        assert!(style.fg.is_some());
        assert!(style.bg.is_some());
    }

    #[test]
    fn test_current_match_wins_over_match() {
        let palette = dark();
        let span = SpanStyle {
            search_match: true,
            search_current: true,
            ..SpanStyle::default()
        };
        let style = span_style(span, &palette, None);
        assert_eq!(style.bg, Some(terminal_color(palette.search_current)));
    }

    #[test]
    fn test_anchor_highlight_needs_active_fade() {
        let palette = dark();
        let span = SpanStyle {
            anchor_highlight: true,
            ..SpanStyle::default()
        };
        let faded = span_style(span, &palette, None);
        assert_eq!(faded.bg, page_style(&palette).bg);

        let glow = palette.anchor_highlight(1.0);
        let lit = span_style(span, &palette, glow);
        assert_eq!(lit.bg, glow.map(terminal_color));
    }

    #[test]
    fn test_search_match_covers_anchor_highlight() {
        let palette = dark();
        let span = SpanStyle {
            anchor_highlight: true,
            search_match: true,
            ..SpanStyle::default()
        };
        let style = span_style(span, &palette, palette.anchor_highlight(1.0));
        assert_eq!(style.bg, Some(terminal_color(palette.search_match)));
    }

    #[test]
    fn test_truecolor_detection_without_colorterm() {
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_truecolor_detection_with_colorterm() {
        assert!(supports_truecolor_from_env(
            Some("truecolor"),
            Some("xterm-256color")
        ));
    }

    #[test]
    fn test_fallback_indexed_color_when_not_truecolor() {
        let idx = rgb_to_xterm_256(255, 0, 0);
        assert_eq!(idx, 196);
    }
}
