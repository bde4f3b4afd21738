use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::Model;
use crate::layout::{CHAR_PX, Layout as PageLayout, ROW_PX};
use crate::search::SearchState;
use crate::theme::Palette;

use super::{DOCUMENT_LEFT_PADDING, overlays, status, style};

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame, now_ms: u64) {
    let area = frame.area();
    let palette = model.palette();

    let [document_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    render_document(model, &palette, frame, document_area, now_ms);

    // bars stack upwards from the status line, over the page
    let mut bars: Vec<fn(&Model, &mut Frame, Rect)> = Vec::new();
    if model.viewer.search().state() == SearchState::Open {
        bars.push(status::render_search_bar);
    }
    if model.open_prompt.is_some() {
        bars.push(status::render_open_prompt);
    }
    if model.active_toast().is_some() {
        bars.push(status::render_toast_bar);
    }
    for (offset, bar) in (1..=document_area.height).zip(bars) {
        let row = Rect::new(area.x, document_area.bottom() - offset, area.width, 1);
        frame.render_widget(Clear, row);
        bar(model, frame, row);
    }
    status::render_status_bar(model, frame, status_area);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_document(model: &Model, palette: &Palette, frame: &mut Frame, area: Rect, now_ms: u64) {
    let shown = model.viewer.viewport().displayed(now_ms);
    let first_row = scroll_cells(shown.y, ROW_PX);
    let first_column = scroll_cells(shown.x, CHAR_PX);
    let highlight = palette.anchor_highlight(model.viewer.highlight_intensity(now_ms));

    let lines = visible_lines(
        model.viewer.layout(),
        palette,
        highlight,
        first_row,
        usize::from(area.height),
        first_column,
    );
    let page = Paragraph::new(lines)
        .style(style::page_style(palette))
        .block(Block::default().padding(Padding::left(DOCUMENT_LEFT_PADDING)));
    frame.render_widget(Clear, area);
    frame.render_widget(page, area);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scroll_cells(offset: f64, cell_px: f64) -> usize {
    (offset.max(0.0) / cell_px).floor() as usize
}

/// Styled rows `first_row..first_row + rows`, shifted left by
/// `first_column` columns.
pub fn visible_lines(
    layout: &PageLayout,
    palette: &Palette,
    highlight: Option<Color>,
    first_row: usize,
    rows: usize,
    first_column: usize,
) -> Vec<Line<'static>> {
    layout
        .lines()
        .iter()
        .skip(first_row)
        .take(rows)
        .map(|line| {
            let mut cursor = 0usize;
            let mut spans = Vec::with_capacity(line.spans.len());
            for span in &line.spans {
                let (text, start) = clip_left(&span.text, span.col, first_column);
                if text.is_empty() {
                    continue;
                }
                if start > cursor {
                    spans.push(Span::raw(" ".repeat(start - cursor)));
                }
                let width = text.width();
                spans.push(Span::styled(
                    text,
                    style::span_style(span.style, palette, highlight),
                ));
                cursor = start + width;
            }
            Line::from(spans)
        })
        .collect()
}

/// Drop the part of `text` (placed at `col`) left of `first_column`.
/// Returns the remaining text and its column on screen.
fn clip_left(text: &str, col: usize, first_column: usize) -> (String, usize) {
    if col >= first_column {
        return (text.to_string(), col - first_column);
    }
    let mut skip = first_column - col;
    let mut chars = text.chars();
    let mut lead = 0;
    while skip > 0 {
        let Some(c) = chars.next() else {
            return (String::new(), 0);
        };
        let width = c.width().unwrap_or(0);
        if width > skip {
            // a wide glyph cut in half leaves blank cells
            lead = width - skip;
            skip = 0;
        } else {
            skip -= width;
        }
    }
    let rest: String = chars.collect();
    if rest.is_empty() {
        return (String::new(), 0);
    }
    (rest, lead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_left_keeps_text_right_of_offset() {
        assert_eq!(clip_left("hello", 4, 2), ("hello".to_string(), 2));
        assert_eq!(clip_left("hello", 0, 2), ("llo".to_string(), 0));
        assert_eq!(clip_left("hi", 0, 5), (String::new(), 0));
    }

    #[test]
    fn test_clip_left_splits_wide_glyph() {
        assert_eq!(clip_left("日本", 0, 1), ("本".to_string(), 1));
    }

    #[test]
    fn test_scroll_cells_rounds_down() {
        assert_eq!(scroll_cells(59.0, ROW_PX), 2);
        assert_eq!(scroll_cells(-5.0, ROW_PX), 0);
    }
}
