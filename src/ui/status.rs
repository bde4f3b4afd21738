use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, ToastLevel};

pub fn render_search_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let search = model.viewer.search();
    let query = search.query();
    let count = search.count_text();
    let match_info = if count.is_empty() {
        String::new()
    } else {
        format!("  [{count}]")
    };
    let prompt = format!("/{query}");
    let text = format!("{prompt}{match_info}  Enter: next  Shift/Alt-Enter: prev  Esc: close");
    let style = if count == "0/0" {
        Style::default().bg(Color::Red).fg(Color::White)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(text).style(style), area);

    let cursor_x = u16::try_from(prompt.width()).unwrap_or(u16::MAX);
    if cursor_x < area.width {
        frame.set_cursor_position(Position::new(area.x + cursor_x, area.y));
    }
}

pub fn render_open_prompt(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(text) = model.open_prompt.as_deref() else {
        return;
    };
    let prompt = format!("Open: {text}");
    let cursor_x = u16::try_from(prompt.width()).unwrap_or(u16::MAX);
    let bar = Paragraph::new(format!("{prompt}  Enter: open  Esc: cancel"))
        .style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
    if cursor_x < area.width {
        frame.set_cursor_position(Position::new(area.x + cursor_x, area.y));
    }
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let viewer = &model.viewer;
    let percent = viewer.viewport().scroll_percent();
    let context = viewer.context();
    let zoom = (context.zoom * 100.0).round();

    let search_indicator = match viewer.search().count_text() {
        "" => String::new(),
        count => format!(" [/{} {count}]", viewer.search().query()),
    };
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let status = format!(
        " {}  [{}%]  zoom {}%  theme {}{}{}  ?:help",
        model.title(),
        percent,
        zoom,
        context.appearance,
        search_indicator,
        watch_indicator
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
