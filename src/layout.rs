//! Line-box layout of the content root.
//!
//! The terminal has no layout engine, so rendered DOM is flowed into rows of
//! styled spans here. Geometry is reported in logical pixels: one row is
//! [`ROW_PX`] tall and one column is [`CHAR_PX`] wide. That keeps scroll
//! arithmetic (line steps, viewport fractions, anchor offsets) in the same
//! units the page model uses.

use std::collections::HashMap;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::dom::{Dom, NodeData, NodeId};

/// Height of one text row in logical pixels.
pub const ROW_PX: f64 = 20.0;
/// Width of one terminal column in logical pixels.
pub const CHAR_PX: f64 = 8.0;

/// An axis-aligned box in content coordinates (pixels from the content
/// origin).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = self.bottom().max(other.bottom());
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Visual attributes of a span, derived from its ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    /// Heading level, 0 outside headings.
    pub heading: u8,
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
    pub quote: bool,
    /// List bullets, numbers and checkboxes.
    pub marker: bool,
    /// Horizontal rules and table borders.
    pub rule: bool,
    pub search_match: bool,
    pub search_current: bool,
    pub anchor_highlight: bool,
}

/// A run of text placed at a column.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpan {
    pub text: String,
    pub col: usize,
    /// Innermost node the text came from.
    pub node: NodeId,
    pub style: SpanStyle,
}

impl LayoutSpan {
    pub fn width(&self) -> usize {
        self.text.width()
    }
}

/// One row of the laid-out document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutLine {
    pub spans: Vec<LayoutSpan>,
}

impl LayoutLine {
    /// Columns used by the row.
    pub fn width(&self) -> usize {
        self.spans.last().map_or(0, |span| span.col + span.width())
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// The laid-out content root.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    lines: Vec<LayoutLine>,
    boxes: HashMap<NodeId, Rect>,
    columns: usize,
}

impl Layout {
    /// Flow everything under `root` into rows `columns` wide.
    ///
    /// # Example
    ///
    /// ```
    /// use marksight::document::Document;
    /// use marksight::layout::{Layout, ROW_PX};
    ///
    /// let doc = Document::from_markdown("# Title\n\nBody text", None);
    /// let layout = Layout::compute(doc.dom(), doc.content(), 40);
    /// assert_eq!(layout.lines()[0].text(), "Title");
    /// assert_eq!(layout.content_height(), 3.0 * ROW_PX);
    /// ```
    pub fn compute(dom: &Dom, root: NodeId, columns: usize) -> Self {
        let columns = columns.max(8);
        let mut builder = Builder::new(dom, columns);
        builder.blocks(root, SpanStyle::default());
        builder.finish_line();
        while builder.lines.last().is_some_and(|line| line.text().trim().is_empty()) {
            builder.lines.pop();
        }

        let mut boxes: HashMap<NodeId, Rect> = HashMap::new();
        for (row, line) in builder.lines.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = row as f64 * ROW_PX;
            for span in &line.spans {
                #[allow(clippy::cast_precision_loss)]
                let rect = Rect {
                    x: span.col as f64 * CHAR_PX,
                    y,
                    width: span.width() as f64 * CHAR_PX,
                    height: ROW_PX,
                };
                let mut current = Some(span.node);
                while let Some(node) = current {
                    boxes
                        .entry(node)
                        .and_modify(|existing| *existing = existing.union(rect))
                        .or_insert(rect);
                    if node == root {
                        break;
                    }
                    current = dom.parent(node);
                }
            }
        }

        Self {
            lines: builder.lines,
            boxes,
            columns,
        }
    }

    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&LayoutLine> {
        self.lines.get(row)
    }

    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Box of `node`, or `None` when it produced no output.
    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.boxes.get(&node).copied()
    }

    /// Total content height (`scrollHeight`).
    #[allow(clippy::cast_precision_loss)]
    pub fn content_height(&self) -> f64 {
        self.lines.len() as f64 * ROW_PX
    }

    /// Total content width (`scrollWidth`); at least the wrap width.
    #[allow(clippy::cast_precision_loss)]
    pub fn content_width(&self) -> f64 {
        let widest = self.lines.iter().map(LayoutLine::width).max().unwrap_or(0);
        widest.max(self.columns) as f64 * CHAR_PX
    }

    /// Innermost node rendered at content position (`x`, `y`).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let row = (y / ROW_PX) as usize;
        let col = (x / CHAR_PX) as usize;
        self.lines
            .get(row)?
            .spans
            .iter()
            .find(|span| col >= span.col && col < span.col + span.width().max(1))
            .map(|span| span.node)
    }
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "pre"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "table"
            | "hr"
            | "section"
            | "div"
            | "body"
    )
}

struct Indent {
    first: String,
    rest: String,
    node: NodeId,
    style: SpanStyle,
    first_pending: bool,
}

struct Piece<'d> {
    text: &'d str,
    owned: Option<String>,
    node: NodeId,
    style: SpanStyle,
    hard_break: bool,
}

impl Piece<'_> {
    fn text(&self) -> &str {
        self.owned.as_deref().unwrap_or(self.text)
    }
}

enum Token<'t> {
    Newline,
    Space(&'t str),
    Word(&'t str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut kind: Option<bool> = None;
    for (index, ch) in text.char_indices() {
        if ch == '\n' {
            if let Some(space) = kind.take() {
                tokens.push(token(&text[start..index], space));
            }
            tokens.push(Token::Newline);
            start = index + 1;
            continue;
        }
        let space = ch.is_whitespace();
        match kind {
            Some(current) if current == space => {}
            Some(current) => {
                tokens.push(token(&text[start..index], current));
                start = index;
                kind = Some(space);
            }
            None => {
                start = index;
                kind = Some(space);
            }
        }
    }
    if let Some(space) = kind {
        tokens.push(token(&text[start..], space));
    }
    tokens
}

const fn token(text: &str, space: bool) -> Token<'_> {
    if space { Token::Space(text) } else { Token::Word(text) }
}

struct Builder<'d> {
    dom: &'d Dom,
    columns: usize,
    lines: Vec<LayoutLine>,
    current: LayoutLine,
    col: usize,
    line_open: bool,
    indents: Vec<Indent>,
    content_start: usize,
    last_space: bool,
    last_blank_row: Option<usize>,
}

impl<'d> Builder<'d> {
    const fn new(dom: &'d Dom, columns: usize) -> Self {
        Self {
            dom,
            columns,
            lines: Vec::new(),
            current: LayoutLine { spans: Vec::new() },
            col: 0,
            line_open: false,
            indents: Vec::new(),
            content_start: 0,
            last_space: false,
            last_blank_row: None,
        }
    }

    fn style_for(&self, node: NodeId, mut style: SpanStyle) -> SpanStyle {
        let Some(el) = self.dom.element(node) else {
            return style;
        };
        if el.has_class("anchor-highlight") {
            style.anchor_highlight = true;
        }
        match el.tag() {
            "code" => style.code = true,
            "em" | "i" => style.emphasis = true,
            "strong" | "b" => style.strong = true,
            "s" | "del" => style.strikethrough = true,
            "a" => style.link = true,
            "mark" => {
                style.search_match = el.has_class("search-match");
                style.search_current = el.has_class("search-match-current");
            }
            "blockquote" => style.quote = true,
            "th" => style.strong = true,
            tag => {
                if let Some(level) = tag.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
                    style.heading = level;
                    style.strong = true;
                }
            }
        }
        style
    }

    fn is_block(&self, node: NodeId) -> bool {
        self.dom.tag(node).is_some_and(is_block_tag)
    }

    fn start_line(&mut self) {
        if self.line_open {
            return;
        }
        self.line_open = true;
        self.col = 0;
        self.last_space = false;
        let mut prefix = Vec::new();
        for indent in &mut self.indents {
            let text = if indent.first_pending {
                indent.first_pending = false;
                indent.first.clone()
            } else {
                indent.rest.clone()
            };
            prefix.push((text, indent.node, indent.style));
        }
        for (text, node, style) in prefix {
            self.push_span(&text, node, style);
        }
        self.content_start = self.col;
    }

    fn finish_line(&mut self) {
        if !self.line_open {
            return;
        }
        self.line_open = false;
        self.lines.push(std::mem::take(&mut self.current));
        self.col = 0;
    }

    fn prefix_width(&self) -> usize {
        self.indents
            .iter()
            .map(|indent| {
                if indent.first_pending {
                    indent.first.width()
                } else {
                    indent.rest.width()
                }
            })
            .sum()
    }

    fn at_line_start(&self) -> bool {
        !self.line_open || self.col == self.content_start
    }

    /// Blank separator row before a block, never at the very top and never
    /// right after a list marker.
    fn separate(&mut self) {
        self.finish_line();
        if self.lines.is_empty() || self.indents.iter().any(|indent| indent.first_pending) {
            return;
        }
        if self.last_blank_row == Some(self.lines.len()) {
            return;
        }
        let mut blank = LayoutLine::default();
        let mut col = 0;
        for indent in &self.indents {
            if indent.style.quote {
                blank.spans.push(LayoutSpan {
                    text: indent.rest.clone(),
                    col,
                    node: indent.node,
                    style: indent.style,
                });
            }
            col += indent.rest.width();
        }
        self.lines.push(blank);
        self.last_blank_row = Some(self.lines.len());
    }

    fn push_span(&mut self, text: &str, node: NodeId, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        let width = text.width();
        if let Some(last) = self.current.spans.last_mut()
            && last.node == node
            && last.style == style
            && last.col + last.width() == self.col
        {
            last.text.push_str(text);
        } else {
            self.current.spans.push(LayoutSpan {
                text: text.to_string(),
                col: self.col,
                node,
                style,
            });
        }
        self.col += width;
    }

    fn place(&mut self, text: &str, node: NodeId, style: SpanStyle) {
        self.start_line();
        self.push_span(text, node, style);
    }

    /// Lay out the children of a container, grouping inline runs.
    fn blocks(&mut self, parent: NodeId, style: SpanStyle) {
        let dom = self.dom;
        let mut run: Vec<NodeId> = Vec::new();
        for &child in dom.children(parent) {
            if self.is_block(child) {
                self.inline_run(&run, style);
                run.clear();
                self.block(child, style);
            } else {
                run.push(child);
            }
        }
        self.inline_run(&run, style);
    }

    fn inline_run(&mut self, run: &[NodeId], style: SpanStyle) {
        let blank = run
            .iter()
            .all(|node| self.dom.text(*node).is_some_and(|t| t.trim().is_empty()));
        if run.is_empty() || blank {
            return;
        }
        let mut pieces = Vec::new();
        for node in run {
            self.collect(*node, style, &mut pieces);
        }
        self.flow(&pieces, true);
        self.finish_line();
    }

    fn block(&mut self, node: NodeId, inherited: SpanStyle) {
        let style = self.style_for(node, inherited);
        let dom = self.dom;
        let Some(tag) = dom.tag(node) else {
            return;
        };
        match tag {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.separate();
                let mut pieces = Vec::new();
                for &child in dom.children(node) {
                    self.collect(child, style, &mut pieces);
                }
                self.flow(&pieces, true);
                self.finish_line();
            }
            "pre" => {
                self.separate();
                let mut code_style = style;
                code_style.code = true;
                self.indents.push(Indent {
                    first: "  ".to_string(),
                    rest: "  ".to_string(),
                    node,
                    style: code_style,
                    first_pending: false,
                });
                let mut pieces = Vec::new();
                for &child in dom.children(node) {
                    self.collect(child, code_style, &mut pieces);
                }
                self.flow(&pieces, false);
                self.finish_line();
                self.indents.pop();
            }
            "ul" | "ol" => self.list(node, tag == "ol", style),
            "li" => self.list_item(node, "• ".to_string(), style),
            "blockquote" => {
                self.separate();
                self.indents.push(Indent {
                    first: "│ ".to_string(),
                    rest: "│ ".to_string(),
                    node,
                    style,
                    first_pending: false,
                });
                self.blocks(node, style);
                self.finish_line();
                self.indents.pop();
            }
            "hr" => {
                self.separate();
                let mut rule = style;
                rule.rule = true;
                let width = self.columns.saturating_sub(self.prefix_width()).max(1);
                self.place(&"─".repeat(width), node, rule);
                self.finish_line();
            }
            "table" => {
                self.separate();
                self.table(node, style);
            }
            _ => self.blocks(node, style),
        }
    }

    fn list(&mut self, node: NodeId, ordered: bool, style: SpanStyle) {
        let nested = self
            .dom
            .parent(node)
            .and_then(|parent| self.dom.tag(parent))
            .is_some_and(|tag| tag == "li");
        if nested {
            self.finish_line();
        } else {
            self.separate();
        }
        let start = self
            .dom
            .attr(node, "start")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        let items: Vec<NodeId> = self
            .dom
            .children(node)
            .iter()
            .copied()
            .filter(|child| self.dom.tag(*child) == Some("li"))
            .collect();
        let number_width = (start + items.len().saturating_sub(1) as u64).to_string().len();
        for (index, item) in items.into_iter().enumerate() {
            let marker = if ordered {
                format!("{:>number_width$}. ", start + index as u64)
            } else {
                "• ".to_string()
            };
            self.list_item(item, marker, style);
        }
    }

    fn list_item(&mut self, node: NodeId, marker: String, inherited: SpanStyle) {
        let style = self.style_for(node, inherited);
        let mut marker_style = style;
        marker_style.marker = true;
        self.finish_line();
        let rest = " ".repeat(marker.width());
        self.indents.push(Indent {
            first: marker,
            rest,
            node,
            style: marker_style,
            first_pending: true,
        });
        self.blocks(node, style);
        if self.indents.last().is_some_and(|indent| indent.first_pending) {
            // empty item still shows its marker
            self.start_line();
        }
        self.finish_line();
        self.indents.pop();
    }

    fn table(&mut self, node: NodeId, style: SpanStyle) {
        let mut rows: Vec<(bool, Vec<Vec<Piece<'d>>>)> = Vec::new();
        let row_nodes: Vec<NodeId> = self
            .dom
            .descendants(node)
            .filter(|id| self.dom.tag(*id) == Some("tr"))
            .collect();
        for tr in row_nodes {
            let header = self
                .dom
                .parent(tr)
                .and_then(|section| self.dom.tag(section))
                .is_some_and(|tag| tag == "thead");
            let mut cells = Vec::new();
            for &cell in self.dom.children(tr) {
                let cell_style = self.style_for(cell, style);
                let mut pieces = Vec::new();
                for &child in self.dom.children(cell) {
                    self.collect(child, cell_style, &mut pieces);
                }
                cells.push(pieces);
            }
            rows.push((header, cells));
        }

        let column_count = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let mut widths = vec![0usize; column_count];
        for (_, cells) in &rows {
            for (index, pieces) in cells.iter().enumerate() {
                let width: usize = pieces.iter().map(|p| cell_text(p.text()).width()).sum();
                widths[index] = widths[index].max(width);
            }
        }

        let mut border = style;
        border.rule = true;
        for (header, cells) in &rows {
            for (index, width) in widths.iter().enumerate() {
                self.place(if index == 0 { "│ " } else { " │ " }, node, border);
                let mut used = 0;
                if let Some(pieces) = cells.get(index) {
                    for piece in pieces {
                        let text = cell_text(piece.text());
                        used += text.width();
                        self.place(&text, piece.node, piece.style);
                    }
                }
                self.place(&" ".repeat(width.saturating_sub(used)), node, style);
            }
            self.place(" │", node, border);
            self.finish_line();
            if *header {
                let mut rule = String::from("├");
                for (index, width) in widths.iter().enumerate() {
                    if index > 0 {
                        rule.push('┼');
                    }
                    rule.push_str(&"─".repeat(width + 2));
                }
                rule.push('┤');
                self.place(&rule, node, border);
                self.finish_line();
            }
        }
    }

    fn collect(&self, node: NodeId, style: SpanStyle, pieces: &mut Vec<Piece<'d>>) {
        let dom: &'d Dom = self.dom;
        match dom.data(node) {
            NodeData::Text(text) => pieces.push(Piece {
                text,
                owned: None,
                node,
                style,
                hard_break: false,
            }),
            NodeData::Element(el) => {
                let style = self.style_for(node, style);
                match el.tag() {
                    "br" => pieces.push(Piece {
                        text: "",
                        owned: None,
                        node,
                        style,
                        hard_break: true,
                    }),
                    "img" => {
                        let mut image = style;
                        image.link = true;
                        pieces.push(Piece {
                            text: "",
                            owned: Some(format!("[image: {}]", el.attr("alt").unwrap_or(""))),
                            node,
                            style: image,
                            hard_break: false,
                        });
                    }
                    "input" => {
                        let mut marker = style;
                        marker.marker = true;
                        let checked = el.attr("checked").is_some();
                        pieces.push(Piece {
                            text: if checked { "[x]" } else { "[ ]" },
                            owned: None,
                            node,
                            style: marker,
                            hard_break: false,
                        });
                    }
                    _ => {
                        for &child in dom.children(node) {
                            self.collect(child, style, pieces);
                        }
                    }
                }
            }
        }
    }

    fn flow(&mut self, pieces: &[Piece<'_>], wrap: bool) {
        for piece in pieces {
            if piece.hard_break {
                self.start_line();
                self.finish_line();
                continue;
            }
            for token in tokenize(piece.text()) {
                match token {
                    Token::Newline if wrap => self.space(" ", piece),
                    Token::Newline => {
                        self.start_line();
                        self.finish_line();
                    }
                    Token::Space(text) => {
                        if wrap {
                            self.space(" ", piece);
                        } else {
                            self.place(text, piece.node, piece.style);
                        }
                    }
                    Token::Word(word) => self.word(word, piece, wrap),
                }
            }
        }
    }

    fn space(&mut self, text: &str, piece: &Piece<'_>) {
        if self.at_line_start() || self.last_space {
            return;
        }
        self.place(text, piece.node, piece.style);
        self.last_space = true;
    }

    fn word(&mut self, word: &str, piece: &Piece<'_>, wrap: bool) {
        self.last_space = false;
        if !wrap {
            self.place(word, piece.node, piece.style);
            return;
        }
        let width = word.width();
        if self.line_open && !self.at_line_start() && self.col + width > self.columns {
            self.finish_line();
        }
        self.start_line();
        let available = self.columns.saturating_sub(self.col).max(1);
        if width <= available {
            self.push_span(word, piece.node, piece.style);
            return;
        }
        // hard-split words longer than a whole row
        let mut chunk = String::new();
        let mut chunk_width = 0;
        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if chunk_width + ch_width > self.columns.saturating_sub(self.col).max(1) && !chunk.is_empty() {
                self.push_span(&chunk, piece.node, piece.style);
                self.finish_line();
                self.start_line();
                chunk.clear();
                chunk_width = 0;
            }
            chunk.push(ch);
            chunk_width += ch_width;
        }
        self.push_span(&chunk, piece.node, piece.style);
    }
}

fn cell_text(text: &str) -> String {
    text.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn layout(source: &str, columns: usize) -> (Document, Layout) {
        let doc = Document::from_markdown(source, None);
        let layout = Layout::compute(doc.dom(), doc.content(), columns);
        (doc, layout)
    }

    fn texts(layout: &Layout) -> Vec<String> {
        layout.lines().iter().map(LayoutLine::text).collect()
    }

    #[test]
    fn test_blocks_are_separated_by_blank_rows() {
        let (_, layout) = layout("# A\n\nbody\n\n## B\n", 40);
        assert_eq!(texts(&layout), vec!["A", "", "body", "", "B"]);
    }

    #[test]
    fn test_paragraph_wraps_at_word_boundaries() {
        let (_, layout) = layout("alpha beta gamma delta", 11);
        assert_eq!(texts(&layout), vec!["alpha beta ", "gamma delta"]);
    }

    #[test]
    fn test_code_block_keeps_lines_and_does_not_wrap() {
        let (_, layout) = layout("```\nlet a = 1;\n\nlet long_name_here = 2;\n```\n", 10);
        assert_eq!(
            texts(&layout),
            vec!["  let a = 1;", "  ", "  let long_name_here = 2;"]
        );
        assert!(layout.content_width() > 10.0 * CHAR_PX);
    }

    #[test]
    fn test_lists_get_markers() {
        let (_, layout) = layout("- one\n- two\n\n3. three\n4. four\n", 40);
        assert_eq!(
            texts(&layout),
            vec!["• one", "• two", "", "3. three", "4. four"]
        );
    }

    #[test]
    fn test_task_items_show_checkbox_state() {
        let (_, layout) = layout("- [x] done\n- [ ] todo\n", 40);
        assert_eq!(texts(&layout), vec!["• [x] done", "• [ ] todo"]);
    }

    #[test]
    fn test_blockquote_prefixes_every_row() {
        let (_, layout) = layout("> one two three four", 12);
        for line in texts(&layout) {
            assert!(line.starts_with("│ "), "row without quote bar: {line:?}");
        }
    }

    #[test]
    fn test_heading_rect_matches_its_row() {
        let (doc, layout) = layout("intro\n\n# Target\n", 40);
        let heading = doc.dom().element_by_id("target").unwrap();
        let rect = layout.rect(heading).unwrap();
        assert!((rect.top() - 2.0 * ROW_PX).abs() < f64::EPSILON);
    }

    #[test]
    fn test_node_at_finds_link_text() {
        let (doc, layout) = layout("see [here](#x) now", 40);
        let hit = layout.node_at(5.0 * CHAR_PX, 1.0).unwrap();
        let link = doc.dom().closest(hit, |el| el.tag() == "a");
        assert!(link.is_some(), "expected a link under column 5");
        assert_eq!(layout.node_at(0.0, 100.0 * ROW_PX), None);
    }

    #[test]
    fn test_table_rows_have_borders() {
        let (_, layout) = layout("| a | b |\n|---|---|\n| 1 | 22 |\n", 40);
        assert_eq!(
            texts(&layout),
            vec!["│ a │ b  │", "├───┼────┤", "│ 1 │ 22 │"]
        );
    }

    #[test]
    fn test_search_marks_are_styled() {
        let mut doc = Document::from_markdown("find me", None);
        let content = doc.content();
        let dom = doc.dom_mut();
        let text = dom.text_nodes(content)[0];
        let parent = dom.parent(text).unwrap();
        let mark = dom.create_element("mark");
        dom.add_class(mark, "search-match");
        let inner = dom.create_text("find me");
        dom.append_child(mark, inner);
        dom.replace_child(parent, mark, text);
        let layout = Layout::compute(doc.dom(), doc.content(), 40);
        let span = &layout.lines()[0].spans[0];
        assert!(span.style.search_match);
        assert!(!span.style.search_current);
    }
}
