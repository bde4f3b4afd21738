//! The viewer: composition root of the interaction layer.
//!
//! [`Viewer`] owns the rendered page, its layout and viewport, and the three
//! interaction components (vi keys, search, anchors). The host shell feeds it
//! content, keys, clicks and [`HostCommand`]s, and supplies platform actions
//! through [`HostServices`]. Appearance and zoom travel in an explicit
//! [`ViewerContext`] rather than living in the shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::anchor::{AnchorNavigator, ClickOutcome};
use crate::document::Document;
use crate::dom::NodeId;
use crate::input::KeyInput;
use crate::layout::{CHAR_PX, Layout, ROW_PX};
use crate::search::SearchEngine;
use crate::theme::{self, ThemeMode};
use crate::ui::viewport::{ScrollBehavior, ScrollPosition, Viewport};
use crate::vi::{KeyDisposition, ViNavigator};

pub const DEFAULT_ZOOM: f64 = 1.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;

/// Appearance and zoom shared by everything that draws the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerContext {
    pub appearance: ThemeMode,
    pub zoom: f64,
}

impl Default for ViewerContext {
    fn default() -> Self {
        Self {
            appearance: ThemeMode::System,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl ViewerContext {
    pub const fn with_appearance(appearance: ThemeMode) -> Self {
        Self {
            appearance,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(DEFAULT_ZOOM)
    }

    /// Clamp to the supported range, snapping to tenths so repeated steps do
    /// not drift.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }
}

/// Commands the shell can issue (menu items, shortcuts).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    OpenSearch,
    CloseSearch,
    HideSearch,
    NextMatch,
    PrevMatch,
    ApplyTheme(ThemeMode),
    CycleTheme,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Print,
}

/// Platform actions the viewer delegates to its host.
pub trait HostServices {
    /// Print the standalone page.
    fn print(&mut self, page_html: &str) -> Result<()>;

    /// Open a URL outside the viewer.
    fn open_external(&mut self, url: &str) -> Result<()>;

    /// Apply a new page zoom factor.
    fn set_page_zoom(&mut self, zoom: f64);
}

/// Visible area in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Surface {
    columns: u16,
    rows: u16,
}

/// The interactive page.
#[derive(Debug, Clone)]
pub struct Viewer {
    document: Document,
    layout: Layout,
    viewport: Viewport,
    vi: ViNavigator,
    search: SearchEngine,
    anchors: AnchorNavigator,
    context: ViewerContext,
    pending_scroll: Option<ScrollPosition>,
    surface: Surface,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerContext::default(), 80, 24)
    }
}

impl Viewer {
    /// Create an empty viewer for a `columns` x `rows` surface.
    pub fn new(context: ViewerContext, columns: u16, rows: u16) -> Self {
        let mut viewer = Self {
            document: Document::default(),
            layout: Layout::default(),
            viewport: Viewport::default(),
            vi: ViNavigator::new(),
            search: SearchEngine::new(),
            anchors: AnchorNavigator::new(),
            context,
            pending_scroll: None,
            surface: Surface { columns, rows },
        };
        theme::apply_theme(&mut viewer.document, context.appearance);
        viewer.relayout();
        viewer
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub const fn context(&self) -> ViewerContext {
        self.context
    }

    /// Whether an open search has at least one match.
    pub fn has_matches(&self) -> bool {
        self.search.has_matches()
    }

    /// Render new content: text, then base location, then theme.
    ///
    /// Always re-renders and drops search, key and highlight state.
    pub fn load_content(&mut self, markdown: &str, base_dir: Option<PathBuf>, theme: ThemeMode) {
        self.document = Document::from_markdown(markdown, base_dir);
        self.context.appearance = theme;
        theme::apply_theme(&mut self.document, theme);
        self.search.reset();
        self.vi.reset();
        self.anchors.reset();
        self.relayout();
        self.viewport.scroll_to(0.0, 0.0, ScrollBehavior::Instant, 0);
        info!(bytes = markdown.len(), theme = theme.as_str(), "content loaded");
    }

    /// Re-render changed content. Returns false (and does nothing) when the
    /// text is unchanged.
    ///
    /// With `preserve_scroll`, the current position is held until
    /// [`Viewer::on_load_finished`]. Only one position is held; a later
    /// reload replaces it.
    pub fn reload(&mut self, markdown: &str, preserve_scroll: bool) -> bool {
        if markdown == self.document.source() {
            return false;
        }
        if preserve_scroll {
            self.pending_scroll = Some(self.viewport.position());
        }
        let base_dir = self.document.base_dir().map(std::path::Path::to_path_buf);
        self.load_content(markdown, base_dir, self.context.appearance);
        debug!(preserve_scroll, "content reloaded");
        true
    }

    /// The page finished loading: restore a held scroll position once.
    pub fn on_load_finished(&mut self) {
        if let Some(position) = self.pending_scroll.take() {
            self.viewport
                .scroll_to(position.x, position.y, ScrollBehavior::Instant, 0);
            debug!(x = position.x, y = position.y, "scroll position restored");
        }
    }

    pub const fn pending_scroll(&self) -> Option<ScrollPosition> {
        self.pending_scroll
    }

    /// Apply a theme without re-rendering.
    pub fn apply_theme(&mut self, mode: ThemeMode) {
        self.context.appearance = mode;
        theme::apply_theme(&mut self.document, mode);
    }

    pub const fn scroll_position(&self) -> ScrollPosition {
        self.viewport.position()
    }

    /// Current scroll offsets as `{"x":..,"y":..}`.
    pub fn scroll_position_json(&self) -> Result<String> {
        serde_json::to_string(&self.viewport.position()).context("Failed to encode scroll position")
    }

    /// Scroll to offsets produced by [`Viewer::scroll_position_json`].
    pub fn restore_scroll_json(&mut self, json: &str) -> Result<()> {
        let position: ScrollPosition =
            serde_json::from_str(json).context("Invalid scroll position")?;
        self.viewport
            .scroll_to(position.x, position.y, ScrollBehavior::Instant, 0);
        Ok(())
    }

    /// Route a key press. Returns true when the default action is suppressed.
    pub fn handle_key(&mut self, key: &KeyInput, now_ms: u64) -> bool {
        if self.search.input_focused() {
            let outcome = self.search.handle_input_key(&mut self.document, key);
            if let crate::search::SearchKey::Handled { reveal } = outcome {
                self.after_search(reveal, now_ms);
            }
            return outcome.prevents_default();
        }

        let vi = self.vi.handle_key(key, now_ms);
        if let KeyDisposition::Action(action) = vi {
            action.apply(&mut self.viewport, now_ms);
        }
        let search = self.search.handle_global_key(&mut self.document, key);
        if let crate::search::SearchKey::Handled { reveal } = search {
            self.after_search(reveal, now_ms);
        }
        vi.prevents_default() || search.prevents_default()
    }

    /// Wheel scrolling, in pixels.
    pub fn scroll_by(&mut self, dx: f64, dy: f64, now_ms: u64) {
        self.viewport
            .scroll_by(dx, dy, ScrollBehavior::Smooth, now_ms);
    }

    /// Route a primary click at viewport-relative pixel coordinates.
    pub fn handle_click(&mut self, x: f64, y: f64, now_ms: u64) -> ClickOutcome {
        let content_x = x + self.viewport.scroll_x();
        let content_y = y + self.viewport.scroll_y();
        let Some(node) = self.layout.node_at(content_x, content_y) else {
            return ClickOutcome::NotALink;
        };
        let outcome = self.anchors.handle_click(
            &mut self.document,
            &self.layout,
            &mut self.viewport,
            node,
            now_ms,
        );
        if outcome.prevents_default() {
            self.relayout();
        }
        outcome
    }

    /// Click on a terminal cell relative to the document area.
    pub fn handle_click_cell(&mut self, column: u16, row: u16, now_ms: u64) -> ClickOutcome {
        let x = f64::from(column) * CHAR_PX;
        let y = f64::from(row) * ROW_PX;
        self.handle_click(x, y, now_ms)
    }

    /// Run a shell command.
    pub fn execute(
        &mut self,
        command: HostCommand,
        services: &mut dyn HostServices,
        now_ms: u64,
    ) -> Result<()> {
        debug!(?command, "host command");
        match command {
            HostCommand::OpenSearch => self.search.open(&mut self.document),
            HostCommand::CloseSearch => {
                self.search.close(&mut self.document);
                self.relayout();
            }
            HostCommand::HideSearch => self.search.hide(&mut self.document),
            HostCommand::NextMatch => {
                let reveal = self.search.next(&mut self.document);
                self.after_search(reveal, now_ms);
            }
            HostCommand::PrevMatch => {
                let reveal = self.search.prev(&mut self.document);
                self.after_search(reveal, now_ms);
            }
            HostCommand::ApplyTheme(mode) => self.apply_theme(mode),
            HostCommand::CycleTheme => self.apply_theme(self.context.appearance.next()),
            HostCommand::ZoomIn => {
                let zoom = self.context.zoom_in();
                self.apply_zoom(zoom, services);
            }
            HostCommand::ZoomOut => {
                let zoom = self.context.zoom_out();
                self.apply_zoom(zoom, services);
            }
            HostCommand::ZoomReset => {
                let zoom = self.context.reset_zoom();
                self.apply_zoom(zoom, services);
            }
            HostCommand::Print => services.print(&self.document.page_html())?,
        }
        Ok(())
    }

    fn apply_zoom(&mut self, zoom: f64, services: &mut dyn HostServices) {
        services.set_page_zoom(zoom);
        self.relayout();
    }

    fn after_search(&mut self, reveal: Option<NodeId>, now_ms: u64) {
        self.relayout();
        if let Some(node) = reveal {
            self.reveal(node, now_ms);
        }
    }

    /// Smoothly scroll `node` to the vertical centre of the viewport.
    pub fn reveal(&mut self, node: NodeId, now_ms: u64) {
        let Some(rect) = self.layout.rect(node) else {
            return;
        };
        let y = rect.top() + rect.height / 2.0 - self.viewport.height() / 2.0;
        let x = if rect.x < self.viewport.scroll_x()
            || rect.x + rect.width > self.viewport.scroll_x() + self.viewport.width()
        {
            rect.x
        } else {
            self.viewport.scroll_x()
        };
        self.viewport.scroll_to(x, y, ScrollBehavior::Smooth, now_ms);
    }

    /// Advance animations. Returns true while something is still moving.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let scrolling = self.viewport.tick(now_ms);
        let had_highlight = self.anchors.highlighted().is_some();
        let fading = self.anchors.tick(&mut self.document, now_ms);
        if had_highlight && !fading {
            self.relayout();
        }
        scrolling || fading
    }

    /// Whether a scroll or highlight still needs [`Viewer::tick`].
    pub fn is_animating(&self) -> bool {
        self.viewport.is_animating() || self.anchors.highlighted().is_some()
    }

    /// Anchor highlight intensity for drawing.
    pub fn highlight_intensity(&self, now_ms: u64) -> f64 {
        self.anchors.intensity(now_ms)
    }

    /// Change the visible surface size in cells.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.surface = Surface { columns, rows };
        self.relayout();
    }

    /// Wrap width after zoom.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn layout_columns(&self) -> usize {
        (f64::from(self.surface.columns) / self.context.zoom).floor() as usize
    }

    fn relayout(&mut self) {
        let columns = self.layout_columns();
        self.layout = Layout::compute(self.document.dom(), self.document.content(), columns);
        #[allow(clippy::cast_precision_loss)]
        let width = columns as f64 * CHAR_PX;
        let height = f64::from(self.surface.rows) * ROW_PX;
        self.viewport.resize(width, height);
        self.viewport
            .set_content_size(self.layout.content_width(), self.layout.content_height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use crate::search::{MATCH_CLASS, SearchState};

    #[derive(Default)]
    struct RecordingHost {
        printed: Vec<String>,
        opened: Vec<String>,
        zooms: Vec<f64>,
    }

    impl HostServices for RecordingHost {
        fn print(&mut self, page_html: &str) -> Result<()> {
            self.printed.push(page_html.to_string());
            Ok(())
        }

        fn open_external(&mut self, url: &str) -> Result<()> {
            self.opened.push(url.to_string());
            Ok(())
        }

        fn set_page_zoom(&mut self, zoom: f64) {
            self.zooms.push(zoom);
        }
    }

    fn long_document(paragraphs: usize) -> String {
        (0..paragraphs).map(|i| format!("line {i}\n\n")).collect()
    }

    fn viewer(source: &str) -> Viewer {
        let mut viewer = Viewer::new(ViewerContext::default(), 80, 20);
        viewer.load_content(source, None, ThemeMode::Light);
        viewer
    }

    #[test]
    fn test_load_applies_theme_after_render() {
        let viewer = viewer("# Hi");
        let doc = viewer.document();
        assert!(doc.dom().has_class(doc.html(), "theme-light"));
        assert_eq!(viewer.context().appearance, ThemeMode::Light);
    }

    #[test]
    fn test_reload_with_same_text_is_noop() {
        let mut viewer = viewer("same");
        let before = viewer.document().content();
        assert!(!viewer.reload("same", true));
        assert_eq!(viewer.pending_scroll(), None);
        assert_eq!(viewer.document().content(), before);
    }

    #[test]
    fn test_reload_restores_scroll_once() {
        let source = long_document(100);
        let mut viewer = viewer(&source);
        viewer.restore_scroll_json(r#"{"x":0,"y":300}"#).unwrap();
        assert!(viewer.reload(&format!("{source}tail\n"), true));
        assert!(viewer.scroll_position().y.abs() < f64::EPSILON);
        viewer.on_load_finished();
        assert!((viewer.scroll_position().y - 300.0).abs() < f64::EPSILON);

        viewer.restore_scroll_json(r#"{"x":0,"y":0}"#).unwrap();
        viewer.on_load_finished();
        assert!(viewer.scroll_position().y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_later_reload_overwrites_pending_scroll() {
        let source = long_document(100);
        let mut viewer = viewer(&source);
        viewer.restore_scroll_json(r#"{"x":0,"y":300}"#).unwrap();
        viewer.reload(&format!("{source}a\n"), true);
        viewer.restore_scroll_json(r#"{"x":0,"y":120}"#).unwrap();
        viewer.reload(&format!("{source}b\n"), true);
        assert_eq!(
            viewer.pending_scroll(),
            Some(ScrollPosition { x: 0.0, y: 120.0 })
        );
    }

    #[test]
    fn test_reload_drops_search_highlights() {
        let mut viewer = viewer("needle in a haystack");
        viewer.handle_key(&KeyInput::char('/'), 0);
        for c in "needle".chars() {
            viewer.handle_key(&KeyInput::char(c), 0);
        }
        assert!(viewer.has_matches());
        viewer.reload("another needle", false);
        let doc = viewer.document();
        assert!(doc.dom().elements_with_class(doc.content(), MATCH_CLASS).is_empty());
        assert!(!viewer.has_matches());
        assert_eq!(viewer.search().state(), SearchState::Closed);
    }

    #[test]
    fn test_search_input_disables_vi_keys() {
        let mut viewer = viewer(&long_document(100));
        viewer.handle_key(&KeyInput::char('/'), 0);
        viewer.handle_key(&KeyInput::char('j'), 0);
        assert!(viewer.scroll_position().y.abs() < f64::EPSILON);
        assert_eq!(viewer.search().query(), "j");

        viewer.handle_key(&KeyInput::plain(Key::Escape), 0);
        viewer.handle_key(&KeyInput::char('j'), 0);
        assert!((viewer.scroll_position().y - crate::vi::LINE_PX).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_centres_current_match() {
        let mut source = long_document(60);
        source.push_str("the needle\n");
        let mut viewer = viewer(&source);
        viewer.handle_key(&KeyInput::char('/'), 0);
        for c in "needle".chars() {
            viewer.handle_key(&KeyInput::char(c), 0);
        }
        let node = viewer.search().current_match().unwrap();
        let rect = viewer.layout().rect(node).unwrap();
        let viewport = viewer.viewport();
        let expected = (rect.top() + rect.height / 2.0 - viewport.height() / 2.0)
            .clamp(0.0, viewport.max_scroll_y());
        assert!((viewport.scroll_y() - expected).abs() < f64::EPSILON);
        assert_eq!(viewport.last_behavior(), Some(ScrollBehavior::Smooth));
    }

    #[test]
    fn test_gg_and_g_jump() {
        let mut viewer = viewer(&long_document(100));
        assert!(viewer.handle_key(&KeyInput::char('G').with_shift(), 0));
        assert!((viewer.scroll_position().y - viewer.viewport().max_scroll_y()).abs() < f64::EPSILON);
        assert!(viewer.handle_key(&KeyInput::char('g'), 100));
        assert!(viewer.scroll_position().y > 0.0);
        viewer.handle_key(&KeyInput::char('g'), 200);
        assert!(viewer.scroll_position().y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_unbound_key_is_not_consumed() {
        let mut viewer = viewer("x");
        assert!(!viewer.handle_key(&KeyInput::char('z'), 0));
        assert!(!viewer.handle_key(&KeyInput::char('n'), 0));
    }

    #[test]
    fn test_click_on_fragment_link_navigates() {
        let source = format!("[jump](#end)\n\n{}# End\n", long_document(30));
        let mut viewer = viewer(&source);
        let outcome = viewer.handle_click_cell(1, 0, 0);
        assert!(outcome.prevents_default(), "got {outcome:?}");
        assert!(viewer.scroll_position().y > 0.0);
        assert!(viewer.highlight_intensity(0) > 0.0);
    }

    #[test]
    fn test_commands() {
        let mut viewer = viewer("x x");
        let mut host = RecordingHost::default();
        viewer.execute(HostCommand::OpenSearch, &mut host, 0).unwrap();
        assert_eq!(viewer.search().state(), SearchState::Open);
        viewer.handle_key(&KeyInput::char('x'), 0);
        viewer.execute(HostCommand::NextMatch, &mut host, 0).unwrap();
        assert_eq!(viewer.search().current_index(), Some(1));
        viewer.execute(HostCommand::CloseSearch, &mut host, 0).unwrap();
        assert!(!viewer.has_matches());

        viewer.execute(HostCommand::CycleTheme, &mut host, 0).unwrap();
        assert_eq!(viewer.context().appearance, ThemeMode::Dark);

        viewer.execute(HostCommand::Print, &mut host, 0).unwrap();
        assert_eq!(host.printed.len(), 1);
        assert!(host.printed[0].contains("theme-dark"));
    }

    #[test]
    fn test_zoom_is_clamped_and_reflows() {
        let mut viewer = viewer("x");
        let mut host = RecordingHost::default();
        for _ in 0..30 {
            viewer.execute(HostCommand::ZoomIn, &mut host, 0).unwrap();
        }
        assert!((viewer.context().zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert_eq!(viewer.layout_columns(), 26);
        viewer.execute(HostCommand::ZoomReset, &mut host, 0).unwrap();
        for _ in 0..30 {
            viewer.execute(HostCommand::ZoomOut, &mut host, 0).unwrap();
        }
        assert!((viewer.context().zoom - MIN_ZOOM).abs() < f64::EPSILON);
        assert_eq!(host.zooms.first().copied(), Some(1.1));
        assert!(host.opened.is_empty());
    }

    #[test]
    fn test_scroll_position_json_round_trip() {
        let mut viewer = viewer(&long_document(100));
        viewer.restore_scroll_json(r#"{"x":0,"y":80}"#).unwrap();
        assert_eq!(viewer.scroll_position_json().unwrap(), r#"{"x":0.0,"y":80.0}"#);
        assert!(viewer.restore_scroll_json("not json").is_err());
    }
}
