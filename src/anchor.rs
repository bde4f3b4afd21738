//! In-page anchor navigation.
//!
//! Clicking a link whose `href` starts with `#` scrolls to the element with
//! that id, leaving a small margin above it, and flashes a fading highlight
//! on the target. Long jumps are instant; short ones are smooth.

use tracing::debug;

use crate::document::Document;
use crate::dom::NodeId;
use crate::layout::Layout;
use crate::ui::viewport::{ScrollBehavior, Viewport};

/// Class that triggers the highlight animation.
pub const HIGHLIGHT_CLASS: &str = "anchor-highlight";
/// Length of the highlight fade.
pub const HIGHLIGHT_MS: u64 = 1500;
/// Gap left between the viewport top and the target.
pub const SCROLL_MARGIN_PX: f64 = 16.0;

/// Smooth for targets within two viewport heights, instant beyond.
///
/// # Example
///
/// ```
/// use marksight::anchor::choose_behavior;
/// use marksight::ui::viewport::ScrollBehavior;
///
/// assert_eq!(choose_behavior(3000.0, 800.0), ScrollBehavior::Instant);
/// assert_eq!(choose_behavior(400.0, 800.0), ScrollBehavior::Smooth);
/// ```
pub fn choose_behavior(distance: f64, viewport_height: f64) -> ScrollBehavior {
    if distance > viewport_height * 2.0 {
        ScrollBehavior::Instant
    } else {
        ScrollBehavior::Smooth
    }
}

/// Scroll offset that puts an element `relative_top` below the viewport top
/// just under the margin.
pub fn scroll_target(scroll_y: f64, relative_top: f64) -> f64 {
    (scroll_y + relative_top - SCROLL_MARGIN_PX).max(0.0)
}

/// What a click resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Not inside any link.
    NotALink,
    /// A link that does not point into this page.
    External(String),
    /// A fragment link with an empty or unknown id. The default action is
    /// left alone.
    Unresolved,
    /// Scrolled to `target`.
    Navigated {
        target: NodeId,
        behavior: ScrollBehavior,
        top: f64,
    },
}

impl ClickOutcome {
    /// Only successful in-page navigation suppresses the default action.
    pub const fn prevents_default(&self) -> bool {
        matches!(self, Self::Navigated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Highlight {
    target: NodeId,
    started_ms: u64,
}

/// Tracks the anchor highlight between clicks.
#[derive(Debug, Clone, Default)]
pub struct AnchorNavigator {
    active: Option<Highlight>,
}

impl AnchorNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a primary click on `node`.
    pub fn handle_click(
        &mut self,
        doc: &mut Document,
        layout: &Layout,
        viewport: &mut Viewport,
        node: NodeId,
        now_ms: u64,
    ) -> ClickOutcome {
        let dom = doc.dom();
        let fragment_link = dom.closest(node, |el| {
            el.tag() == "a" && el.attr("href").is_some_and(|href| href.starts_with('#'))
        });
        let Some(link) = fragment_link else {
            let external = dom
                .closest(node, |el| el.tag() == "a" && el.attr("href").is_some())
                .and_then(|link| dom.attr(link, "href"));
            return match external {
                Some(href) if !href.is_empty() => ClickOutcome::External(href.to_string()),
                _ => ClickOutcome::NotALink,
            };
        };

        let id = dom
            .attr(link, "href")
            .and_then(|href| href.strip_prefix('#'))
            .map(ToString::to_string)
            .unwrap_or_default();
        if id.is_empty() {
            return ClickOutcome::Unresolved;
        }
        let Some(target) = dom.element_by_id(&id) else {
            debug!(id = %id, "anchor target not found");
            return ClickOutcome::Unresolved;
        };

        let scroll_y = viewport.scroll_y();
        let element_top = layout.rect(target).map_or(scroll_y, |rect| rect.top());
        let relative_top = element_top - scroll_y;
        let behavior = choose_behavior(relative_top.abs(), viewport.height());
        let top = scroll_target(scroll_y, relative_top);
        viewport.scroll_to(viewport.scroll_x(), top, behavior, now_ms);

        self.restart_highlight(doc, target, now_ms);
        debug!(id = %id, top, ?behavior, "anchor navigation");
        ClickOutcome::Navigated {
            target,
            behavior,
            top,
        }
    }

    fn restart_highlight(&mut self, doc: &mut Document, target: NodeId, now_ms: u64) {
        let dom = doc.dom_mut();
        if let Some(previous) = self.active
            && previous.target != target
        {
            dom.remove_class(previous.target, HIGHLIGHT_CLASS);
        }
        dom.remove_class(target, HIGHLIGHT_CLASS);
        dom.force_reflow();
        dom.add_class(target, HIGHLIGHT_CLASS);
        self.active = Some(Highlight {
            target,
            started_ms: now_ms,
        });
    }

    /// Element currently flashing, if any.
    pub fn highlighted(&self) -> Option<NodeId> {
        self.active.map(|h| h.target)
    }

    /// Highlight intensity at `now_ms`: 1.0 when it starts, easing out to 0.0
    /// after [`HIGHLIGHT_MS`].
    pub fn intensity(&self, now_ms: u64) -> f64 {
        let Some(active) = self.active else {
            return 0.0;
        };
        let elapsed = now_ms.saturating_sub(active.started_ms);
        if elapsed >= HIGHLIGHT_MS {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let t = elapsed as f64 / HIGHLIGHT_MS as f64;
        (1.0 - t).powi(3)
    }

    /// Retire a finished highlight. Returns true while one is fading.
    pub fn tick(&mut self, doc: &mut Document, now_ms: u64) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        if now_ms.saturating_sub(active.started_ms) < HIGHLIGHT_MS {
            return true;
        }
        doc.dom_mut().remove_class(active.target, HIGHLIGHT_CLASS);
        self.active = None;
        false
    }

    /// Forget any highlight (the page was replaced).
    pub fn reset(&mut self) {
        self.active = None;
    }
}
