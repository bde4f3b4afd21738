//! Viewport management for scrolling.
//!
//! The [`Viewport`] tracks the visible window onto the laid-out document in
//! logical pixels and handles all scroll operations. Smooth scrolls move the
//! logical position immediately and animate only what is displayed.

use serde::{Deserialize, Serialize};

/// Duration of a smooth scroll animation.
pub const SMOOTH_SCROLL_MS: u64 = 300;

/// How a scroll request moves the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

/// Scroll offsets, serialized as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: ScrollPosition,
    started_ms: u64,
}

/// Manages the visible portion of a document.
///
/// The viewport tracks:
/// - Visible size (width, height)
/// - Scrollable content size
/// - Current scroll offsets and any running smooth-scroll animation
///
/// # Example
///
/// ```
/// use marksight::ui::viewport::{ScrollBehavior, Viewport};
///
/// let mut vp = Viewport::new(640.0, 480.0);
/// vp.set_content_size(640.0, 2000.0);
/// vp.scroll_by(0.0, 100.0, ScrollBehavior::Instant, 0);
/// assert_eq!(vp.scroll_y(), 100.0);
///
/// vp.scroll_to(0.0, 10_000.0, ScrollBehavior::Instant, 0);
/// assert_eq!(vp.scroll_y(), 1520.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    content_width: f64,
    content_height: f64,
    position: ScrollPosition,
    animation: Option<Animation>,
    last_behavior: Option<ScrollBehavior>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Viewport {
    /// Create a viewport of the given visible size with no content.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content_width: 0.0,
            content_height: 0.0,
            position: ScrollPosition { x: 0.0, y: 0.0 },
            animation: None,
            last_behavior: None,
        }
    }

    /// Visible width.
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Visible height (`innerHeight`).
    pub const fn height(&self) -> f64 {
        self.height
    }

    pub const fn content_width(&self) -> f64 {
        self.content_width
    }

    pub const fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Logical horizontal offset (`scrollX`).
    pub const fn scroll_x(&self) -> f64 {
        self.position.x
    }

    /// Logical vertical offset (`scrollY`).
    pub const fn scroll_y(&self) -> f64 {
        self.position.y
    }

    pub const fn position(&self) -> ScrollPosition {
        self.position
    }

    /// Behaviour of the most recent scroll request.
    pub const fn last_behavior(&self) -> Option<ScrollBehavior> {
        self.last_behavior
    }

    pub fn max_scroll_x(&self) -> f64 {
        (self.content_width - self.width).max(0.0)
    }

    pub fn max_scroll_y(&self) -> f64 {
        (self.content_height - self.height).max(0.0)
    }

    /// Check if we can scroll up.
    pub fn can_scroll_up(&self) -> bool {
        self.position.y > 0.0
    }

    /// Check if we can scroll down.
    pub fn can_scroll_down(&self) -> bool {
        self.position.y < self.max_scroll_y()
    }

    /// Get the scroll percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        let max = self.max_scroll_y();
        if max <= 0.0 {
            return 100;
        }
        // Percentage value always 0-100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            ((self.position.y / max) * 100.0).round().clamp(0.0, 100.0) as u8
        }
    }

    /// Scroll to an absolute position, clamped to the content.
    pub fn scroll_to(&mut self, x: f64, y: f64, behavior: ScrollBehavior, now_ms: u64) {
        let target = ScrollPosition {
            x: clamp(x, self.max_scroll_x()),
            y: clamp(y, self.max_scroll_y()),
        };
        self.animation = match behavior {
            ScrollBehavior::Smooth if target != self.position => Some(Animation {
                from: self.displayed(now_ms),
                started_ms: now_ms,
            }),
            ScrollBehavior::Smooth => self.animation,
            ScrollBehavior::Instant => None,
        };
        self.position = target;
        self.last_behavior = Some(behavior);
    }

    /// Scroll relative to the current logical position.
    pub fn scroll_by(&mut self, dx: f64, dy: f64, behavior: ScrollBehavior, now_ms: u64) {
        self.scroll_to(
            self.position.x + dx,
            self.position.y + dy,
            behavior,
            now_ms,
        );
    }

    /// Position to draw at `now_ms`, interpolating a running animation.
    pub fn displayed(&self, now_ms: u64) -> ScrollPosition {
        let Some(animation) = self.animation else {
            return self.position;
        };
        let elapsed = now_ms.saturating_sub(animation.started_ms);
        if elapsed >= SMOOTH_SCROLL_MS {
            return self.position;
        }
        #[allow(clippy::cast_precision_loss)]
        let t = elapsed as f64 / SMOOTH_SCROLL_MS as f64;
        let eased = 1.0 - (1.0 - t).powi(3);
        ScrollPosition {
            x: animation.from.x + (self.position.x - animation.from.x) * eased,
            y: animation.from.y + (self.position.y - animation.from.y) * eased,
        }
    }

    /// Drop a finished animation. Returns true while one is still running.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if let Some(animation) = self.animation
            && now_ms.saturating_sub(animation.started_ms) >= SMOOTH_SCROLL_MS
        {
            self.animation = None;
        }
        self.animation.is_some()
    }

    pub const fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Resize the visible area, keeping the offset valid.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.clamp_position();
    }

    /// Update the scrollable size (e.g. after a re-layout).
    pub fn set_content_size(&mut self, width: f64, height: f64) {
        self.content_width = width;
        self.content_height = height;
        self.clamp_position();
    }

    fn clamp_position(&mut self) {
        self.position.x = clamp(self.position.x, self.max_scroll_x());
        self.position.y = clamp(self.position.y, self.max_scroll_y());
    }
}

fn clamp(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
