//! Scroll position and heading visibility for a rendered document.
//!
//! [`ScrollViewport`] is the in-process intersection source: it knows where
//! each heading box sits in the laid-out document, tracks the scroll offset,
//! and reports which observed headings cross into the tracked band as the
//! offset changes. Units are CSS pixels.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use super::tracker::{IntersectionSource, VisibilityEvent};

/// One side of a root margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    Px(i64),
    Percent(i64),
}

impl Margin {
    /// Resolve against the viewport height.
    pub const fn resolve(self, height: i64) -> i64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => height * pct / 100,
        }
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(0) => write!(f, "0px"),
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Vertical margins applied to the viewport before testing intersection.
///
/// Negative values shrink the band. The default keeps the top 80px clear and
/// drops the bottom 80%, so "active" means near the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootMargin {
    pub top: Margin,
    pub bottom: Margin,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Margin::Px(-80),
            bottom: Margin::Percent(-80),
        }
    }
}

impl fmt::Display for RootMargin {
    /// CSS `rootMargin` syntax: top, right, bottom, left.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0px {} 0px", self.top, self.bottom)
    }
}

/// Position of a heading element in the laid-out document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBox {
    pub id: String,
    pub top: i64,
    pub height: i64,
}

impl ElementBox {
    pub fn new(id: impl Into<String>, top: i64, height: i64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }
}

/// A scrollable document with known heading positions.
///
/// # Example
///
/// ```
/// use docview::ui::viewport::{ElementBox, ScrollViewport};
///
/// let mut vp = ScrollViewport::new(1000, 3000);
/// vp.set_layout(vec![ElementBox::new("intro", 100, 40)]);
/// assert_eq!(vp.band(), 80..200);
/// assert!(vp.is_in_band("intro"));
///
/// vp.scroll_to(500);
/// assert!(!vp.is_in_band("intro"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScrollViewport {
    height: i64,
    total_height: i64,
    offset: i64,
    margin: RootMargin,
    elements: Vec<ElementBox>,
    observed: HashMap<String, bool>,
    pending: Vec<VisibilityEvent>,
}

impl ScrollViewport {
    /// Create a viewport `height` pixels tall over a document `total_height` tall.
    pub fn new(height: i64, total_height: i64) -> Self {
        Self {
            height: height.max(0),
            total_height: total_height.max(0),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_root_margin(mut self, margin: RootMargin) -> Self {
        self.margin = margin;
        self
    }

    pub const fn root_margin(&self) -> RootMargin {
        self.margin
    }

    /// Get the current scroll offset.
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    pub const fn height(&self) -> i64 {
        self.height
    }

    /// Replace the heading layout, e.g. after a new document renders.
    pub fn set_layout(&mut self, elements: Vec<ElementBox>) {
        self.elements = elements;
        self.total_height = self
            .elements
            .iter()
            .map(|e| e.top + e.height)
            .max()
            .unwrap_or(0)
            .max(self.total_height);
        self.offset = self.offset.min(self.max_offset());
        self.refresh();
    }

    /// Top of an element, for scroll-to-anchor.
    pub fn element_top(&self, id: &str) -> Option<i64> {
        self.element(id).map(|e| e.top)
    }

    /// The tracked band in document coordinates.
    pub fn band(&self) -> Range<i64> {
        let top = self.offset - self.margin.top.resolve(self.height);
        let bottom = self.offset + self.height + self.margin.bottom.resolve(self.height);
        top..bottom.max(top)
    }

    /// Whether an element currently intersects the band.
    pub fn is_in_band(&self, id: &str) -> bool {
        self.element(id).is_some_and(|e| self.intersects(e))
    }

    /// Scroll so that `offset` is at the top, clamped to the document.
    pub fn scroll_to(&mut self, offset: i64) {
        self.offset = offset.clamp(0, self.max_offset());
        self.refresh();
    }

    /// Scroll so the element sits just below the top margin.
    pub fn scroll_to_element(&mut self, id: &str) -> bool {
        let Some(top) = self.element_top(id) else {
            return false;
        };
        self.scroll_to(top + self.margin.top.resolve(self.height));
        true
    }

    fn max_offset(&self) -> i64 {
        (self.total_height - self.height).max(0)
    }

    fn element(&self, id: &str) -> Option<&ElementBox> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn intersects(&self, element: &ElementBox) -> bool {
        let band = self.band();
        element.top < band.end && element.top + element.height > band.start
    }

    /// Queue events for observed elements whose visibility changed.
    fn refresh(&mut self) {
        for element in &self.elements {
            let now = self.intersects(element);
            if let Some(was) = self.observed.get_mut(&element.id)
                && *was != now
            {
                *was = now;
                self.pending.push(VisibilityEvent {
                    id: element.id.clone(),
                    intersecting: now,
                });
            }
        }
    }
}

impl IntersectionSource for ScrollViewport {
    /// Start observing; every known element reports its initial state.
    fn observe(&mut self, ids: &[String]) {
        for id in ids {
            let Some(element) = self.element(id) else {
                continue;
            };
            let intersecting = self.intersects(element);
            self.observed.insert(id.clone(), intersecting);
            self.pending.push(VisibilityEvent {
                id: id.clone(),
                intersecting,
            });
        }
    }

    fn take_events(&mut self) -> Vec<VisibilityEvent> {
        std::mem::take(&mut self.pending)
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.pending.clear();
    }

    fn is_observing(&self) -> bool {
        !self.observed.is_empty()
    }
}
