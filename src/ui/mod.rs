//! Presentation of a rendered document.
//!
//! - [`page`]: Standalone HTML page with sidebar and table of contents
//! - [`tracker`]: Active table-of-contents entry
//! - [`viewport`]: Scroll position and heading visibility

pub mod page;
pub mod tracker;
pub mod viewport;

pub use page::Page;
pub use tracker::{ActiveSection, ActiveSectionTracker, IntersectionSource, VisibilityEvent};
pub use viewport::{ElementBox, RootMargin, ScrollViewport};
