// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. links::LinkResolver)
    clippy::module_name_repetitions
)]

//! # docview
//!
//! A documentation viewer for markdown kept in a source repository.
//!
//! docview fetches markdown from a repository's raw content host and renders
//! it with:
//! - A table of contents with stable, collision-free heading anchors
//! - Links to sibling documents that switch pages without a reload
//! - Relative links and images pointed back at the repository
//! - Syntax-highlighted code blocks with copy buttons
//! - An active-section indicator that follows scrolling
//!
//! ## Architecture
//!
//! docview uses The Elm Architecture (TEA) pattern:
//! - **Model**: Selected document, rendered content, history
//! - **Message**: Selections, finished loads, link clicks, scrolling
//! - **Update**: Pure state transitions
//! - **View**: A standalone HTML page
//!
//! ## Modules
//!
//! - [`app`]: Selection state and the viewer driving it
//! - [`document`]: Heading extraction and markdown rendering
//! - [`fetch`]: Remote retrieval with a revalidation window
//! - [`links`]: Link classification and rewriting
//! - [`site`]: Document registry and repository locations
//! - [`location`]: Address bar and history
//! - [`ui`]: Page template and active-section tracking
//! - [`highlight`]: Syntax highlighting
//! - [`config`]: Saved command-line defaults

pub mod app;
pub mod config;
pub mod document;
pub mod fetch;
pub mod highlight;
pub mod links;
pub mod location;
pub mod site;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{Message, Model, Viewer};
    pub use crate::document::{RenderedDocument, TocEntry, extract_toc, render_markdown};
    pub use crate::fetch::{Fetcher, HttpTransport, Transport};
    pub use crate::links::{LinkKind, LinkResolver, ResolvedLink};
    pub use crate::site::Site;
    pub use crate::ui::{ActiveSection, ActiveSectionTracker};
}
