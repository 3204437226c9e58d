//! Markdown document structure and rendering.
//!
//! This module handles:
//! - Scanning headings into a table of contents with stable anchor ids
//! - Rendering markdown to HTML with comrak, tagging headings with those ids
//!   and resolving every link

mod render;
mod toc;
mod types;

pub use render::{PLAIN_LANGUAGE, RenderContext, RenderError, escape_html, open_link_tag, render_markdown};
pub use toc::{Slugger, extract_toc, scan_headings, slugify, strip_inline_markup};
pub use types::{CodeBlock, HeadingAnchor, RenderedDocument, TocEntry};
