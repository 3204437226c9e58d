//! Markdown to HTML with comrak.
//!
//! comrak does all block and inline parsing. This module layers three things
//! on top of its output:
//!
//! - heading elements get the ids computed by [`scan_headings`], matched by
//!   source line, so TOC links and in-page anchors always land
//! - every link is resolved and emitted with the affordance for its kind
//! - code blocks are wrapped with a language label and a copy button

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use comrak::adapters::{HeadingAdapter, HeadingMeta};
use comrak::arena_tree::Node;
use comrak::nodes::{Ast, AstNode, NodeHtmlBlock, NodeValue, Sourcepos};
use comrak::{Arena, Options, Plugins, format_html_with_plugins, parse_document};
use thiserror::Error;

use super::toc::scan_headings;
use super::types::{CodeBlock, HeadingAnchor, RenderedDocument};
use crate::links::{LinkContext, LinkKind, LinkResolver, ResolvedLink, repository_url};
use crate::site::{DocumentDescriptor, Site};

/// Language label used for code blocks without an info string.
pub const PLAIN_LANGUAGE: &str = "text";

/// Rendering failed while writing HTML.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write html: {0}")]
    Io(#[from] io::Error),
    #[error("renderer produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Everything the renderer needs to know about the current document.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub resolver: &'a LinkResolver,
    pub link_context: LinkContext,
    /// Raw content base of the repository root, for relative images
    pub raw_base: &'a str,
    pub docs_dir: &'a str,
    /// Apply syntax highlighting to code blocks
    pub highlight: bool,
    /// Give headings anchor ids and build a table of contents
    pub anchor_headings: bool,
}

impl<'a> RenderContext<'a> {
    pub fn for_document(
        site: &'a Site,
        resolver: &'a LinkResolver,
        doc: &DocumentDescriptor,
    ) -> Self {
        Self {
            resolver,
            link_context: Site::link_context(doc),
            raw_base: site.raw_base.as_str(),
            docs_dir: site.docs_dir.as_str(),
            highlight: true,
            anchor_headings: true,
        }
    }

    #[must_use]
    pub const fn with_highlight(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    /// Render headings as plain elements with no ids and no table of contents.
    #[must_use]
    pub const fn without_anchors(mut self) -> Self {
        self.anchor_headings = false;
        self
    }
}

/// Render markdown into an HTML fragment plus its table of contents.
///
/// # Errors
/// Returns an error only if comrak fails to write its output.
pub fn render_markdown(
    markdown: &str,
    ctx: &RenderContext<'_>,
) -> Result<RenderedDocument, RenderError> {
    let anchors = if ctx.anchor_headings {
        scan_headings(markdown)
    } else {
        Vec::new()
    };
    let toc = anchors
        .iter()
        .filter(|a| a.in_toc())
        .map(HeadingAnchor::to_toc_entry)
        .collect();

    let arena = Arena::new();
    let options = renderer_options();
    let root = parse_document(&arena, markdown, &options);

    let heading_ids = assign_heading_ids(root, &anchors);
    rewrite_links(&arena, root, ctx);
    rewrite_images(root, ctx);
    let code_blocks = replace_code_blocks(root, ctx.highlight);

    let adapter = AnchoredHeadings::new(heading_ids.clone());
    let mut plugins = Plugins::default();
    plugins.render.heading_adapter = Some(&adapter);

    let mut out = Vec::new();
    format_html_with_plugins(root, &options, &mut out, &plugins)?;

    Ok(RenderedDocument {
        html: String::from_utf8(out)?,
        toc,
        heading_ids: heading_ids.into_iter().flatten().collect(),
        code_blocks,
        title: RenderedDocument::title_from(&anchors).map(str::to_string),
    })
}

fn renderer_options() -> Options {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.shortcodes = true;

    // Raw HTML passes through; links are emitted as inline HTML too.
    options.render.unsafe_ = true;

    options
}

/// Pair each parsed heading with the scanned anchor on the same line.
///
/// Headings the scanner did not see (setext, indented, nested in quotes or
/// lists) get no id rather than one the table of contents does not know.
fn assign_heading_ids<'a>(root: &'a AstNode<'a>, anchors: &[HeadingAnchor]) -> Vec<Option<String>> {
    let by_line: HashMap<usize, &HeadingAnchor> = anchors.iter().map(|a| (a.line, a)).collect();

    root.descendants()
        .filter_map(|node| {
            let ast = node.data.borrow();
            let NodeValue::Heading(heading) = &ast.value else {
                return None;
            };
            let id = by_line
                .get(&ast.sourcepos.start.line)
                .filter(|anchor| anchor.level == heading.level && !anchor.id.is_empty())
                .map(|anchor| anchor.id.clone());
            Some(id)
        })
        .collect()
}

/// Writes heading tags with precomputed ids, in encounter order.
struct AnchoredHeadings {
    ids: Vec<Option<String>>,
    next: AtomicUsize,
}

impl AnchoredHeadings {
    const fn new(ids: Vec<Option<String>>) -> Self {
        Self {
            ids,
            next: AtomicUsize::new(0),
        }
    }
}

impl HeadingAdapter for AnchoredHeadings {
    fn enter(
        &self,
        output: &mut dyn Write,
        heading: &HeadingMeta,
        _sourcepos: Option<Sourcepos>,
    ) -> io::Result<()> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        match self.ids.get(idx).and_then(Option::as_deref) {
            Some(id) => write!(output, "<h{} id=\"{}\">", heading.level, escape_html(id)),
            None => write!(output, "<h{}>", heading.level),
        }
    }

    fn exit(&self, output: &mut dyn Write, heading: &HeadingMeta) -> io::Result<()> {
        write!(output, "</h{}>", heading.level)
    }
}

/// Replace each link node with inline HTML carrying the resolved target.
fn rewrite_links<'a>(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, ctx: &RenderContext<'_>) {
    let links: Vec<_> = root
        .descendants()
        .filter(|node| matches!(node.data.borrow().value, NodeValue::Link(_)))
        .collect();

    for node in links {
        let (url, title, start) = {
            let ast = node.data.borrow();
            let NodeValue::Link(link) = &ast.value else {
                continue;
            };
            (link.url.clone(), link.title.clone(), ast.sourcepos.start)
        };

        let resolved = ctx.resolver.resolve(Some(&url), ctx.link_context);
        let open = open_link_tag(&resolved, &title);
        let open = arena.alloc(Node::new(RefCell::new(Ast::new(NodeValue::HtmlInline(open), start))));
        let close = arena.alloc(Node::new(RefCell::new(Ast::new(
            NodeValue::HtmlInline("</a>".to_string()),
            start,
        ))));

        node.insert_before(open);
        let children: Vec<_> = node.children().collect();
        for child in children {
            child.detach();
            node.insert_before(child);
        }
        node.insert_before(close);
        node.detach();
    }
}

/// Opening `<a>` tag for a resolved link.
pub fn open_link_tag(link: &ResolvedLink, title: &str) -> String {
    let mut tag = format!("<a href=\"{}\"", escape_html(&link.url));
    match &link.kind {
        LinkKind::InternalDoc { doc_id } => {
            let _ = write!(tag, " class=\"doc-link\" data-doc=\"{}\"", escape_html(doc_id));
        }
        LinkKind::Anchor => {
            let fragment = link.fragment().unwrap_or_default();
            let _ = write!(tag, " class=\"anchor-link\" data-anchor=\"{}\"", escape_html(fragment));
        }
        LinkKind::External if link.opens_new_context() => {
            tag.push_str(" class=\"external-link\" target=\"_blank\" rel=\"noopener noreferrer\"");
        }
        LinkKind::External => {}
    }
    if !title.is_empty() {
        let _ = write!(tag, " title=\"{}\"", escape_html(title));
    }
    tag.push('>');
    tag
}

/// Point relative image sources at the raw content host.
fn rewrite_images<'a>(root: &'a AstNode<'a>, ctx: &RenderContext<'_>) {
    for node in root.descendants() {
        let mut ast = node.data.borrow_mut();
        if let NodeValue::Image(image) = &mut ast.value
            && let Some(src) = raw_image_url(&image.url, ctx)
        {
            image.url = src;
        }
    }
}

fn raw_image_url(src: &str, ctx: &RenderContext<'_>) -> Option<String> {
    if src.is_empty() || src.contains("://") || src.starts_with("data:") || src.starts_with('#') {
        return None;
    }
    Some(repository_url(ctx.raw_base, ctx.docs_dir, src, ctx.link_context.is_root))
}

/// Swap code blocks for pre-rendered HTML blocks with a header bar.
fn replace_code_blocks<'a>(root: &'a AstNode<'a>, highlight: bool) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    for node in root.descendants() {
        let mut ast = node.data.borrow_mut();
        let NodeValue::CodeBlock(code) = &ast.value else {
            continue;
        };
        let language = code
            .info
            .split_whitespace()
            .next()
            .unwrap_or(PLAIN_LANGUAGE)
            .to_string();
        let block = CodeBlock {
            language,
            code: code.literal.clone(),
        };
        let literal = code_block_html(blocks.len(), &block, highlight);
        ast.value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal,
        });
        blocks.push(block);
    }
    blocks
}

fn code_block_html(index: usize, block: &CodeBlock, highlight: bool) -> String {
    let language = escape_html(&block.language);
    let display = block.code.trim_end_matches(['\n', '\r']);
    let body = if highlight {
        crate::highlight::highlight_html(Some(&block.language), display)
    } else {
        None
    }
    .unwrap_or_else(|| escape_html(display));

    format!(
        "<div class=\"code-block\" data-code-index=\"{index}\">\n\
         <div class=\"code-header\"><span class=\"code-language\">{language}</span>\
         <button type=\"button\" class=\"copy-button\" data-copy-index=\"{index}\">Copy</button></div>\n\
         <pre><code class=\"language-{language}\">{body}</code></pre>\n\
         </div>\n"
    )
}

/// Escape text for HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
