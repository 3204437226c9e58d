use std::time::{Duration, Instant};

use crate::document::{RenderContext, RenderedDocument, TocEntry, render_markdown};
use crate::fetch::FetchError;
use crate::links::{LinkResolver, ResolvedLink};
use crate::location::{DOC_PARAM, History, Location};
use crate::site::{DocumentDescriptor, Site};
use crate::ui::ActiveSection;

/// How long a copy button shows its confirmation.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Body shown in place of a document that could not be fetched.
pub const FALLBACK_MARKDOWN: &str =
    "## Could not load document\n\nCheck your network connection or try again later.\n";

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Where the selected document is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Failed(FetchError),
}

/// Short-lived status line, such as a copy confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Toast {
    message: String,
    expires_at: Instant,
}

/// Per-code-block copy affordance.
///
/// Pressing shows "Copied" for [`COPY_FEEDBACK`], then reverts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyButton {
    copied_until: Option<Instant>,
}

impl CopyButton {
    pub fn press(&mut self, now: Instant) {
        self.copied_until = Some(now + COPY_FEEDBACK);
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_copied(now) { "Copied" } else { "Copy" }
    }

    /// Revert once the feedback window has passed; returns true on change.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.copied_until.is_some_and(|until| now >= until) {
            self.copied_until = None;
            return true;
        }
        false
    }
}

/// The complete viewer state.
///
/// All state lives here and only [`update`](super::update) changes it.
#[derive(Debug, Clone)]
pub struct Model {
    pub site: Site,
    resolver: LinkResolver,
    /// Id of the selected document
    pub selected: String,
    /// Bumped on every selection; loads for older generations are stale
    pub generation: u64,
    pub phase: Phase,
    /// Markdown currently displayed (the fallback body after a failure)
    pub content: String,
    pub toc: Vec<TocEntry>,
    pub rendered: RenderedDocument,
    pub history: History,
    pub active: ActiveSection,
    pub copy_buttons: Vec<CopyButton>,
    /// Heading id to bring into view once it exists
    pub scroll_target: Option<String>,
    /// Apply syntax highlighting when rendering
    pub highlight: bool,
    toast: Option<Toast>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Site::default(), &Location::default())
    }
}

impl Model {
    /// Start a session at `location`, selecting the document it names.
    ///
    /// The starting location is normalized in place to carry the `doc`
    /// parameter; no history entry is added.
    pub fn new(site: Site, location: &Location) -> Self {
        let selected = site.initial_doc(location).to_string();
        let resolver = site.link_resolver();
        let history = History::new(location.clone().with_query_param(DOC_PARAM, &selected));
        let scroll_target = location.fragment();
        Self {
            site,
            resolver,
            selected,
            generation: 1,
            phase: Phase::Loading,
            content: String::new(),
            toc: Vec::new(),
            rendered: RenderedDocument::default(),
            history,
            active: ActiveSection::NoActive,
            copy_buttons: Vec::new(),
            scroll_target,
            highlight: true,
            toast: None,
        }
    }

    #[must_use]
    pub const fn with_highlight(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn current_document(&self) -> Option<&DocumentDescriptor> {
        self.site.document(&self.selected)
    }

    pub const fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Resolve an href found in the current document.
    pub fn resolve_link(&self, href: Option<&str>) -> ResolvedLink {
        let ctx = self
            .current_document()
            .map(Site::link_context)
            .unwrap_or_default();
        self.resolver.resolve(href, ctx)
    }

    /// Label a copy button shows at `now`.
    pub fn copy_label(&self, index: usize, now: Instant) -> Option<&'static str> {
        self.copy_buttons.get(index).map(|button| button.label(now))
    }

    /// Mark `id` selected and start a new generation.
    ///
    /// The previous document's content and table of contents are dropped.
    pub(super) fn begin_load(&mut self, id: &str) {
        self.selected = id.to_string();
        self.generation += 1;
        self.phase = Phase::Loading;
        self.content.clear();
        self.toc.clear();
        self.rendered = RenderedDocument::default();
        self.copy_buttons.clear();
        self.active = ActiveSection::NoActive;
        self.scroll_target = None;
    }

    /// Show `markdown` as the current document.
    pub(super) fn show(&mut self, markdown: String) {
        self.display(markdown, true);
    }

    /// Show the fallback body. Its heading is not an anchor, so the table of
    /// contents stays empty.
    pub(super) fn show_fallback(&mut self) {
        self.display(FALLBACK_MARKDOWN.to_string(), false);
    }

    fn display(&mut self, markdown: String, anchored: bool) {
        let rendered = match self.current_document() {
            Some(doc) => {
                let ctx = RenderContext::for_document(&self.site, &self.resolver, doc)
                    .with_highlight(self.highlight);
                let ctx = if anchored { ctx } else { ctx.without_anchors() };
                render_markdown(&markdown, &ctx).unwrap_or_else(|err| {
                    tracing::warn!(doc = %self.selected, error = %err, "failed to render document");
                    RenderedDocument::default()
                })
            }
            None => RenderedDocument::default(),
        };
        self.toc = rendered.toc.clone();
        self.copy_buttons = vec![CopyButton::default(); rendered.code_blocks.len()];
        self.rendered = rendered;
        self.content = markdown;
        self.active = ActiveSection::NoActive;
    }

    pub(super) fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<&str> {
        self.toast.as_ref().map(|toast| toast.message.as_str())
    }
}
