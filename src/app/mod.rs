//! Document selection state and the viewer that drives it.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete viewer state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`Viewer`]: Owns the model and performs the side effects (fetching on
//!   worker threads, clipboard, link opening, section tracking)

mod effects;
mod loader;
mod model;
mod update;

pub use loader::Loader;
pub use model::{COPY_FEEDBACK, CopyButton, FALLBACK_MARKDOWN, Model, Phase};
pub use update::{Message, update};

use std::time::{Duration, Instant};

use crate::document::scan_headings;
use crate::fetch::{Fetcher, Transport};
use crate::location::Location;
use crate::site::Site;
use crate::ui::{ActiveSectionTracker, ElementBox, Page, ScrollViewport};

/// Assumed height of one source line when laying out headings.
const LINE_HEIGHT: i64 = 24;
/// Assumed height of a heading element.
const HEADING_HEIGHT: i64 = 32;
const DEFAULT_VIEWPORT_HEIGHT: i64 = 900;

/// Owns the model, the background loader and the section tracker.
pub struct Viewer<T: Transport + 'static> {
    model: Model,
    loader: Loader<T>,
    tracker: ActiveSectionTracker<ScrollViewport>,
    requested_generation: u64,
    open_links: bool,
    clipboard_enabled: bool,
}

impl<T: Transport + 'static> Viewer<T> {
    /// Create a viewer at `location` and start loading the document it names.
    pub fn new(site: Site, fetcher: Fetcher<T>, location: &Location) -> Self {
        let viewport = ScrollViewport::new(DEFAULT_VIEWPORT_HEIGHT, 0);
        let mut viewer = Self {
            model: Model::new(site, location),
            loader: Loader::new(fetcher),
            tracker: ActiveSectionTracker::new(viewport),
            requested_generation: 0,
            open_links: false,
            clipboard_enabled: false,
        };
        viewer.request_pending_load();
        viewer
    }

    /// Enable or disable syntax highlighting for documents rendered from now on.
    #[must_use]
    pub fn with_highlight(mut self, enabled: bool) -> Self {
        self.model.highlight = enabled;
        self
    }

    /// Hand external links to the system opener.
    #[must_use]
    pub const fn with_link_opener(mut self, enabled: bool) -> Self {
        self.open_links = enabled;
        self
    }

    /// Write copied code to the terminal clipboard.
    #[must_use]
    pub const fn with_clipboard(mut self, enabled: bool) -> Self {
        self.clipboard_enabled = enabled;
        self
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    pub const fn tracker(&self) -> &ActiveSectionTracker<ScrollViewport> {
        &self.tracker
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        self.loader.fetcher()
    }

    /// Apply a message, then its side effects.
    pub fn dispatch(&mut self, msg: Message) {
        let model = std::mem::take(&mut self.model);
        self.model = update(model, msg.clone());
        self.handle_message_side_effects(&msg);
    }

    /// Apply every finished load; returns how many arrived.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(msg) = self.loader.try_next() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    /// Block until the selected document is shown or `timeout` passes.
    ///
    /// Returns true if the document finished loading, successfully or not.
    pub fn wait_until_loaded(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.model.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.loader.next_timeout(remaining) {
                Some(msg) => self.dispatch(msg),
                None => break,
            }
        }
        !self.model.is_loading()
    }

    pub fn tick(&mut self, now: Instant) {
        self.dispatch(Message::Tick(now));
    }

    /// Scroll the content and update the active section.
    pub fn scroll_to(&mut self, offset: i64) {
        self.tracker.source_mut().scroll_to(offset);
        self.sync_active_section();
    }

    /// Full HTML page for the current state.
    pub fn page(&self) -> Option<String> {
        let document = self.model.current_document()?;
        let page = Page {
            site: &self.model.site,
            resolver: self.model.resolver(),
            document,
            rendered: &self.model.rendered,
            active: self.model.active.id(),
            loading: self.model.is_loading(),
            root_margin: self.tracker.source().root_margin(),
        };
        Some(page.render())
    }

    fn request_pending_load(&mut self) {
        if !self.model.is_loading() || self.requested_generation == self.model.generation {
            return;
        }
        self.tracker.release();
        let Some(doc) = self.model.current_document().cloned() else {
            return;
        };
        self.loader.request(self.model.generation, &doc);
        self.requested_generation = self.model.generation;
    }

    /// Lay out the new document's headings and start tracking them.
    fn layout_current_document(&mut self) {
        let anchors = scan_headings(&self.model.content);
        let lines = i64::try_from(self.model.content.lines().count()).unwrap_or(i64::MAX);
        let boxes = anchors
            .iter()
            .filter(|anchor| anchor.in_toc())
            .map(|anchor| {
                let line = i64::try_from(anchor.line).unwrap_or(i64::MAX);
                ElementBox::new(anchor.id.clone(), (line - 1) * LINE_HEIGHT, HEADING_HEIGHT)
            })
            .collect();

        let margin = self.tracker.source().root_margin();
        let height = self.tracker.source().height();
        *self.tracker.source_mut() = ScrollViewport::new(height, lines.saturating_mul(LINE_HEIGHT))
            .with_root_margin(margin);
        self.tracker.source_mut().set_layout(boxes);
        self.tracker.track(&self.model.toc);
        self.sync_active_section();
    }

    fn bring_scroll_target_into_view(&mut self) {
        if self.model.is_loading() {
            return;
        }
        let Some(target) = self.model.scroll_target.take() else {
            return;
        };
        if self.tracker.source_mut().scroll_to_element(&target) {
            self.sync_active_section();
        } else {
            tracing::debug!(anchor = %target, "scroll target not found");
        }
    }

    fn sync_active_section(&mut self) {
        if self.tracker.poll() {
            let active = self.tracker.active().clone();
            self.model = update(std::mem::take(&mut self.model), Message::Scrolled(active));
        }
    }
}
