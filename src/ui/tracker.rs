//! Active table-of-contents entry, driven by heading visibility.

use crate::document::TocEntry;

/// A change in whether an observed element intersects the tracked band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityEvent {
    pub id: String,
    pub intersecting: bool,
}

/// Subscription to element visibility.
///
/// Implementations queue a [`VisibilityEvent`] for each observed element when
/// observation starts and whenever its state flips. After
/// [`disconnect`](IntersectionSource::disconnect) no further events arrive
/// until `observe` is called again.
pub trait IntersectionSource {
    fn observe(&mut self, ids: &[String]);
    fn take_events(&mut self) -> Vec<VisibilityEvent>;
    fn disconnect(&mut self);
    fn is_observing(&self) -> bool;
}

/// Which section is considered in view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveSection {
    #[default]
    NoActive,
    ActiveAt(String),
}

impl ActiveSection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::NoActive => None,
            Self::ActiveAt(id) => Some(id.as_str()),
        }
    }
}

/// Follows the headings of the current document.
///
/// Each call to [`track`](Self::track) releases the previous observation
/// before starting a new one, and dropping the tracker releases it too.
#[derive(Debug)]
pub struct ActiveSectionTracker<S: IntersectionSource> {
    source: S,
    active: ActiveSection,
}

impl<S: IntersectionSource> ActiveSectionTracker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: ActiveSection::NoActive,
        }
    }

    /// Observe the headings of a freshly rendered document.
    pub fn track(&mut self, toc: &[TocEntry]) {
        self.source.disconnect();
        self.active = ActiveSection::NoActive;
        if toc.is_empty() {
            return;
        }
        let ids: Vec<String> = toc.iter().map(|entry| entry.id.clone()).collect();
        tracing::debug!(headings = ids.len(), "tracking sections");
        self.source.observe(&ids);
    }

    /// Apply queued visibility events; returns true if the active id changed.
    ///
    /// Only elements entering the band move the active section. When several
    /// enter at once, the last event wins.
    pub fn poll(&mut self) -> bool {
        let before = self.active.clone();
        for event in self.source.take_events() {
            if event.intersecting {
                self.active = ActiveSection::ActiveAt(event.id);
            }
        }
        self.active != before
    }

    pub const fn active(&self) -> &ActiveSection {
        &self.active
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access, e.g. to scroll a viewport.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Stop observing without dropping the tracker.
    pub fn release(&mut self) {
        self.source.disconnect();
    }
}

impl<S: IntersectionSource> Drop for ActiveSectionTracker<S> {
    fn drop(&mut self) {
        self.source.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::viewport::{ElementBox, ScrollViewport};
    use std::cell::Cell;
    use std::rc::Rc;

    fn toc(ids: &[&str]) -> Vec<TocEntry> {
        ids.iter()
            .map(|id| TocEntry {
                id: (*id).to_string(),
                text: (*id).to_string(),
                level: 2,
            })
            .collect()
    }

    fn tracker() -> ActiveSectionTracker<ScrollViewport> {
        let mut vp = ScrollViewport::new(1000, 3200);
        vp.set_layout(vec![
            ElementBox::new("heading-1", 100, 40),
            ElementBox::new("heading-2", 1100, 40),
            ElementBox::new("heading-3", 2100, 40),
        ]);
        ActiveSectionTracker::new(vp)
    }

    #[test]
    fn test_initial_heading_becomes_active() {
        let mut t = tracker();
        assert_eq!(t.active(), &ActiveSection::NoActive);
        t.track(&toc(&["heading-1", "heading-2", "heading-3"]));
        assert!(t.poll());
        assert_eq!(t.active().id(), Some("heading-1"));
    }

    #[test]
    fn test_scrolling_moves_active_section_and_back() {
        let mut t = tracker();
        t.track(&toc(&["heading-1", "heading-2", "heading-3"]));
        t.poll();

        t.source_mut().scroll_to(1000);
        assert!(t.poll());
        assert_eq!(t.active().id(), Some("heading-2"));

        t.source_mut().scroll_to(0);
        assert!(t.poll());
        assert_eq!(t.active().id(), Some("heading-1"));
    }

    #[test]
    fn test_leaving_band_keeps_last_active() {
        let mut t = tracker();
        t.track(&toc(&["heading-1", "heading-2", "heading-3"]));
        t.poll();
        t.source_mut().scroll_to(500);
        assert!(!t.poll());
        assert_eq!(t.active().id(), Some("heading-1"));
    }

    #[test]
    fn test_retrack_resets_and_releases_previous_observation() {
        let mut t = tracker();
        t.track(&toc(&["heading-1", "heading-2"]));
        t.poll();
        t.track(&toc(&["heading-3"]));
        assert_eq!(t.active(), &ActiveSection::NoActive);

        t.source_mut().scroll_to(1000);
        assert!(!t.poll());
        assert_eq!(t.active(), &ActiveSection::NoActive);

        t.source_mut().scroll_to(2000);
        assert!(t.poll());
        assert_eq!(t.active().id(), Some("heading-3"));
    }

    #[test]
    fn test_empty_toc_observes_nothing() {
        let mut t = tracker();
        t.track(&[]);
        assert!(!t.source().is_observing());
        assert!(!t.poll());
    }

    #[test]
    fn test_release_stops_tracking() {
        let mut t = tracker();
        t.track(&toc(&["heading-1", "heading-2"]));
        t.poll();
        t.release();
        assert!(!t.source().is_observing());
        t.source_mut().scroll_to(1000);
        assert!(!t.poll());
        assert_eq!(t.active().id(), Some("heading-1"));
    }

    struct CountingSource {
        disconnects: Rc<Cell<usize>>,
    }

    impl IntersectionSource for CountingSource {
        fn observe(&mut self, _ids: &[String]) {}
        fn take_events(&mut self) -> Vec<VisibilityEvent> {
            Vec::new()
        }
        fn disconnect(&mut self) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
        fn is_observing(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_drop_disconnects() {
        let disconnects = Rc::new(Cell::new(0));
        {
            let mut t = ActiveSectionTracker::new(CountingSource {
                disconnects: Rc::clone(&disconnects),
            });
            t.track(&toc(&["a"]));
            assert_eq!(disconnects.get(), 1);
        }
        assert_eq!(disconnects.get(), 2);
    }
}
