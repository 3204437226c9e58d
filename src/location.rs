//! Address bar state.
//!
//! The selected document is mirrored into the `doc` query parameter so that a
//! location can be bookmarked, shared, and walked with back/forward. Internal
//! navigation pushes a history entry instead of reloading anything.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use url::{Position, Url};

/// Query parameter carrying the selected document id.
pub const DOC_PARAM: &str = "doc";

/// Base that path-relative locations are resolved against.
static LOCAL_ORIGIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("local origin is a valid url"));

/// A parsed location: `[origin]path[?query][#fragment]`.
///
/// Locations given without an origin stay path-relative when displayed.
/// Query values and fragments are percent-decoded on the way out and
/// encoded on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
    relative: bool,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            url: LOCAL_ORIGIN.clone(),
            relative: true,
        }
    }
}

impl Location {
    /// Parse an absolute URL or a path-relative location.
    ///
    /// # Example
    ///
    /// ```
    /// use docview::location::Location;
    ///
    /// let loc = Location::parse("https://example.com/docs?doc=usage#install");
    /// assert_eq!(loc.query_param("doc").as_deref(), Some("usage"));
    /// assert_eq!(loc.fragment().as_deref(), Some("install"));
    /// ```
    pub fn parse(input: &str) -> Self {
        if let Ok(url) = Url::parse(input) {
            return Self {
                url,
                relative: false,
            };
        }
        match LOCAL_ORIGIN.join(input) {
            Ok(url) => Self {
                url,
                relative: true,
            },
            Err(err) => {
                tracing::warn!(location = input, error = %err, "unparseable location");
                Self::default()
            }
        }
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<String> {
        let raw = self.url.fragment().filter(|fragment| !fragment.is_empty())?;
        Some(urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned))
    }

    /// First decoded value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Set a query parameter, replacing any existing values in place.
    #[must_use]
    pub fn with_query_param(mut self, key: &str, value: &str) -> Self {
        let mut pairs: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();
        let mut replaced = false;
        pairs.retain_mut(|(k, v)| {
            if k.as_str() != key {
                return true;
            }
            if replaced {
                return false;
            }
            *v = value.to_string();
            replaced = true;
            true
        });
        if !replaced {
            pairs.push((key.to_string(), value.to_string()));
        }
        self.url.query_pairs_mut().clear().extend_pairs(&pairs);
        self
    }

    #[must_use]
    pub fn with_fragment(mut self, fragment: Option<&str>) -> Self {
        self.url.set_fragment(fragment);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative {
            f.write_str(&self.url[Position::BeforePath..])
        } else {
            f.write_str(self.url.as_str())
        }
    }
}

/// Session history of locations, like a browser's back/forward stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    /// Push a new entry, discarding any forward entries.
    pub fn push(&mut self, location: Location) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> Option<&Location> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&Location> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_only() {
        let loc = Location::parse("/docs");
        assert_eq!(loc.path(), "/docs");
        assert_eq!(loc.query_param(DOC_PARAM), None);
        assert_eq!(loc.fragment(), None);
        assert_eq!(loc.to_string(), "/docs");
    }

    #[test]
    fn test_parse_absolute_url_round_trips() {
        let input = "https://example.com/docs?doc=usage&lang=en#setup";
        let loc = Location::parse(input);
        assert_eq!(loc.path(), "/docs");
        assert_eq!(loc.query_param("lang").as_deref(), Some("en"));
        assert_eq!(loc.to_string(), input);
    }

    #[test]
    fn test_origin_without_path() {
        let loc = Location::parse("https://example.com?doc=theme");
        assert_eq!(loc.path(), "/");
        assert_eq!(loc.to_string(), "https://example.com/?doc=theme");
    }

    #[test]
    fn test_with_query_param_replaces_existing() {
        let loc = Location::parse("/docs?lang=en&doc=usage&doc=old")
            .with_query_param(DOC_PARAM, "widgets");
        assert_eq!(loc.to_string(), "/docs?lang=en&doc=widgets");
    }

    #[test]
    fn test_with_query_param_appends_when_missing() {
        let loc = Location::parse("/docs#top").with_query_param(DOC_PARAM, "layout");
        assert_eq!(loc.to_string(), "/docs?doc=layout#top");
        let loc = loc.with_fragment(None);
        assert_eq!(loc.to_string(), "/docs?doc=layout");
    }

    #[test]
    fn test_history_push_back_forward() {
        let mut history = History::new(Location::parse("/docs?doc=readme"));
        history.push(Location::parse("/docs?doc=usage"));
        history.push(Location::parse("/docs?doc=theme"));
        assert_eq!(history.len(), 3);

        assert_eq!(
            history.back().and_then(|l| l.query_param(DOC_PARAM)).as_deref(),
            Some("usage")
        );
        assert_eq!(
            history.back().and_then(|l| l.query_param(DOC_PARAM)).as_deref(),
            Some("readme")
        );
        assert!(history.back().is_none());
        assert_eq!(
            history.forward().and_then(|l| l.query_param(DOC_PARAM)).as_deref(),
            Some("usage")
        );

        history.push(Location::parse("/docs?doc=layout"));
        assert!(history.forward().is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_query_and_fragment_are_percent_decoded() {
        let loc = Location::parse("/docs?doc=%77idgets#%E5%AE%89%E8%A3%85");
        assert_eq!(loc.query_param(DOC_PARAM).as_deref(), Some("widgets"));
        assert_eq!(loc.fragment().as_deref(), Some("安装"));
    }

    #[test]
    fn test_query_values_are_encoded() {
        let loc = Location::parse("/docs").with_query_param("q", "a b&c");
        assert_eq!(loc.to_string(), "/docs?q=a+b%26c");
        assert_eq!(loc.query_param("q").as_deref(), Some("a b&c"));
    }

    #[test]
    fn test_relative_parent_segments_resolve_against_root() {
        let loc = Location::parse("../docs?doc=theme");
        assert_eq!(loc.to_string(), "/docs?doc=theme");
    }
}
