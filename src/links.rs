//! Link classification and rewriting.
//!
//! Every href found while rendering goes through [`LinkResolver::resolve`],
//! which sorts it into one of three kinds:
//!
//! - **External**: absolute URLs, plus any relative path that is not a known
//!   document (rewritten to the repository's browsable source)
//! - **Anchor**: `#fragment` links within the current page
//! - **Internal document**: relative links to another registered markdown
//!   document, which navigate without reloading the page
//!
//! Resolution never fails. Anything that is not recognised falls through to
//! an external link on the source host.

use std::collections::BTreeMap;

use serde::Serialize;

/// Href used when a link has no target at all.
pub const INERT_HREF: &str = "#";

/// Default route for internal document links; `{id}` is replaced.
pub const DEFAULT_ROUTE: &str = "/docs?doc={id}";

const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "mailto:"];
const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown"];

/// What kind of target a link points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkKind {
    External,
    Anchor,
    InternalDoc { doc_id: String },
}

/// A link target after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    /// Concrete href to render
    pub url: String,
    #[serde(flatten)]
    pub kind: LinkKind,
}

/// What following a resolved link should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Switch the selected document and record it in the address bar.
    SelectDocument {
        doc_id: String,
        fragment: Option<String>,
    },
    /// Smooth-scroll to the element with this id.
    ScrollTo(String),
    /// Open in a new browsing context.
    Open(String),
    /// Nothing to follow.
    Inert,
}

impl ResolvedLink {
    fn external(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: LinkKind::External,
        }
    }

    /// Target document id for internal links.
    pub fn target_doc_id(&self) -> Option<&str> {
        match &self.kind {
            LinkKind::InternalDoc { doc_id } => Some(doc_id.as_str()),
            _ => None,
        }
    }

    /// Fragment carried by the url, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.url
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty())
    }

    /// External web links open in a new context without leaking the referrer.
    pub fn opens_new_context(&self) -> bool {
        self.kind == LinkKind::External
            && (self.url.starts_with("http://") || self.url.starts_with("https://"))
    }

    pub fn action(&self) -> LinkAction {
        match &self.kind {
            LinkKind::InternalDoc { doc_id } => LinkAction::SelectDocument {
                doc_id: doc_id.clone(),
                fragment: self.fragment().map(str::to_string),
            },
            LinkKind::Anchor => self
                .fragment()
                .map_or(LinkAction::Inert, |id| LinkAction::ScrollTo(id.to_string())),
            LinkKind::External if self.url == INERT_HREF => LinkAction::Inert,
            LinkKind::External => LinkAction::Open(self.url.clone()),
        }
    }
}

/// Per-document information the resolver needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkContext {
    /// Whether the current document lives at the repository root rather than
    /// the documentation subdirectory.
    pub is_root: bool,
}

/// Resolves hrefs against a fixed set of documents and a source repository.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    /// Lowercased id -> registered id
    known_doc_ids: BTreeMap<String, String>,
    browse_base: String,
    docs_dir: String,
    route: String,
}

impl LinkResolver {
    /// Create a resolver.
    ///
    /// * `doc_ids` - ids of the documents that can be navigated to in-page
    /// * `browse_base` - base URL of the repository's browsable source
    /// * `docs_dir` - documentation subdirectory, relative to the repository root
    pub fn new<I, S>(doc_ids: I, browse_base: &str, docs_dir: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known_doc_ids = doc_ids
            .into_iter()
            .map(Into::into)
            .map(|id: String| (id.to_lowercase(), id))
            .collect();
        Self {
            known_doc_ids,
            browse_base: browse_base.trim_end_matches('/').to_string(),
            docs_dir: docs_dir.trim_matches('/').to_string(),
            route: DEFAULT_ROUTE.to_string(),
        }
    }

    /// Use a different route template for internal links (`{id}` is replaced).
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    /// Href for an internal document.
    pub fn route_for(&self, doc_id: &str) -> String {
        self.route.replace("{id}", doc_id)
    }

    /// Classify `href` and compute the url to render.
    ///
    /// # Example
    ///
    /// ```
    /// use docview::links::{LinkContext, LinkResolver};
    ///
    /// let resolver = LinkResolver::new(["usage"], "https://example.com/repo/blob/main", "doc");
    /// let link = resolver.resolve(Some("./usage.md#install"), LinkContext::default());
    /// assert_eq!(link.target_doc_id(), Some("usage"));
    /// assert_eq!(link.url, "/docs?doc=usage#install");
    /// ```
    pub fn resolve(&self, href: Option<&str>, ctx: LinkContext) -> ResolvedLink {
        let href = match href {
            Some(href) if !href.is_empty() => href,
            _ => return ResolvedLink::external(INERT_HREF),
        };

        if EXTERNAL_PREFIXES.iter().any(|prefix| href.starts_with(prefix)) {
            return ResolvedLink::external(href);
        }

        if href.starts_with('#') {
            return ResolvedLink {
                url: href.to_string(),
                kind: LinkKind::Anchor,
            };
        }

        let (path, suffix) = split_suffix(href);
        let clean = self.clean_path(path);

        if let Some(doc_id) = self.document_for(clean) {
            return ResolvedLink {
                url: append_suffix(self.route_for(doc_id), suffix),
                kind: LinkKind::InternalDoc {
                    doc_id: doc_id.to_string(),
                },
            };
        }

        ResolvedLink::external(format!("{}{suffix}", self.browse_url(clean, ctx.is_root)))
    }

    fn clean_path<'a>(&self, path: &'a str) -> &'a str {
        let path = path.strip_prefix("./").unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        if self.docs_dir.is_empty() {
            return path;
        }
        path.strip_prefix(self.docs_dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }

    fn document_for(&self, clean: &str) -> Option<&str> {
        let lower = clean.to_lowercase();
        let stem = MARKDOWN_EXTENSIONS
            .iter()
            .find_map(|ext| lower.strip_suffix(ext))?;
        let file_name = stem.rsplit('/').next().unwrap_or(stem);
        self.known_doc_ids.get(file_name).map(String::as_str)
    }

    fn browse_url(&self, clean: &str, is_root: bool) -> String {
        repository_url(&self.browse_base, &self.docs_dir, clean, is_root)
    }
}

/// Join a repository-relative `path` onto `base`.
///
/// Paths are relative to `docs_dir` unless `is_root`; each leading `../`
/// climbs one directory (never above `base`) and a leading `/` starts from
/// the repository root.
pub fn repository_url(base: &str, docs_dir: &str, path: &str, is_root: bool) -> String {
    let mut dirs: Vec<&str> = if is_root {
        Vec::new()
    } else {
        docs_dir.split('/').filter(|d| !d.is_empty()).collect()
    };

    let mut rest = path;
    if let Some(stripped) = rest.strip_prefix('/') {
        dirs.clear();
        rest = stripped;
    }
    loop {
        if let Some(stripped) = rest.strip_prefix("../") {
            dirs.pop();
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if rest == ".." {
            dirs.pop();
            rest = "";
        } else {
            break;
        }
    }

    let mut url = base.trim_end_matches('/').to_string();
    for dir in dirs {
        url.push('/');
        url.push_str(dir);
    }
    url.push('/');
    url.push_str(rest);
    url
}

/// Append a preserved query/fragment to a route that may carry its own query.
fn append_suffix(mut url: String, suffix: &str) -> String {
    match suffix.strip_prefix('?') {
        Some(query) if url.contains('?') => {
            url.push('&');
            url.push_str(query);
        }
        _ => url.push_str(suffix),
    }
    url
}

/// Split `href` at the first `?` or `#`, keeping the delimiter in the suffix.
fn split_suffix(href: &str) -> (&str, &str) {
    href.find(|c: char| c == '?' || c == '#')
        .map_or((href, ""), |idx| href.split_at(idx))
}
