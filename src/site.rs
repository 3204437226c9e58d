//! Document registry and repository locations.
//!
//! A [`Site`] is static configuration: the list of selectable documents and
//! the base URLs they are fetched from and linked to. The built-in site points
//! at the creeper-qt repository; `--site FILE` loads the same shape from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::links::{DEFAULT_ROUTE, LinkContext, LinkResolver};
use crate::location::Location;

/// Errors loading a site registry file.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("failed to read site file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid site file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("site has no documents")]
    Empty,
    #[error("duplicate document id `{0}`")]
    DuplicateId(String),
    #[error("default document `{0}` is not registered")]
    UnknownDefault(String),
}

/// A selectable documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Stable id, used in the `doc` query parameter
    pub id: String,
    /// Sidebar title
    pub title: String,
    /// One-line summary shown under the title
    #[serde(default)]
    pub description: String,
    /// Path relative to the repository root or documentation directory
    pub path: String,
    /// Whether `path` is relative to the repository root
    #[serde(default)]
    pub is_root: bool,
}

impl DocumentDescriptor {
    fn new(id: &str, title: &str, description: &str, path: &str, is_root: bool) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            path: path.to_string(),
            is_root,
        }
    }
}

/// The documentation site: registry plus repository locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Project name shown in the page header
    pub name: String,
    /// Raw content base for the repository root
    pub raw_base: String,
    /// Browsable source base for the repository root
    pub browse_base: String,
    /// Documentation subdirectory, relative to the repository root
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    /// Route template for internal document links (`{id}` is replaced)
    #[serde(default = "default_route")]
    pub route: String,
    /// Document selected when the address bar names none
    pub default_doc: String,
    pub documents: Vec<DocumentDescriptor>,
}

fn default_docs_dir() -> String {
    "doc".to_string()
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

impl Default for Site {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Site {
    /// The reference deployment: creeper-qt's README plus four guides.
    pub fn builtin() -> Self {
        Self {
            name: "Creeper-Qt".to_string(),
            raw_base: "https://raw.githubusercontent.com/creeper5820/creeper-qt/main".to_string(),
            browse_base: "https://github.com/creeper5820/creeper-qt/blob/main".to_string(),
            docs_dir: default_docs_dir(),
            route: default_route(),
            default_doc: "readme".to_string(),
            documents: vec![
                DocumentDescriptor::new(
                    "readme",
                    "Project overview",
                    "Overview and quick start",
                    "README.md",
                    true,
                ),
                DocumentDescriptor::new(
                    "usage",
                    "Usage guide",
                    "Installation, configuration and first steps",
                    "usage.md",
                    false,
                ),
                DocumentDescriptor::new(
                    "widgets",
                    "Component reference",
                    "Complete widget API reference",
                    "widgets.md",
                    false,
                ),
                DocumentDescriptor::new(
                    "layout",
                    "Layout guide",
                    "Layout containers and arrangement",
                    "layout.md",
                    false,
                ),
                DocumentDescriptor::new(
                    "theme",
                    "Theming guide",
                    "Theme management and custom palettes",
                    "theme.md",
                    false,
                ),
            ],
        }
    }

    /// Load a site from a JSON file and validate it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// describes an inconsistent registry.
    pub fn from_json_file(path: &Path) -> Result<Self, SiteError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| SiteError::Read {
            path: display.clone(),
            source,
        })?;
        let site: Self = serde_json::from_str(&content).map_err(|source| SiteError::Parse {
            path: display,
            source,
        })?;
        site.validate()?;
        Ok(site)
    }

    /// Check the registry is usable: non-empty, unique ids, known default.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.documents.is_empty() {
            return Err(SiteError::Empty);
        }
        for (idx, doc) in self.documents.iter().enumerate() {
            if self.documents[..idx].iter().any(|d| d.id == doc.id) {
                return Err(SiteError::DuplicateId(doc.id.clone()));
            }
        }
        if self.document(&self.default_doc).is_none() {
            return Err(SiteError::UnknownDefault(self.default_doc.clone()));
        }
        Ok(())
    }

    pub fn document(&self, id: &str) -> Option<&DocumentDescriptor> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }

    /// Raw content base for the documentation subdirectory.
    pub fn docs_raw_base(&self) -> String {
        join_url(&self.raw_base, &self.docs_dir)
    }

    /// Raw URL a document is fetched from.
    pub fn raw_url(&self, path: &str, is_root: bool) -> String {
        if is_root {
            join_url(&self.raw_base, path)
        } else {
            join_url(&self.docs_raw_base(), path)
        }
    }

    /// Browsable source URL for editing a document.
    pub fn edit_url(&self, doc: &DocumentDescriptor) -> String {
        if doc.is_root {
            join_url(&self.browse_base, &doc.path)
        } else {
            join_url(&join_url(&self.browse_base, &self.docs_dir), &doc.path)
        }
    }

    /// Link resolver over this site's documents.
    pub fn link_resolver(&self) -> LinkResolver {
        LinkResolver::new(self.doc_ids(), &self.browse_base, &self.docs_dir)
            .with_route(self.route.clone())
    }

    pub const fn link_context(doc: &DocumentDescriptor) -> LinkContext {
        LinkContext {
            is_root: doc.is_root,
        }
    }

    /// Document selected by a location's `doc` query parameter.
    ///
    /// Falls back to the default document when the parameter is absent or
    /// names an unregistered id.
    pub fn initial_doc(&self, location: &Location) -> &str {
        location
            .query_param(crate::location::DOC_PARAM)
            .and_then(|id| self.document(&id))
            .map_or(self.default_doc.as_str(), |doc| doc.id.as_str())
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
