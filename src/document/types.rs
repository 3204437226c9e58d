//! Core document types.

use serde::Serialize;

/// One entry in the table of contents.
///
/// Only headings of level 2 through 4 become entries; the `id` is the anchor
/// attached to the rendered heading element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Anchor identifier, unique within one document
    pub id: String,
    /// Heading text with inline markup stripped
    pub text: String,
    /// Heading level (2-4)
    pub level: u8,
}

/// A heading seen while scanning the source, of any level.
///
/// The renderer uses these to tag rendered headings with the same ids the
/// table of contents links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingAnchor {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text with inline markup stripped
    pub text: String,
    /// Anchor identifier after collision suffixing
    pub id: String,
    /// 1-based line of the heading marker in the source
    pub line: usize,
}

impl HeadingAnchor {
    /// Whether this heading belongs in the table of contents.
    pub const fn in_toc(&self) -> bool {
        matches!(self.level, 2..=4)
    }

    pub fn to_toc_entry(&self) -> TocEntry {
        TocEntry {
            id: self.id.clone(),
            text: self.text.clone(),
            level: self.level,
        }
    }
}

/// A fenced or indented code block found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Declared language tag, `text` when none was given
    pub language: String,
    /// Raw block contents, as copied to the clipboard
    pub code: String,
}

/// A rendered markdown document, ready to be placed into a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    /// HTML body fragment
    pub html: String,
    /// Table of contents (levels 2-4)
    pub toc: Vec<TocEntry>,
    /// Ids actually attached to rendered heading elements, in document order
    pub heading_ids: Vec<String>,
    /// Code blocks in document order; index matches `data-code-index`
    pub code_blocks: Vec<CodeBlock>,
    /// Text of the first level-1 heading
    pub title: Option<String>,
}

impl RenderedDocument {
    /// Title taken from the first level-1 heading, if any.
    pub fn title_from(anchors: &[HeadingAnchor]) -> Option<&str> {
        anchors
            .iter()
            .find(|a| a.level == 1)
            .map(|a| a.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(level: u8, text: &str) -> HeadingAnchor {
        HeadingAnchor {
            level,
            text: text.to_string(),
            id: text.to_lowercase(),
            line: 1,
        }
    }

    #[test]
    fn test_in_toc_only_for_levels_two_to_four() {
        let levels: Vec<bool> = (1..=6).map(|l| anchor(l, "x").in_toc()).collect();
        assert_eq!(levels, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_title_from_first_level_one_heading() {
        let anchors = vec![anchor(2, "Intro"), anchor(1, "Title"), anchor(1, "Other")];
        assert_eq!(RenderedDocument::title_from(&anchors), Some("Title"));
        assert_eq!(RenderedDocument::title_from(&[]), None);
    }

    #[test]
    fn test_toc_entry_serializes_fields() {
        let entry = anchor(3, "Setup").to_toc_entry();
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"id":"setup","text":"Setup","level":3}"#);
    }
}
