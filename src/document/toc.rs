//! Heading extraction and anchor identifiers.
//!
//! Headings are scanned straight from the markdown source rather than from
//! the parsed tree so the identifiers stay stable across renderer versions.
//! The renderer looks anchors up by source line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{HeadingAnchor, TocEntry};

static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").expect("heading pattern is a valid regex")
});

/// Characters removed from heading text before display and slugging.
const STRIPPED_MARKUP: &[char] = &['#', '`', '*', '_', '[', ']'];

/// Extract the table of contents (levels 2-4) in document order.
///
/// # Example
///
/// ```
/// use docview::document::extract_toc;
///
/// let toc = extract_toc("# Title\n\n## Setup\n\n## Setup\n");
/// let ids: Vec<_> = toc.iter().map(|e| e.id.as_str()).collect();
/// assert_eq!(ids, ["setup", "setup-1"]);
/// ```
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    scan_headings(markdown)
        .iter()
        .filter(|anchor| anchor.in_toc())
        .map(HeadingAnchor::to_toc_entry)
        .collect()
}

/// Scan every heading marker, of any level, assigning collision-free ids.
///
/// Levels outside the table of contents still take a slot in the collision
/// counter, so a `## Intro` after `# Intro` becomes `intro-1`.
pub fn scan_headings(markdown: &str) -> Vec<HeadingAnchor> {
    let mut slugger = Slugger::default();
    let mut anchors = Vec::new();
    let mut line = 1;
    let mut scanned_to = 0;

    for caps in HEADING_PATTERN.captures_iter(markdown) {
        let (Some(whole), Some(marker), Some(raw)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        line += markdown[scanned_to..whole.start()].matches('\n').count();
        scanned_to = whole.start();

        let text = strip_inline_markup(raw.as_str());
        let id = slugger.slug(&text);
        #[allow(clippy::cast_possible_truncation)]
        let level = marker.len() as u8;
        anchors.push(HeadingAnchor {
            level,
            text,
            id,
            line,
        });
    }

    anchors
}

/// Remove emphasis, code and link-bracket punctuation, then trim.
pub fn strip_inline_markup(text: &str) -> String {
    text.chars()
        .filter(|ch| !STRIPPED_MARKUP.contains(ch))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Base identifier for heading text, before collision suffixing.
///
/// Lowercases, turns each whitespace run into a single `-`, and keeps only
/// ASCII word characters, `-`, and CJK ideographs (U+4E00..=U+9FA5).
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if is_slug_char(ch) {
            out.push(ch);
        }
    }
    out
}

const fn is_slug_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '\u{4e00}'..='\u{9fa5}')
}

/// Hands out unique ids within one document.
///
/// The first occurrence of a base id is used unchanged; the k-th repeat
/// becomes `base-k`. Suffixed ids are not checked against literal headings
/// that happen to spell the same string.
#[derive(Debug, Default, Clone)]
pub struct Slugger {
    counts: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if let Some(count) = self.counts.get_mut(&base) {
            *count += 1;
            format!("{base}-{count}")
        } else {
            self.counts.insert(base.clone(), 0);
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(markdown: &str) -> Vec<String> {
        extract_toc(markdown).into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("Multiple   spaces\there"), "multiple-spaces-here");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("What's new? (v2.0)"), "whats-new-v20");
        assert_eq!(slugify("a ! b"), "a--b");
    }

    #[test]
    fn test_slugify_keeps_cjk_ideographs() {
        assert_eq!(slugify("快速 开始"), "快速-开始");
        assert_eq!(slugify("Qt 组件文档"), "qt-组件文档");
    }

    #[test]
    fn test_slugify_drops_non_ascii_letters_outside_cjk_range() {
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("ソース"), "");
    }

    #[test]
    fn test_strip_inline_markup() {
        assert_eq!(strip_inline_markup("**Bold** `code` [link]"), "Bold code link");
        assert_eq!(strip_inline_markup("  snake_case  "), "snakecase");
    }

    #[test]
    fn test_extract_toc_keeps_levels_two_to_four() {
        let md = "# Title\n## Two\n### Three\n#### Four\n##### Five\n###### Six\n";
        let toc = extract_toc(md);
        let levels: Vec<u8> = toc.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![2, 3, 4]);
        assert_eq!(toc[0].text, "Two");
    }

    #[test]
    fn test_duplicate_headings_get_numbered_suffixes() {
        let md = "## Setup\n\n## Setup\n\n## Setup\n";
        assert_eq!(ids(md), vec!["setup", "setup-1", "setup-2"]);
    }

    #[test]
    fn test_excluded_levels_consume_collision_slots() {
        let md = "# Usage\n\n## Usage\n\n##### Usage\n\n### Usage\n";
        assert_eq!(ids(md), vec!["usage-1", "usage-3"]);
    }

    #[test]
    fn test_requires_space_after_marker() {
        let md = "##NoSpace\n####### seven\n## Real\n";
        assert_eq!(ids(md), vec!["real"]);
    }

    #[test]
    fn test_heading_text_is_stripped_of_markup() {
        let toc = extract_toc("## **Bold** `Widget` [API]\n");
        assert_eq!(toc[0].text, "Bold Widget API");
        assert_eq!(toc[0].id, "bold-widget-api");
    }

    #[test]
    fn test_closing_hashes_are_removed() {
        let toc = extract_toc("## Closed ##\n");
        assert_eq!(toc[0].text, "Closed");
        assert_eq!(toc[0].id, "closed");
    }

    #[test]
    fn test_crlf_line_endings() {
        let toc = extract_toc("## One\r\n\r\n## Two\r\n");
        assert_eq!(toc[0].id, "one");
        assert_eq!(toc[1].text, "Two");
    }

    #[test]
    fn test_scan_headings_records_source_lines() {
        let md = "# Title\n\ntext\n\n## Section\n\n```\n## in fence\n```\n";
        let anchors = scan_headings(md);
        let lines: Vec<usize> = anchors.iter().map(|a| a.line).collect();
        assert_eq!(lines, vec![1, 5, 8]);
    }

    #[test]
    fn test_literal_suffix_collision_is_not_special_cased() {
        let md = "## Section\n## Section\n## Section-1\n";
        assert_eq!(ids(md), vec!["section", "section-1", "section-1"]);
    }

    #[test]
    fn test_empty_input_has_no_entries() {
        assert!(extract_toc("").is_empty());
        assert!(extract_toc("plain paragraph\nanother line").is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn heading_line() -> impl Strategy<Value = String> {
            (1..=6usize, prop::sample::select(vec!["Setup", "setup", "Set up", "API", "*API*", "a b"]))
                .prop_map(|(level, text)| format!("{} {text}", "#".repeat(level)))
        }

        proptest! {
            #[test]
            fn distinct_base_ids_never_collide(lines in prop::collection::vec(heading_line(), 0..40)) {
                let anchors = scan_headings(&lines.join("\n"));
                prop_assert_eq!(anchors.len(), lines.len());
                let mut seen = std::collections::HashSet::new();
                for anchor in &anchors {
                    prop_assert!(seen.insert(anchor.id.clone()), "duplicate id {}", anchor.id);
                }
            }

            #[test]
            fn toc_is_ordered_subset_of_scan(lines in prop::collection::vec(heading_line(), 0..40)) {
                let md = lines.join("\n");
                let scanned = scan_headings(&md);
                let toc = extract_toc(&md);
                let expected: Vec<_> = scanned.iter().filter(|a| a.in_toc()).map(|a| a.id.clone()).collect();
                let actual: Vec<_> = toc.iter().map(|e| e.id.clone()).collect();
                prop_assert_eq!(actual, expected);
                prop_assert!(toc.iter().all(|e| (2..=4).contains(&e.level)));
            }
        }
    }
}
