//! Syntax highlighting for code blocks.
//!
//! Uses syntect with the bundled Sublime Text syntax definitions and emits
//! inline-styled HTML spans (no background, so the page's code block colour
//! shows through).

use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME_NAME: &str = "InspiredGitHub";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME: LazyLock<Option<Theme>> = LazyLock::new(|| {
    let mut themes = ThemeSet::load_defaults();
    themes.themes.remove(THEME_NAME)
});

/// Highlight `code` as HTML spans.
///
/// Returns `None` when the language is missing or unknown, or if syntect
/// fails partway through; callers fall back to escaped plain text.
pub fn highlight_html(language: Option<&str>, code: &str) -> Option<String> {
    let token = language.map(str::trim).filter(|l| !l.is_empty())?;
    let syntax = SYNTAX_SET.find_syntax_by_token(token)?;
    let theme = THEME.as_ref()?;

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut html = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        let regions = match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(regions) => regions,
            Err(err) => {
                tracing::debug!(language = token, error = %err, "highlighting failed");
                return None;
            }
        };
        match styled_line_to_highlighted_html(&regions, IncludeBackground::No) {
            Ok(spans) => html.push_str(&spans),
            Err(err) => {
                tracing::debug!(language = token, error = %err, "highlighting failed");
                return None;
            }
        }
    }
    Some(html)
}
