//! Standalone HTML page around a rendered document.
//!
//! The page has three columns: the document list, the content with an
//! "edit this page" link, and the table of contents. A small inline script
//! handles anchor scrolling, copy buttons and active-section highlighting in
//! the browser; everything else is plain links.

use std::fmt::Write as _;

use super::viewport::RootMargin;
use crate::document::{RenderedDocument, TocEntry, escape_html};
use crate::links::LinkResolver;
use crate::site::{DocumentDescriptor, Site};

/// Inputs for one page.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub site: &'a Site,
    pub resolver: &'a LinkResolver,
    pub document: &'a DocumentDescriptor,
    pub rendered: &'a RenderedDocument,
    /// TOC entry to mark as current, if any
    pub active: Option<&'a str>,
    /// The document is still being fetched
    pub loading: bool,
    pub root_margin: RootMargin,
}

impl Page<'_> {
    /// Render the complete HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(self.rendered.html.len() + 8 * 1024);
        let heading = self
            .rendered
            .title
            .as_deref()
            .filter(|_| !self.loading)
            .unwrap_or(&self.document.title);
        let title = format!("{heading} - {}", self.site.name);

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
            escape_html(&title)
        );
        html.push_str("<div class=\"docs\">\n");
        self.write_sidebar(&mut html);
        self.write_content(&mut html);
        if self.loading {
            write_toc(&mut html, &[], None);
        } else {
            write_toc(&mut html, &self.rendered.toc, self.active);
        }
        html.push_str("</div>\n");
        let _ = write!(
            html,
            "<script>\nconst ROOT_MARGIN = \"{}\";\n{SCRIPT}</script>\n",
            self.root_margin
        );
        html.push_str("</body>\n</html>\n");
        html
    }

    fn write_sidebar(&self, html: &mut String) {
        let _ = writeln!(
            html,
            "<aside class=\"sidebar\">\n<div class=\"project\">{}</div>\n<nav class=\"documents\">",
            escape_html(&self.site.name)
        );
        for doc in &self.site.documents {
            let current = doc.id == self.document.id;
            let _ = writeln!(
                html,
                "<a class=\"document{}\" href=\"{}\" data-doc=\"{}\"{}><span class=\"title\">{}</span>\
                 <span class=\"description\">{}</span></a>",
                if current { " current" } else { "" },
                escape_html(&self.resolver.route_for(&doc.id)),
                escape_html(&doc.id),
                if current { " aria-current=\"page\"" } else { "" },
                escape_html(&doc.title),
                escape_html(&doc.description),
            );
        }
        let _ = writeln!(
            html,
            "</nav>\n<a class=\"repository\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">\
             View on GitHub</a>\n</aside>",
            escape_html(&self.site.browse_base)
        );
    }

    fn write_content(&self, html: &mut String) {
        let _ = writeln!(
            html,
            "<main class=\"content\">\n<nav class=\"breadcrumb\">Docs &rsaquo; <span>{}</span></nav>\n\
             <article class=\"markdown\">",
            escape_html(&self.document.title)
        );
        if self.loading {
            html.push_str(LOADING_HTML);
        } else {
            html.push_str(&self.rendered.html);
        }
        let _ = writeln!(
            html,
            "</article>\n<footer class=\"edit\"><a href=\"{}\" target=\"_blank\" \
             rel=\"noopener noreferrer\">Edit this page on GitHub</a></footer>\n</main>",
            escape_html(&self.site.edit_url(self.document))
        );
    }
}

fn write_toc(html: &mut String, toc: &[TocEntry], active: Option<&str>) {
    html.push_str("<aside class=\"toc\">\n");
    if !toc.is_empty() {
        html.push_str("<p class=\"toc-title\">On this page</p>\n<nav>\n");
        for entry in toc {
            let current = active == Some(entry.id.as_str());
            let _ = writeln!(
                html,
                "<a class=\"toc-entry level-{}{}\" href=\"#{}\">{}</a>",
                entry.level,
                if current { " active" } else { "" },
                escape_html(&entry.id),
                escape_html(&entry.text),
            );
        }
        html.push_str("</nav>\n");
    }
    html.push_str("</aside>\n");
}

const LOADING_HTML: &str = "<p class=\"loading\" aria-busy=\"true\">Loading\u{2026}</p>\n";

const STYLE: &str = "
body { margin: 0; font-family: system-ui, sans-serif; color: #1f2328; }
.docs { display: flex; min-height: 100vh; }
.sidebar { width: 16rem; flex-shrink: 0; border-right: 1px solid #d0d7de; padding: 1rem; }
.sidebar .project { font-weight: 600; font-size: 1.1rem; margin-bottom: 1rem; }
.sidebar .document { display: block; padding: .5rem .75rem; border-radius: .75rem; color: inherit; text-decoration: none; }
.sidebar .document.current { background: #0969da; color: #fff; }
.sidebar .description { display: block; font-size: .75rem; opacity: .7; }
.content { flex: 1; min-width: 0; max-width: 48rem; margin: 0 auto; padding: 2rem; }
.breadcrumb { font-size: .875rem; color: #59636e; margin-bottom: 1.5rem; }
.markdown h1, .markdown h2, .markdown h3, .markdown h4 { scroll-margin-top: 80px; }
.code-block { border: 1px solid #d0d7de; border-radius: .75rem; margin: 1rem 0; overflow: hidden; }
.code-header { display: flex; justify-content: space-between; padding: .25rem .75rem; background: #f6f8fa; font-size: .75rem; }
.code-block pre { margin: 0; padding: 1rem; overflow-x: auto; }
.edit { margin-top: 3rem; padding-top: 1.5rem; border-top: 1px solid #d0d7de; font-size: .875rem; }
.toc { width: 14rem; flex-shrink: 0; padding: 2rem 1rem; }
.toc nav { position: sticky; top: 5rem; }
.toc-title { font-size: .75rem; font-weight: 600; text-transform: uppercase; }
.toc-entry { display: block; font-size: .875rem; padding: .25rem 0; color: #59636e; text-decoration: none; }
.toc-entry.level-3 { padding-left: .75rem; }
.toc-entry.level-4 { padding-left: 1.5rem; }
.toc-entry.active { color: #0969da; font-weight: 500; }
.loading { color: #59636e; }
";

const SCRIPT: &str = r##"
let observer = null;
function observeHeadings() {
  if (observer) observer.disconnect();
  const entries = Array.from(document.querySelectorAll(".toc-entry"));
  observer = new IntersectionObserver((changes) => {
    changes.forEach((change) => {
      if (change.isIntersecting) {
        entries.forEach((entry) => {
          entry.classList.toggle("active", entry.getAttribute("href") === "#" + change.target.id);
        });
      }
    });
  }, { rootMargin: ROOT_MARGIN });
  entries.forEach((entry) => {
    const heading = document.getElementById(entry.getAttribute("href").slice(1));
    if (heading) observer.observe(heading);
  });
}
function showDocument(href, push) {
  fetch(href)
    .then((response) => {
      if (!response.ok) throw new Error(response.status);
      return response.text();
    })
    .then((text) => {
      const next = new DOMParser().parseFromString(text, "text/html");
      const docs = next.querySelector(".docs");
      if (!docs) throw new Error("not a document page");
      document.querySelector(".docs").replaceWith(docs);
      document.title = next.title;
      if (push) history.pushState({ href }, "", href);
      const hash = decodeURIComponent(new URL(href, location.href).hash.slice(1));
      const target = hash && document.getElementById(hash);
      if (target) target.scrollIntoView(); else window.scrollTo(0, 0);
      observeHeadings();
    })
    .catch(() => { window.location.href = href; });
}
document.addEventListener("click", (event) => {
  if (event.defaultPrevented || event.button !== 0) return;
  if (event.metaKey || event.ctrlKey || event.shiftKey || event.altKey) return;
  const doc = event.target.closest("a[data-doc]");
  if (doc) {
    event.preventDefault();
    showDocument(doc.href, true);
    return;
  }
  const anchor = event.target.closest("a[data-anchor]");
  if (anchor) {
    const target = document.getElementById(anchor.dataset.anchor);
    if (target) {
      event.preventDefault();
      target.scrollIntoView({ behavior: "smooth" });
    }
    return;
  }
  const button = event.target.closest("button.copy-button");
  if (button) {
    const code = button.closest(".code-block").querySelector("code").innerText;
    navigator.clipboard.writeText(code).catch(() => {});
    button.textContent = "Copied";
    setTimeout(() => { button.textContent = "Copy"; }, 2000);
  }
});
window.addEventListener("popstate", () => showDocument(location.href, false));
window.addEventListener("pagehide", () => { if (observer) observer.disconnect(); });
observeHeadings();
"##;
