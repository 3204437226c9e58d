//! End-to-end checks through the public API: fetch, render, navigate.

use std::sync::Mutex;
use std::time::Duration;

use docview::app::{Message, Phase, Viewer};
use docview::document::{RenderContext, extract_toc, render_markdown};
use docview::fetch::{FetchError, Fetcher, Transport};
use docview::links::LinkKind;
use docview::location::Location;
use docview::site::Site;

const RAW: &str = "https://raw.githubusercontent.com/creeper5820/creeper-qt/main";

const README: &str = "\
# Creeper-Qt

## Features

Read the [usage guide](doc/usage.md) or the [theme guide](doc/theme.md#palettes).

![logo](doc/image/logo.png)

## License

See [LICENSE](LICENSE).
";

const THEME: &str = "\
# Theme

## Palettes

```cpp
auto theme = ThemeManager {};
```

## Palettes

Back to [usage](./usage.md) or [top](#palettes).
";

#[derive(Default)]
struct MapTransport {
    pages: Vec<(String, String)>,
    requests: Mutex<Vec<String>>,
}

impl MapTransport {
    fn with(mut self, path: &str, body: &str) -> Self {
        self.pages.push((format!("{RAW}/{path}"), body.to_string()));
        self
    }
}

impl Transport for MapTransport {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .iter()
            .find(|(page, _)| page == url)
            .map(|(_, body)| body.clone())
            .ok_or(FetchError::Status(404))
    }
}

fn render(markdown: &str, doc_id: &str) -> docview::document::RenderedDocument {
    let site = Site::builtin();
    let resolver = site.link_resolver();
    let doc = site.document(doc_id).unwrap();
    let ctx = RenderContext::for_document(&site, &resolver, doc).with_highlight(false);
    render_markdown(markdown, &ctx).unwrap()
}

#[test]
fn test_rendered_headings_carry_toc_ids() {
    let rendered = render(THEME, "theme");
    let ids: Vec<_> = rendered.toc.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["palettes", "palettes-1"]);
    assert!(rendered.html.contains("<h2 id=\"palettes\">"));
    assert!(rendered.html.contains("<h2 id=\"palettes-1\">"));
    assert_eq!(rendered.toc, extract_toc(THEME));
}

#[test]
fn test_links_are_rewritten_by_kind() {
    let rendered = render(README, "readme");
    assert!(rendered.html.contains("href=\"/docs?doc=usage\""));
    assert!(rendered.html.contains("href=\"/docs?doc=theme#palettes\""));
    assert!(
        rendered
            .html
            .contains("href=\"https://github.com/creeper5820/creeper-qt/blob/main/LICENSE\"")
    );
    assert!(rendered.html.contains("target=\"_blank\""));
    assert!(
        rendered
            .html
            .contains("src=\"https://raw.githubusercontent.com/creeper5820/creeper-qt/main/doc/image/logo.png\"")
    );
}

#[test]
fn test_code_blocks_are_collected() {
    let rendered = render(THEME, "theme");
    assert_eq!(rendered.code_blocks.len(), 1);
    assert_eq!(rendered.code_blocks[0].language, "cpp");
    assert!(rendered.code_blocks[0].code.contains("ThemeManager"));
    assert!(rendered.html.contains("copy-button"));
}

#[test]
fn test_resolver_classifies_every_href() {
    let site = Site::builtin();
    let resolver = site.link_resolver();
    let ctx = Site::link_context(site.document("usage").unwrap());
    for href in ["", "#x", "widgets.md", "../README.md", "https://a.b", "mailto:a@b.c", "img.png"] {
        let link = resolver.resolve(Some(href), ctx);
        assert!(!link.url.is_empty(), "empty url for {href:?}");
    }
    assert!(matches!(
        resolver.resolve(Some("../README.md"), ctx).kind,
        LinkKind::InternalDoc { .. }
    ));
    assert_eq!(resolver.resolve(None, ctx).url, "#");
}

#[test]
fn test_viewer_navigates_between_documents() {
    let transport = MapTransport::default()
        .with("README.md", README)
        .with("doc/theme.md", THEME);
    let site = Site::builtin();
    let fetcher = Fetcher::for_site(transport, &site);
    let mut viewer =
        Viewer::new(site, fetcher, &Location::parse("/docs")).with_highlight(false);

    assert!(viewer.wait_until_loaded(Duration::from_secs(5)));
    assert_eq!(viewer.model().phase, Phase::Ready);
    assert_eq!(viewer.model().selected, "readme");

    viewer.dispatch(Message::FollowLink(Some("doc/theme.md#palettes".into())));
    assert!(viewer.wait_until_loaded(Duration::from_secs(5)));
    assert_eq!(viewer.model().selected, "theme");
    assert_eq!(viewer.model().location().to_string(), "/docs?doc=theme#palettes");
    assert!(viewer.model().scroll_target.is_none());

    let page = viewer.page().unwrap();
    assert!(page.contains("Theming guide"));
    assert!(page.contains("href=\"#palettes-1\""));

    viewer.dispatch(Message::Select("usage".into()));
    assert!(viewer.wait_until_loaded(Duration::from_secs(5)));
    assert!(matches!(viewer.model().phase, Phase::Failed(FetchError::Status(404))));
    assert!(viewer.model().toc.is_empty());
    assert!(viewer.page().unwrap().contains("Could not load document"));

    let requests = viewer.fetcher().transport().requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        [
            format!("{RAW}/README.md"),
            format!("{RAW}/doc/theme.md"),
            format!("{RAW}/doc/usage.md"),
        ]
    );
}
