//! docview - render a repository's markdown documentation as a browsable site.
//!
//! # Usage
//!
//! ```bash
//! docview                              # readme page to stdout
//! docview --doc usage -o usage.html
//! docview --doc widgets --toc          # table of contents as JSON
//! docview --doc usage --resolve ./theme.md#palettes
//! docview --export site/
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docview::app::{Message, Phase, Viewer};
use docview::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use docview::fetch::{DEFAULT_TTL, Fetcher, HttpTransport};
use docview::location::{DOC_PARAM, Location};
use docview::site::Site;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const EXPORT_ROUTE: &str = "{id}.html";

/// Render remote markdown documentation with a table of contents
#[derive(Parser, Debug)]
#[command(name = "docview", version, about, long_about = None)]
struct Cli {
    /// Document id to show (defaults to the site's default document)
    #[arg(short, long, value_name = "ID")]
    doc: Option<String>,

    /// Start from an address bar location, e.g. "/docs?doc=usage#install"
    #[arg(long, value_name = "URL", conflicts_with = "doc")]
    location: Option<String>,

    /// Load the document registry from a JSON file
    #[arg(long, value_name = "FILE")]
    site: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the table of contents as JSON
    #[arg(long, conflicts_with_all = ["resolve", "export", "body"])]
    toc: bool,

    /// Print only the rendered HTML fragment, without the page around it
    #[arg(long)]
    body: bool,

    /// Classify a link as it would appear in the selected document
    #[arg(long, value_name = "HREF", conflicts_with = "export")]
    resolve: Option<String>,

    /// Render every document into a directory of linked pages
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Seconds a fetched document is reused before fetching again
    #[arg(long, value_name = "SECS")]
    ttl: Option<u64>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Disable syntax highlighting in code blocks
    #[arg(long)]
    no_highlight: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_site(path: Option<&Path>) -> Result<Site> {
    match path {
        Some(path) => Site::from_json_file(path).context("Failed to load site"),
        None => Ok(Site::builtin()),
    }
}

fn start_location(cli: &Cli, effective: &ConfigFlags) -> Location {
    if let Some(location) = &cli.location {
        return Location::parse(location);
    }
    let location = Location::parse("/docs");
    match &effective.doc {
        Some(doc) => location.with_query_param(DOC_PARAM, doc),
        None => location,
    }
}

fn make_viewer(site: Site, location: &Location, effective: &ConfigFlags) -> Viewer<HttpTransport> {
    let timeout = Duration::from_secs(effective.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let ttl = effective.ttl_secs.map_or(DEFAULT_TTL, Duration::from_secs);
    let fetcher = Fetcher::for_site(HttpTransport::new(timeout), &site).with_ttl(ttl);
    Viewer::new(site, fetcher, location).with_highlight(!effective.no_highlight)
}

/// Wait for the selected document; a failed fetch still leaves the fallback page.
fn wait_for_document(viewer: &mut Viewer<HttpTransport>, timeout: Duration) -> Result<()> {
    if !viewer.wait_until_loaded(timeout + Duration::from_secs(1)) {
        anyhow::bail!("Timed out loading {}", viewer.model().selected);
    }
    if let Phase::Failed(err) = &viewer.model().phase {
        eprintln!(
            "[warn] Could not load {}: {err}; showing fallback page",
            viewer.model().selected
        );
    }
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(content.as_bytes())
                .and_then(|()| out.flush())
                .context("Failed to write to stdout")
        }
    }
}

fn resolve_link(site: Site, location: &Location, href: &str) -> Result<String> {
    let doc_id = site.initial_doc(location).to_string();
    let doc = site
        .document(&doc_id)
        .with_context(|| format!("Unknown document {doc_id}"))?;
    let link = site
        .link_resolver()
        .resolve(Some(href), Site::link_context(doc));
    let mut json = serde_json::to_string_pretty(&link).context("Failed to encode link")?;
    json.push('\n');
    Ok(json)
}

fn export_site(mut site: Site, effective: &ConfigFlags, dir: &Path, timeout: Duration) -> Result<()> {
    site.route = EXPORT_ROUTE.to_string();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let ids: Vec<String> = site.doc_ids().map(str::to_string).collect();
    let location = Location::parse("/docs");
    let mut viewer = make_viewer(site, &location, effective);
    for id in ids {
        if viewer.model().selected != id {
            viewer.dispatch(Message::Select(id.clone()));
        }
        wait_for_document(&mut viewer, timeout)?;
        let page = viewer
            .page()
            .with_context(|| format!("Unknown document {id}"))?;
        let path = dir.join(format!("{id}.html"));
        fs::write(&path, page).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    init_logging(effective.verbose);

    let site = load_site(effective.site.as_deref())?;
    let location = start_location(&cli, &effective);
    let timeout = Duration::from_secs(effective.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    if let Some(href) = &cli.resolve {
        return write_output(cli.output.as_deref(), &resolve_link(site, &location, href)?);
    }
    if let Some(dir) = &cli.export {
        return export_site(site, &effective, dir, timeout);
    }

    let mut viewer = make_viewer(site, &location, &effective);
    wait_for_document(&mut viewer, timeout)?;

    let content = if cli.toc {
        let mut json =
            serde_json::to_string_pretty(&viewer.model().toc).context("Failed to encode toc")?;
        json.push('\n');
        json
    } else if cli.body {
        viewer.model().rendered.html.clone()
    } else {
        viewer.page().context("Selected document is not registered")?
    };
    write_output(cli.output.as_deref(), &content)
}
