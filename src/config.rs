use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Defaults that can live in a config file.
///
/// Files hold the same flags as the command line, one or more per line.
/// Booleans are sticky (enabled anywhere means enabled); for valued options
/// the later source wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub doc: Option<String>,
    pub site: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub no_highlight: bool,
    pub verbose: bool,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            doc: other.doc.clone().or_else(|| self.doc.clone()),
            site: other.site.clone().or_else(|| self.site.clone()),
            ttl_secs: other.ttl_secs.or(self.ttl_secs),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            no_highlight: self.no_highlight || other.no_highlight,
            verbose: self.verbose || other.verbose,
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("docview").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("docview")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("docview").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("docview").join("config");
        }
    }

    PathBuf::from(".docviewrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".docviewrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# docview defaults (saved with --save)".to_string());
    if let Some(doc) = &flags.doc {
        lines.push(format!("--doc {doc}"));
    }
    if let Some(site) = &flags.site {
        lines.push(format!("--site {}", site.display()));
    }
    if let Some(ttl) = flags.ttl_secs {
        lines.push(format!("--ttl {ttl}"));
    }
    if let Some(timeout) = flags.timeout_secs {
        lines.push(format!("--timeout {timeout}"));
    }
    if flags.no_highlight {
        lines.push("--no-highlight".to_string());
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list, ignoring everything else.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline.map(str::to_string).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--no-highlight" => flags.no_highlight = true,
            "--verbose" | "-v" => flags.verbose = true,
            "--doc" | "-d" => flags.doc = value(),
            "--site" => flags.site = value().map(PathBuf::from),
            "--ttl" => flags.ttl_secs = value().and_then(|v| v.parse().ok()),
            "--timeout" => flags.timeout_secs = value().and_then(|v| v.parse().ok()),
            _ => {}
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "docview",
            "--doc",
            "usage",
            "--ttl=60",
            "--no-highlight",
            "--timeout",
            "5",
            "--toc",
            "-v",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.doc.as_deref(), Some("usage"));
        assert_eq!(flags.ttl_secs, Some(60));
        assert_eq!(flags.timeout_secs, Some(5));
        assert!(flags.no_highlight);
        assert!(flags.verbose);
        assert_eq!(flags.site, None);
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_numbers_and_trailing_flag() {
        let flags = parse_flag_tokens(&tokens(&["--ttl", "soon", "--doc"]));
        assert_eq!(flags.ttl_secs, None);
        assert_eq!(flags.doc, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            doc: Some("readme".into()),
            ttl_secs: Some(600),
            no_highlight: true,
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            doc: Some("theme".into()),
            verbose: true,
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert_eq!(merged.doc.as_deref(), Some("theme"));
        assert_eq!(merged.ttl_secs, Some(600));
        assert!(merged.no_highlight);
        assert!(merged.verbose);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".docviewrc");
        let flags = ConfigFlags {
            doc: Some("widgets".into()),
            site: Some(PathBuf::from("site.json")),
            ttl_secs: Some(30),
            timeout_secs: Some(10),
            no_highlight: true,
            verbose: true,
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
