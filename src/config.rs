use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::highlight::HighlightBackground;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::scroll::DEFAULT_THRESHOLD_PX;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub page_size: Option<usize>,
    pub scroll_threshold: Option<u32>,
    pub theme: Option<HighlightBackground>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: booleans accumulate, options from `other`
    /// win when set.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            perf: self.perf || other.perf,
            page_size: other.page_size.or(self.page_size),
            scroll_threshold: other.scroll_threshold.or(self.scroll_threshold),
            theme: other.theme.or(self.theme),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Effective page size for the listing.
    pub fn page_size(&self) -> usize {
        self.page_size.filter(|size| *size > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective active-section lookahead, in pixels.
    pub fn scroll_threshold(&self) -> f64 {
        self.scroll_threshold
            .map_or(DEFAULT_THRESHOLD_PX, f64::from)
    }

    pub fn theme(&self) -> HighlightBackground {
        self.theme.unwrap_or(HighlightBackground::Light)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("blockpress").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("blockpress")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("blockpress").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("blockpress")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".blockpressrc")
}

/// Read flags from a config file. A missing file yields the defaults.
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
    let mut lines = vec!["# blockpress defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(size) = flags.page_size {
        lines.push(format!("--page-size {size}"));
    }
    if let Some(threshold) = flags.scroll_threshold {
        lines.push(format!("--scroll-threshold {threshold}"));
    }
    if let Some(theme) = flags.theme {
        let theme = match theme {
            HighlightBackground::Light => "light",
            HighlightBackground::Dark => "dark",
        };
        lines.push(format!("--theme {theme}"));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
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

/// Pick the config flags out of raw arguments. Unknown tokens (the program
/// name, subcommands, file paths) are ignored, as are unparsable values.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--watch" => flags.watch = true,
            "--perf" => flags.perf = true,
            "--page-size" | "--scroll-threshold" | "--theme" | "--render-debug-log" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        tokens.get(i).map(String::as_str)
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--page-size" => flags.page_size = value.parse().ok(),
        "--scroll-threshold" => flags.scroll_threshold = value.parse().ok(),
        "--theme" => flags.theme = parse_theme(value),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_theme(s: &str) -> Option<HighlightBackground> {
    match s {
        "light" => Some(HighlightBackground::Light),
        "dark" => Some(HighlightBackground::Dark),
        _ => None,
    }
}
