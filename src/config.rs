//! Optional config file loading. Search order: ./chapscrape.toml, then
//! $XDG_CONFIG_HOME/chapscrape/config.toml (or ~/.config/chapscrape/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default archive path when --archive is not set. A directory resolves
    /// to store_content.txt within it. Paths are relative to CWD.
    pub archive_path: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Minimum script-character count for a chapter body.
    pub min_chars: Option<usize>,
    /// Base delay in milliseconds between requests.
    pub delay_base_ms: Option<u64>,
    /// Upper bound of the uniform jitter added to the delay, in milliseconds.
    pub delay_jitter_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Search order: (1) ./chapscrape.toml, (2) $XDG_CONFIG_HOME/chapscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("chapscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("chapscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
