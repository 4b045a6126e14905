//! Optional config file loading. Search order: ./nass-revenue.toml, then
//! $XDG_CONFIG_HOME/nass-revenue/config.toml (or ~/.config/nass-revenue/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when --output_path is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Overview page without a commodity table: skip (default) or fail.
    pub missing_table: Option<String>,
}

/// Search order: (1) ./nass-revenue.toml, (2) $XDG_CONFIG_HOME/nass-revenue/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("nass-revenue.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("nass-revenue").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            return load_config_file(path).map(Some);
        }
    }
    Ok(None)
}

/// Read and parse one config file.
pub fn load_config_file(path: &Path) -> Result<Config, String> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}
