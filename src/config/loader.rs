//! Configuration file discovery and loading.
//!
//! Finds a configuration file by walking up from a directory and parses it
//! into an untyped raw tree for [`validate`](super::validate).

use regex::Regex;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::error::ConfigError;

/// File names recognized as configuration, in lookup priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "windconf.toml",
    "windconf.json",
    "windconf.json5",
    "tailwind.config.json",
    "tailwind.config.js",
    "tailwind.config.cjs",
];

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// File I/O error
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// TOML parsing error
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parsing error
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    /// JSON5 / JS object literal parsing error
    #[error("Failed to parse config object: {0}")]
    Json5(#[from] json5::Error),
    /// File extension is not a known config format
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// No configuration file found
    #[error("No config file found from {}", .0.display())]
    NotFound(PathBuf),
    /// The loaded configuration failed resolution
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LoadError {
    /// The resolution error, if this failure came from resolution
    pub fn as_config_error(&self) -> Option<&ConfigError> {
        match self {
            LoadError::Config(err) => Some(err),
            _ => None,
        }
    }
}

/// A configuration file read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Location of the file
    pub path: PathBuf,
    /// Parsed, unvalidated contents
    pub raw: Value,
}

impl ConfigFile {
    /// Directory containing the configuration file.
    pub fn project_root(&self) -> &Path {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// Find a configuration file by walking up from a specific directory.
///
/// Within one directory, [`CONFIG_FILE_NAMES`] order decides which file wins.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a configuration file.
///
/// With an explicit path, loads that file. Otherwise walks up from the
/// current directory.
///
/// # Example
/// ```ignore
/// let file = load_config(None)?;
/// let resolved = resolve(&file.raw, file.project_root(), &EngineDefaults::builtin())?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, LoadError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let cwd = env::current_dir().map_err(|source| LoadError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            find_config_from(cwd.clone()).ok_or(LoadError::NotFound(cwd))?
        }
    };

    let raw = load_raw_config(&path)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(ConfigFile { path, raw })
}

/// Read and parse a configuration file into a raw tree.
///
/// The format is chosen by extension: `toml`, `json`, or `json5`/`js`/`cjs`/`mjs`.
pub fn load_raw_config(path: &Path) -> Result<Value, LoadError> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let contents = fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    parse_raw_config(&contents, format)
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// Strict JSON
    Json,
    /// JSON5, or a JS module exporting an object literal
    Json5,
}

impl ConfigFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(ConfigFormat::Toml),
            Some("json") => Some(ConfigFormat::Json),
            Some("json5") | Some("js") | Some("cjs") | Some("mjs") => Some(ConfigFormat::Json5),
            _ => None,
        }
    }
}

/// Parse configuration text in the given format.
pub fn parse_raw_config(contents: &str, format: ConfigFormat) -> Result<Value, LoadError> {
    match format {
        ConfigFormat::Toml => {
            let value: toml::Value = toml::from_str(contents)?;
            Ok(serde_json::to_value(value)?)
        }
        ConfigFormat::Json => Ok(serde_json::from_str(contents)?),
        ConfigFormat::Json5 => Ok(json5::from_str(&strip_module_wrapper(contents))?),
    }
}

fn export_marker() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"(?:module\.exports\s*=|export\s+default)\s*").ok())
        .as_ref()
}

/// Remove a `module.exports =` / `export default` wrapper and trailing `;`
/// so a JS config holding a plain object literal parses as JSON5.
fn strip_module_wrapper(contents: &str) -> String {
    let body = match export_marker() {
        Some(marker) => marker.replace(contents, "").into_owned(),
        None => contents.to_string(),
    };
    body.trim_end().trim_end_matches(';').to_string()
}
