//! Configuration schema and validation.
//!
//! Defines the recognized top-level options of a utility-CSS configuration
//! and turns an untyped raw tree into a [`ValidatedConfig`], filling in
//! defaults for anything omitted.
//!
//! Validation is pure: it never touches the file system. Pattern syntax and
//! root containment are checked later by the content resolver.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::theme::ThemeTree;

/// Top-level keys interpreted by the validator. Anything else lands in
/// [`ValidatedConfig::extra`].
pub const RECOGNIZED_KEYS: &[&str] = &["mode", "content", "theme", "plugins"];

/// Content discovery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Discover content files eagerly while resolving
    #[default]
    All,
    /// Build only the match predicate; discover on first use
    Lazy,
}

impl Mode {
    /// Parse a mode name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Mode::All),
            "lazy" => Some(Mode::Lazy),
            _ => None,
        }
    }

    /// The mode's configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Lazy => "lazy",
        }
    }

    /// Whether content is discovered during resolution
    pub fn is_eager(&self) -> bool {
        matches!(self, Mode::All)
    }
}

/// A single content source: a glob pattern with optional qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    /// Glob pattern; a leading `!` marks an exclusion
    pub pattern: String,
    /// Directory the pattern is relative to (itself relative to the project root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<PathBuf>,
    /// Restrict matches to these file extensions (without the dot)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

impl ContentSource {
    /// Create a source from a bare pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), base: None, extensions: Vec::new() }
    }

    /// Set the base directory
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Set the extension filter
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this source removes matches instead of adding them
    pub fn is_exclusion(&self) -> bool {
        self.pattern.starts_with('!')
    }
}

/// User theme layers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeSpec {
    /// Additive extensions (`theme.extend`)
    #[serde(default)]
    pub extend: ThemeTree,
    /// Category overrides (every other key under `theme`)
    #[serde(default)]
    pub overrides: ThemeTree,
}

/// A declared plugin reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRef {
    /// Plugin identity (name or path)
    pub name: String,
    /// Options payload handed to the plugin
    #[serde(default)]
    pub options: Value,
}

impl PluginRef {
    /// Create a reference without options
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: Value::Null }
    }

    /// Set the options payload
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

/// Configuration after validation and defaulting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedConfig {
    /// Content discovery mode
    pub mode: Mode,
    /// Content sources in declaration order
    pub content: Vec<ContentSource>,
    /// User theme layers
    pub theme: ThemeSpec,
    /// Plugins in declaration order
    pub plugins: Vec<PluginRef>,
    /// Unrecognized top-level keys, kept verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ValidatedConfig {
    /// Inclusion sources (everything without a leading `!`)
    pub fn inclusions(&self) -> impl Iterator<Item = &ContentSource> {
        self.content.iter().filter(|s| !s.is_exclusion())
    }
}

/// Validate a raw configuration tree.
///
/// # Errors
/// - [`ConfigError::InvalidField`] for type mismatches and unknown enum values
/// - [`ConfigError::EmptyContent`] when `mode` is `all` and no inclusion
///   pattern is declared
///
/// # Example
/// ```
/// use serde_json::json;
/// use windconf::config::{validate, Mode};
///
/// let config = validate(&json!({ "content": ["./src/**/*.{rs,html}"] }))?;
/// assert_eq!(config.mode, Mode::All);
/// assert!(config.plugins.is_empty());
/// # Ok::<(), windconf::ConfigError>(())
/// ```
pub fn validate(raw: &Value) -> Result<ValidatedConfig, ConfigError> {
    let Value::Object(root) = raw else {
        return Err(ConfigError::invalid_field("<root>", "object"));
    };

    let mode = validate_mode(root.get("mode"))?;
    let content = validate_content(root.get("content"))?;
    if mode.is_eager() && !content.iter().any(|s| !s.is_exclusion()) {
        return Err(ConfigError::EmptyContent);
    }
    let theme = validate_theme(root.get("theme"))?;
    let plugins = validate_plugins(root.get("plugins"))?;

    let extra = root
        .iter()
        .filter(|(key, _)| !RECOGNIZED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<BTreeMap<_, _>>();
    if !extra.is_empty() {
        tracing::debug!(keys = ?extra.keys().collect::<Vec<_>>(), "preserving unrecognized config keys");
    }

    Ok(ValidatedConfig { mode, content, theme, plugins, extra })
}

fn validate_mode(value: Option<&Value>) -> Result<Mode, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(Mode::default()),
        Some(Value::String(name)) => {
            Mode::parse(name).ok_or_else(|| ConfigError::invalid_field("mode", "\"all\" or \"lazy\""))
        }
        Some(_) => Err(ConfigError::invalid_field("mode", "string")),
    }
}

fn validate_content(value: Option<&Value>) -> Result<Vec<ContentSource>, ConfigError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ConfigError::invalid_field("content", "array")),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let path = format!("content[{}]", index);
            match entry {
                Value::String(pattern) => Ok(ContentSource::new(pattern.clone())),
                Value::Object(fields) => content_object(fields, &path),
                _ => Err(ConfigError::invalid_field(path, "string or object")),
            }
        })
        .collect()
}

fn content_object(fields: &Map<String, Value>, path: &str) -> Result<ContentSource, ConfigError> {
    let pattern = match fields.get("pattern") {
        Some(Value::String(pattern)) => pattern.clone(),
        _ => return Err(ConfigError::invalid_field(format!("{}.pattern", path), "string")),
    };

    let base = match fields.get("base") {
        None | Some(Value::Null) => None,
        Some(Value::String(base)) if base.is_empty() => None,
        Some(Value::String(base)) => Some(PathBuf::from(base)),
        Some(_) => return Err(ConfigError::invalid_field(format!("{}.base", path), "string")),
    };

    let extensions = match fields.get("extensions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let ext = item.as_str().map(|s| s.trim_start_matches('.')).unwrap_or_default();
                if ext.is_empty() {
                    Err(ConfigError::invalid_field(
                        format!("{}.extensions[{}]", path, i),
                        "non-empty string",
                    ))
                } else {
                    Ok(ext.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(ConfigError::invalid_field(format!("{}.extensions", path), "array")),
    };

    Ok(ContentSource { pattern, base, extensions })
}

fn validate_theme(value: Option<&Value>) -> Result<ThemeSpec, ConfigError> {
    let fields = match value {
        None | Some(Value::Null) => return Ok(ThemeSpec::default()),
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err(ConfigError::invalid_field("theme", "object")),
    };

    let extend = match fields.get("extend") {
        None | Some(Value::Null) => ThemeTree::new(),
        Some(extend) => ThemeTree::from_value(extend, "theme.extend")?,
    };

    let overrides: Map<String, Value> =
        fields.iter().filter(|(key, _)| key.as_str() != "extend").map(|(k, v)| (k.clone(), v.clone())).collect();
    let overrides = ThemeTree::from_value(&Value::Object(overrides), "theme")?;

    Ok(ThemeSpec { extend, overrides })
}

fn validate_plugins(value: Option<&Value>) -> Result<Vec<PluginRef>, ConfigError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ConfigError::invalid_field("plugins", "array")),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let path = format!("plugins[{}]", index);
            let plugin = match entry {
                Value::String(name) => PluginRef::new(name.trim()),
                Value::Object(fields) => {
                    let name = match fields.get("name") {
                        Some(Value::String(name)) => name.trim(),
                        _ => return Err(ConfigError::invalid_field(format!("{}.name", path), "string")),
                    };
                    let options = fields.get("options").cloned().unwrap_or(Value::Null);
                    PluginRef::new(name).with_options(options)
                }
                _ => return Err(ConfigError::invalid_field(path, "string or object")),
            };
            if plugin.name.is_empty() {
                return Err(ConfigError::invalid_field(path, "non-empty plugin name"));
            }
            Ok(plugin)
        })
        .collect()
}
