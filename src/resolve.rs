//! Configuration resolution facade.
//!
//! Runs validation, content compilation and discovery, plugin registration,
//! and theme merging in a fixed order, and assembles the immutable
//! [`ResolvedConfig`] the engine consumes. The first failing stage ends
//! resolution and its error is returned as is.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cancel::CancelToken;
use crate::config::{validate, Mode};
use crate::content::{ContentFileSet, ContentMatcher};
use crate::error::ConfigError;
use crate::plugin::{self, OrderedPluginSet, Plugin, PluginCatalog, PluginDescriptor, UtilityRule};
use crate::theme::{builtin_theme, merge_layers, ThemeTree};

/// Engine-supplied inputs to resolution.
#[derive(Debug, Clone, Default)]
pub struct EngineDefaults {
    /// Default theme every configuration builds on
    pub theme: ThemeTree,
    /// Plugins that configurations may declare
    pub plugins: PluginCatalog,
}

impl EngineDefaults {
    /// Create defaults from a theme and a plugin catalog
    pub fn new(theme: ThemeTree, plugins: PluginCatalog) -> Self {
        Self { theme, plugins }
    }

    /// The built-in theme with an empty plugin catalog
    pub fn builtin() -> Self {
        Self::new(builtin_theme(), PluginCatalog::new())
    }

    /// Make a plugin available
    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.insert(plugin);
        self
    }
}

/// Content files of a resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFiles {
    /// Discovered while resolving
    Eager(ContentFileSet),
    /// Discovery deferred to the engine
    Deferred,
}

/// Fully resolved configuration.
///
/// Immutable once built; safe to share across threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    mode: Mode,
    project_root: PathBuf,
    content: ContentFiles,
    #[serde(skip)]
    matcher: ContentMatcher,
    theme: ThemeTree,
    plugins: OrderedPluginSet,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, Value>,
}

impl ResolvedConfig {
    /// Content discovery mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Absolute project root every pattern is resolved against
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Discovered files, or `None` when discovery was deferred
    pub fn content_files(&self) -> Option<&ContentFileSet> {
        match &self.content {
            ContentFiles::Eager(files) => Some(files),
            ContentFiles::Deferred => None,
        }
    }

    /// Content files as resolved
    pub fn content(&self) -> &ContentFiles {
        &self.content
    }

    /// Compiled content predicate
    pub fn matcher(&self) -> &ContentMatcher {
        &self.matcher
    }

    /// Check whether a path is content under this configuration
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.matches(path)
    }

    /// Content files, walking the file system when discovery was deferred.
    pub fn discover_content(&self) -> Result<ContentFileSet, ConfigError> {
        match &self.content {
            ContentFiles::Eager(files) => Ok(files.clone()),
            ContentFiles::Deferred => self.matcher.discover(&CancelToken::new()),
        }
    }

    /// Merged theme
    pub fn theme(&self) -> &ThemeTree {
        &self.theme
    }

    /// Registered plugins in declaration order
    pub fn plugins(&self) -> &OrderedPluginSet {
        &self.plugins
    }

    /// Plugin utility rules, tagged with their origin plugin
    pub fn utilities(&self) -> impl Iterator<Item = (&str, &UtilityRule)> {
        self.plugins.utilities()
    }

    /// Unrecognized top-level keys, kept verbatim
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

/// Resolve a raw configuration against a project root.
///
/// # Errors
/// Returns the first [`ConfigError`] raised by validation, content pattern
/// compilation, or plugin registration.
///
/// # Example
/// ```
/// use serde_json::json;
/// use windconf::{resolve, EngineDefaults};
///
/// let dir = tempfile::tempdir()?;
/// let raw = json!({ "mode": "lazy", "content": ["src/**/*.html"] });
/// let resolved = resolve(&raw, dir.path(), &EngineDefaults::builtin())?;
///
/// assert!(resolved.matches(std::path::Path::new("src/index.html")));
/// assert!(resolved.content_files().is_none());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn resolve(
    raw: &Value,
    project_root: &Path,
    defaults: &EngineDefaults,
) -> Result<ResolvedConfig, ConfigError> {
    resolve_with_cancel(raw, project_root, defaults, &CancelToken::new())
}

/// [`resolve`] with a cancellation token checked between stages and during
/// content discovery.
pub fn resolve_with_cancel(
    raw: &Value,
    project_root: &Path,
    defaults: &EngineDefaults,
    cancel: &CancelToken,
) -> Result<ResolvedConfig, ConfigError> {
    let start = Instant::now();

    let config = validate(raw)?;
    cancel.checkpoint()?;

    let matcher = ContentMatcher::compile(&config.content, project_root)?;
    let content = if config.mode.is_eager() {
        ContentFiles::Eager(matcher.discover(cancel)?)
    } else {
        ContentFiles::Deferred
    };
    cancel.checkpoint()?;

    let plugins = plugin::register(&PluginDescriptor::from_refs(&config.plugins), &defaults.plugins)?;
    cancel.checkpoint()?;

    let theme = merge_layers(
        &defaults.theme,
        plugins.theme_fragments().chain(iter::once(&config.theme.extend)),
        &config.theme.overrides,
    );

    tracing::info!(
        mode = config.mode.as_str(),
        root = %matcher.root().display(),
        files = match &content {
            ContentFiles::Eager(files) => files.len() as u64,
            ContentFiles::Deferred => 0,
        },
        plugins = plugins.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "resolved configuration"
    );

    Ok(ResolvedConfig {
        mode: config.mode,
        project_root: matcher.root().to_path_buf(),
        content,
        matcher,
        theme,
        plugins,
        extra: config.extra,
    })
}

/// Resolves configurations against shared engine defaults.
#[derive(Debug, Clone)]
pub struct Resolver {
    defaults: Arc<EngineDefaults>,
}

impl Resolver {
    /// Create a resolver owning its defaults
    pub fn new(defaults: EngineDefaults) -> Self {
        Self::from_shared(Arc::new(defaults))
    }

    /// Create a resolver over already shared defaults
    pub fn from_shared(defaults: Arc<EngineDefaults>) -> Self {
        Self { defaults }
    }

    /// Engine defaults in use
    pub fn defaults(&self) -> &EngineDefaults {
        &self.defaults
    }

    /// See [`resolve`]
    pub fn resolve(&self, raw: &Value, project_root: &Path) -> Result<ResolvedConfig, ConfigError> {
        resolve(raw, project_root, &self.defaults)
    }

    /// See [`resolve_with_cancel`]
    pub fn resolve_with_cancel(
        &self,
        raw: &Value,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ResolvedConfig, ConfigError> {
        resolve_with_cancel(raw, project_root, &self.defaults, cancel)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(EngineDefaults::builtin())
    }
}
