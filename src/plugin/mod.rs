//! Plugins: the contribution trait, the engine's catalog, and registration.
//!
//! A plugin receives its declared options and returns a [`Contribution`]:
//! a theme fragment folded into the extend path plus utility rules passed
//! through to the engine. Plugins cannot touch anything else.
//!
//! # Example
//! ```
//! use serde_json::json;
//! use windconf::plugin::{register, Contribution, PluginCatalog, PluginDescriptor, FnPlugin};
//!
//! let catalog = PluginCatalog::new().with(FnPlugin::new("forms", |_options| {
//!     Ok(Contribution::new().with_utility("form-input", json!({ "appearance": "none" })))
//! }));
//!
//! let plugins = register(&[PluginDescriptor::new("forms", 0)], &catalog)?;
//! assert_eq!(plugins.names(), vec!["forms"]);
//! # Ok::<(), windconf::ConfigError>(())
//! ```

mod registry;

pub use registry::{register, OrderedPluginSet, PluginDescriptor, RegisteredPlugin};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::theme::{ThemeTree, TokenMap};

/// Error returned by a plugin's contribution function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The declared options payload was not acceptable
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// Any other failure while producing the contribution
    #[error("{0}")]
    Failed(String),
}

/// A single utility rule produced by a plugin.
///
/// The definition is opaque to resolution and handed to the engine as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityRule {
    /// Utility class name
    pub name: String,
    /// Engine-specific rule body
    pub definition: Value,
}

/// Everything one plugin adds to a resolved configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contribution {
    /// Theme fragment applied on the extend path
    #[serde(default)]
    pub theme: ThemeTree,
    /// Utility rules in the order the plugin emitted them
    #[serde(default)]
    pub utilities: Vec<UtilityRule>,
}

impl Contribution {
    /// Create an empty contribution
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whole theme fragment
    pub fn with_theme(mut self, theme: ThemeTree) -> Self {
        self.theme = theme;
        self
    }

    /// Add tokens to one theme category
    pub fn with_tokens(mut self, category: impl Into<String>, tokens: TokenMap) -> Self {
        let category = category.into();
        crate::theme::merge_tokens(self.theme.category_entry(&category), &tokens);
        self
    }

    /// Append a utility rule
    pub fn with_utility(mut self, name: impl Into<String>, definition: Value) -> Self {
        self.utilities.push(UtilityRule { name: name.into(), definition });
        self
    }
}

/// A configuration plugin.
///
/// Implementations must be deterministic in their options: resolving the
/// same configuration twice has to produce equal contributions.
pub trait Plugin: Send + Sync {
    /// Identity used to look the plugin up from a declaration
    fn name(&self) -> &str;

    /// Produce this plugin's contribution for the given options.
    fn contribute(&self, options: &Value) -> Result<Contribution, PluginError>;
}

/// A plugin backed by a closure.
pub struct FnPlugin<F>
where
    F: Fn(&Value) -> Result<Contribution, PluginError> + Send + Sync,
{
    name: String,
    f: F,
}

impl<F> FnPlugin<F>
where
    F: Fn(&Value) -> Result<Contribution, PluginError> + Send + Sync,
{
    /// Wrap a closure under the given identity.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&Value) -> Result<Contribution, PluginError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn contribute(&self, options: &Value) -> Result<Contribution, PluginError> {
        (self.f)(options)
    }
}

/// Plugins available to resolution, keyed by identity.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin, replacing any previous plugin with the same identity.
    pub fn insert<P: Plugin + 'static>(&mut self, plugin: P) {
        self.insert_shared(Arc::new(plugin));
    }

    /// Add an already shared plugin
    pub fn insert_shared(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.insert(plugin);
        self
    }

    /// Look up a plugin by identity
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    /// Check if a plugin is available
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Sorted plugin identities
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog").field("plugins", &self.names()).finish()
    }
}
