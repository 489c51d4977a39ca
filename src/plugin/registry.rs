//! Plugin registration: duplicate checks, catalog lookup, ordered execution.

use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::{Contribution, Plugin, PluginCatalog, UtilityRule};
use crate::config::PluginRef;
use crate::error::ConfigError;
use crate::theme::ThemeTree;

/// A declared plugin with its position in the declaration list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    /// Plugin identity
    pub name: String,
    /// Declaration order, starting at zero
    pub ordinal: usize,
    /// Options payload handed to the plugin
    pub options: Value,
}

impl PluginDescriptor {
    /// Create a descriptor without options
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self { name: name.into(), ordinal, options: Value::Null }
    }

    /// Set the options payload
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Assign declaration ordinals to validated plugin references.
    pub fn from_refs(refs: &[PluginRef]) -> Vec<Self> {
        refs.iter()
            .enumerate()
            .map(|(ordinal, r)| Self::new(r.name.clone(), ordinal).with_options(r.options.clone()))
            .collect()
    }
}

/// A plugin that ran successfully, with what it contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredPlugin {
    /// The declaration that produced it
    pub descriptor: PluginDescriptor,
    /// Its contribution
    pub contribution: Contribution,
}

/// Registered plugins in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct OrderedPluginSet {
    plugins: Vec<RegisteredPlugin>,
}

impl OrderedPluginSet {
    /// Registered plugins
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredPlugin> {
        self.plugins.iter()
    }

    /// Plugin identities in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.descriptor.name.as_str()).collect()
    }

    /// Theme fragments in declaration order
    pub fn theme_fragments(&self) -> impl Iterator<Item = &ThemeTree> {
        self.plugins.iter().map(|p| &p.contribution.theme)
    }

    /// All utility rules, each tagged with the plugin that emitted it
    pub fn utilities(&self) -> impl Iterator<Item = (&str, &UtilityRule)> {
        self.plugins.iter().flat_map(|p| {
            let name = p.descriptor.name.as_str();
            p.contribution.utilities.iter().map(move |rule| (name, rule))
        })
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Register plugins in declaration order.
///
/// Nothing executes until every identity has been checked for duplicates and
/// found in the catalog. A failing plugin aborts the whole registration; no
/// partial set is ever returned.
///
/// # Errors
/// - [`ConfigError::DuplicatePlugin`] when an identity is declared twice
/// - [`ConfigError::PluginFailure`] when a plugin is missing, returns an
///   error, or panics
pub fn register(
    descriptors: &[PluginDescriptor],
    catalog: &PluginCatalog,
) -> Result<OrderedPluginSet, ConfigError> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if !seen.insert(descriptor.name.as_str()) {
            return Err(ConfigError::DuplicatePlugin(descriptor.name.clone()));
        }
    }

    let resolved: Vec<(&PluginDescriptor, &Arc<dyn Plugin>)> = descriptors
        .iter()
        .map(|d| {
            catalog
                .get(&d.name)
                .map(|plugin| (d, plugin))
                .ok_or_else(|| ConfigError::plugin_failure(&d.name, "not found in plugin catalog"))
        })
        .collect::<Result<_, _>>()?;

    let mut plugins = Vec::with_capacity(resolved.len());
    for (descriptor, plugin) in resolved {
        let contribution = run_plugin(descriptor, plugin.as_ref())?;
        tracing::debug!(
            plugin = %descriptor.name,
            utilities = contribution.utilities.len(),
            categories = contribution.theme.len(),
            "registered plugin"
        );
        plugins.push(RegisteredPlugin { descriptor: descriptor.clone(), contribution });
    }

    Ok(OrderedPluginSet { plugins })
}

fn run_plugin(descriptor: &PluginDescriptor, plugin: &dyn Plugin) -> Result<Contribution, ConfigError> {
    match panic::catch_unwind(AssertUnwindSafe(|| plugin.contribute(&descriptor.options))) {
        Ok(Ok(contribution)) => Ok(contribution),
        Ok(Err(err)) => Err(ConfigError::plugin_failure(&descriptor.name, err.to_string())),
        Err(payload) => Err(ConfigError::plugin_failure(
            &descriptor.name,
            format!("panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{FnPlugin, PluginError};
    use crate::theme::TokenMap;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn catalog() -> PluginCatalog {
        PluginCatalog::new()
            .with(FnPlugin::new("forms", |_| {
                Ok(Contribution::new().with_utility("form-input", json!({ "appearance": "none" })))
            }))
            .with(FnPlugin::new("brand", |options| {
                let color = options.get("color").and_then(Value::as_str).unwrap_or("#000000");
                let mut tokens = TokenMap::new();
                tokens.insert("brand".into(), color.into());
                Ok(Contribution::new().with_tokens("colors", tokens))
            }))
            .with(FnPlugin::new("strict", |options| {
                if options.is_object() {
                    Ok(Contribution::new())
                } else {
                    Err(PluginError::InvalidOptions("expected object".into()))
                }
            }))
            .with(FnPlugin::new("explodes", |_| panic!("plugin blew up")))
    }

    #[test]
    fn test_register_preserves_order() {
        let descriptors = vec![
            PluginDescriptor::new("brand", 0).with_options(json!({ "color": "#ff0000" })),
            PluginDescriptor::new("forms", 1),
        ];
        let set = register(&descriptors, &catalog()).unwrap();

        assert_eq!(set.names(), vec!["brand", "forms"]);
        let utilities: Vec<_> = set.utilities().map(|(name, rule)| (name, rule.name.as_str())).collect();
        assert_eq!(utilities, vec![("forms", "form-input")]);

        let fragments: Vec<_> = set.theme_fragments().collect();
        assert_eq!(fragments[0].get("colors", "brand").and_then(|v| v.as_leaf()), Some(&json!("#ff0000")));
        assert!(fragments[1].is_empty());
    }

    #[test]
    fn test_register_empty() {
        let set = register(&[], &catalog()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_duplicate_detected_before_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let catalog = PluginCatalog::new().with(FnPlugin::new("counted", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Contribution::new())
        }));

        let descriptors = vec![PluginDescriptor::new("counted", 0), PluginDescriptor::new("counted", 1)];
        assert_eq!(
            register(&descriptors, &catalog),
            Err(ConfigError::DuplicatePlugin("counted".into()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_plugin() {
        let descriptors = vec![PluginDescriptor::new("forms", 0), PluginDescriptor::new("nope", 1)];
        assert_eq!(
            register(&descriptors, &catalog()),
            Err(ConfigError::plugin_failure("nope", "not found in plugin catalog"))
        );
    }

    #[test]
    fn test_plugin_error_aborts() {
        let descriptors = vec![PluginDescriptor::new("forms", 0), PluginDescriptor::new("strict", 1)];
        assert_eq!(
            register(&descriptors, &catalog()),
            Err(ConfigError::plugin_failure("strict", "invalid options: expected object"))
        );
    }

    #[test]
    fn test_plugin_panic_is_failure() {
        let descriptors = vec![PluginDescriptor::new("explodes", 0)];
        assert_eq!(
            register(&descriptors, &catalog()),
            Err(ConfigError::plugin_failure("explodes", "panicked: plugin blew up"))
        );
    }

    #[test]
    fn test_descriptors_from_refs() {
        let refs = vec![
            PluginRef::new("forms"),
            PluginRef::new("brand").with_options(json!({ "color": "#fff" })),
        ];
        let descriptors = PluginDescriptor::from_refs(&refs);
        assert_eq!(descriptors[1].ordinal, 1);
        assert_eq!(descriptors[1].options, json!({ "color": "#fff" }));
    }
}
