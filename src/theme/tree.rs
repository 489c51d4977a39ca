//! Design-token tree types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Tokens of a single category, keyed by token name.
pub type TokenMap = BTreeMap<String, TokenValue>;

/// A design-token value.
///
/// Values are opaque to the merger: only the group/leaf shape matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    /// Nested token group (e.g., the shades of `colors.blue`)
    Group(TokenMap),
    /// Any non-object value: string, number, array, token reference
    Leaf(Value),
}

impl TokenValue {
    /// Convert a JSON value, turning objects into nested groups.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => TokenValue::Group(
                map.iter().map(|(k, v)| (k.clone(), TokenValue::from_value(v))).collect(),
            ),
            other => TokenValue::Leaf(other.clone()),
        }
    }

    /// Convert back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            TokenValue::Group(tokens) => tokens_to_value(tokens),
            TokenValue::Leaf(value) => value.clone(),
        }
    }

    /// The leaf value, if this is a leaf
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            TokenValue::Leaf(value) => Some(value),
            TokenValue::Group(_) => None,
        }
    }

    /// The nested tokens, if this is a group
    pub fn as_group(&self) -> Option<&TokenMap> {
        match self {
            TokenValue::Group(tokens) => Some(tokens),
            TokenValue::Leaf(_) => None,
        }
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Leaf(Value::String(value.to_string()))
    }
}

impl From<i64> for TokenValue {
    fn from(value: i64) -> Self {
        TokenValue::Leaf(Value::from(value))
    }
}

fn tokens_to_value(tokens: &TokenMap) -> Value {
    Value::Object(tokens.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
}

/// Theme tree: token category -> token name -> value.
///
/// Backed by ordered maps so equality and serialization never depend on
/// insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeTree {
    categories: BTreeMap<String, TokenMap>,
}

impl ThemeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tree from a JSON object whose values are category objects.
    ///
    /// `path` names the object in error messages (e.g., "theme.extend").
    pub fn from_value(value: &Value, path: &str) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::invalid_field(path, "object"));
        };

        let mut tree = ThemeTree::new();
        for (category, tokens) in map {
            let tokens = category_from_value(tokens, &format!("{}.{}", path, category))?;
            tree.categories.insert(category.clone(), tokens);
        }
        Ok(tree)
    }

    /// Convert into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.categories.iter().map(|(k, v)| (k.clone(), tokens_to_value(v))).collect(),
        )
    }

    /// Get the tokens of a category.
    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.categories.get(name)
    }

    /// Check if a category is present.
    pub fn contains_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Iterate categories in name order.
    pub fn categories(&self) -> impl Iterator<Item = (&String, &TokenMap)> {
        self.categories.iter()
    }

    /// Category names in name order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if the tree has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Insert or replace a whole category, returning the previous tokens.
    pub fn insert_category(
        &mut self,
        name: impl Into<String>,
        tokens: TokenMap,
    ) -> Option<TokenMap> {
        self.categories.insert(name.into(), tokens)
    }

    /// Mutable access to a category, creating it empty if absent.
    pub(crate) fn category_entry(&mut self, name: &str) -> &mut TokenMap {
        self.categories.entry(name.to_string()).or_default()
    }

    /// Look up a single token in a category.
    pub fn get(&self, category: &str, token: &str) -> Option<&TokenValue> {
        self.categories.get(category)?.get(token)
    }

    /// Look up a nested token by path segments (category first).
    ///
    /// Segments are taken literally, so token names containing dots such
    /// as spacing `"0.5"` are addressed as a single segment.
    pub fn lookup(&self, path: &[&str]) -> Option<&TokenValue> {
        let (category, rest) = path.split_first()?;
        let (first, rest) = rest.split_first()?;
        let mut current = self.get(category, first)?;
        for segment in rest {
            current = current.as_group()?.get(*segment)?;
        }
        Some(current)
    }
}

fn category_from_value(value: &Value, path: &str) -> Result<TokenMap, ConfigError> {
    match TokenValue::from_value(value) {
        TokenValue::Group(tokens) => Ok(tokens),
        TokenValue::Leaf(_) => Err(ConfigError::invalid_field(path, "object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_nested() {
        let tree = ThemeTree::from_value(
            &json!({
                "colors": { "blue": { "500": "#3b82f6" }, "white": "#fff" },
                "spacing": { "0.5": "0.125rem" }
            }),
            "theme",
        )
        .unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("colors", "white"), Some(&TokenValue::from("#fff")));
        assert_eq!(tree.lookup(&["colors", "blue", "500"]), Some(&TokenValue::from("#3b82f6")));
        assert_eq!(tree.get("spacing", "0.5"), Some(&TokenValue::from("0.125rem")));
    }

    #[test]
    fn test_from_value_rejects_non_object_category() {
        let err = ThemeTree::from_value(&json!({ "colors": "red" }), "theme.extend").unwrap_err();
        assert_eq!(err, ConfigError::invalid_field("theme.extend.colors", "object"));
    }

    #[test]
    fn test_from_value_rejects_non_object_root() {
        let err = ThemeTree::from_value(&json!([1, 2]), "theme").unwrap_err();
        assert_eq!(err, ConfigError::invalid_field("theme", "object"));
    }

    #[test]
    fn test_arrays_are_leaves() {
        let tree =
            ThemeTree::from_value(&json!({ "fontFamily": { "sans": ["Inter", "sans-serif"] } }), "t")
                .unwrap();
        let sans = tree.get("fontFamily", "sans").unwrap();
        assert_eq!(sans.as_leaf(), Some(&json!(["Inter", "sans-serif"])));
    }

    #[test]
    fn test_value_round_trip_shape() {
        let source = json!({ "colors": { "blue": { "500": "#3b82f6" } } });
        let tree = ThemeTree::from_value(&source, "theme").unwrap();
        assert_eq!(tree.to_value(), source);
    }

    #[test]
    fn test_lookup_missing_segments() {
        let tree = ThemeTree::from_value(&json!({ "colors": { "red": "#f00" } }), "t").unwrap();
        assert!(tree.lookup(&["colors"]).is_none());
        assert!(tree.lookup(&["colors", "red", "500"]).is_none());
        assert!(tree.lookup(&[]).is_none());
    }

    #[test]
    fn test_serde_transparent() {
        let tree = ThemeTree::from_value(&json!({ "spacing": { "sm": 4 } }), "t").unwrap();
        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(text, r#"{"spacing":{"sm":4}}"#);
        let back: ThemeTree = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tree);
    }
}
