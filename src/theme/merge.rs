//! Theme layering: engine defaults, additive extensions, category overrides.
//!
//! The merge starts from the default tree, replaces every overridden
//! category wholesale, then folds extension fragments in order. Override is
//! category-atomic: an extension touching an overridden category is dropped
//! in full, even for keys the override does not mention.

use super::tree::{ThemeTree, TokenMap, TokenValue};

/// Merge one extension tree and one override tree onto the defaults.
///
/// # Example
/// ```
/// use serde_json::json;
/// use windconf::theme::{merge, ThemeTree};
///
/// let default = ThemeTree::from_value(&json!({ "spacing": { "sm": 4, "md": 8 } }), "default")?;
/// let extend = ThemeTree::from_value(&json!({ "spacing": { "lg": 16 } }), "extend")?;
/// let overrides = ThemeTree::from_value(&json!({ "spacing": { "md": 99 } }), "override")?;
///
/// let resolved = merge(&default, &extend, &overrides);
/// assert_eq!(resolved.to_value(), json!({ "spacing": { "md": 99 } }));
/// # Ok::<(), windconf::ConfigError>(())
/// ```
pub fn merge(default: &ThemeTree, extend: &ThemeTree, overrides: &ThemeTree) -> ThemeTree {
    merge_layers(default, std::iter::once(extend), overrides)
}

/// Merge an ordered sequence of extension fragments onto the defaults.
///
/// Later fragments win on conflicting leaves. Folding `[A, B]` and then
/// `[C]` with the same overrides gives the same tree as folding `[A, B, C]`.
pub fn merge_layers<'a, I>(default: &ThemeTree, fragments: I, overrides: &ThemeTree) -> ThemeTree
where
    I: IntoIterator<Item = &'a ThemeTree>,
{
    let mut resolved = default.clone();

    for (category, tokens) in overrides.categories() {
        resolved.insert_category(category.clone(), tokens.clone());
    }

    for fragment in fragments {
        for (category, tokens) in fragment.categories() {
            if overrides.contains_category(category) {
                tracing::debug!(
                    category = %category,
                    "dropping extension of overridden theme category"
                );
                continue;
            }
            merge_tokens(resolved.category_entry(category), tokens);
        }
    }

    resolved
}

/// Additively merge `source` into `target`.
///
/// Leaves replace existing values; groups present on both sides merge
/// recursively; everything else is inserted.
pub fn merge_tokens(target: &mut TokenMap, source: &TokenMap) {
    for (key, value) in source {
        if let (Some(TokenValue::Group(existing)), TokenValue::Group(incoming)) =
            (target.get_mut(key), value)
        {
            merge_tokens(existing, incoming);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn tree(value: Value) -> ThemeTree {
        ThemeTree::from_value(&value, "test").unwrap()
    }

    #[test]
    fn test_override_is_category_atomic() {
        let default = tree(json!({ "spacing": { "sm": 4, "md": 8 } }));
        let extend = tree(json!({ "spacing": { "lg": 16 } }));
        let overrides = tree(json!({ "spacing": { "md": 99 } }));

        let resolved = merge(&default, &extend, &overrides);
        assert_eq!(resolved.to_value(), json!({ "spacing": { "md": 99 } }));
    }

    #[test]
    fn test_extend_adds_and_replaces_keys() {
        let default = tree(json!({ "spacing": { "sm": 4, "md": 8 } }));
        let extend = tree(json!({ "spacing": { "md": 10, "lg": 16 } }));

        let resolved = merge(&default, &extend, &ThemeTree::new());
        assert_eq!(resolved.to_value(), json!({ "spacing": { "sm": 4, "md": 10, "lg": 16 } }));
    }

    #[test]
    fn test_extend_creates_missing_category() {
        let default = tree(json!({ "spacing": { "sm": 4 } }));
        let extend = tree(json!({ "zIndex": { "modal": 50 } }));

        let resolved = merge(&default, &extend, &ThemeTree::new());
        assert!(resolved.contains_category("spacing"));
        assert_eq!(resolved.get("zIndex", "modal"), Some(&TokenValue::from(50)));
    }

    #[test]
    fn test_extend_merges_nested_groups() {
        let default = tree(json!({ "colors": { "blue": { "500": "#3b82f6", "600": "#2563eb" } } }));
        let extend = tree(json!({ "colors": { "blue": { "950": "#172554" } } }));

        let resolved = merge(&default, &extend, &ThemeTree::new());
        let blue = resolved.get("colors", "blue").and_then(TokenValue::as_group).unwrap();
        assert_eq!(blue.len(), 3);
    }

    #[test]
    fn test_leaf_replaces_group() {
        let default = tree(json!({ "colors": { "brand": { "500": "#111" } } }));
        let extend = tree(json!({ "colors": { "brand": "#222" } }));

        let resolved = merge(&default, &extend, &ThemeTree::new());
        assert_eq!(resolved.get("colors", "brand"), Some(&TokenValue::from("#222")));
    }

    #[test]
    fn test_override_leaves_other_categories() {
        let default = tree(json!({ "spacing": { "sm": 4 }, "colors": { "red": "#f00" } }));
        let extend = tree(json!({ "colors": { "green": "#0f0" } }));
        let overrides = tree(json!({ "spacing": { "xl": 32 } }));

        let resolved = merge(&default, &extend, &overrides);
        assert_eq!(
            resolved.to_value(),
            json!({ "spacing": { "xl": 32 }, "colors": { "red": "#f00", "green": "#0f0" } })
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let default = tree(json!({ "spacing": { "sm": 4 } }));
        let extend = tree(json!({ "spacing": { "lg": 16 } }));
        let overrides = tree(json!({ "colors": { "red": "#f00" } }));

        let first = merge(&default, &extend, &overrides);
        let second = merge(&default, &extend, &overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_later_fragment_wins() {
        let default = ThemeTree::new();
        let a = tree(json!({ "colors": { "brand": "#aaa" } }));
        let b = tree(json!({ "colors": { "brand": "#bbb" } }));

        let resolved = merge_layers(&default, [&a, &b], &ThemeTree::new());
        assert_eq!(resolved.get("colors", "brand"), Some(&TokenValue::from("#bbb")));
    }

    #[test]
    fn test_layers_associative_in_effect() {
        let default = tree(json!({ "spacing": { "sm": 4 } }));
        let a = tree(json!({ "spacing": { "md": 8 } }));
        let b = tree(json!({ "colors": { "red": "#f00" } }));
        let c = tree(json!({ "spacing": { "md": 9 }, "colors": { "blue": "#00f" } }));
        let overrides = ThemeTree::new();

        let staged = merge_layers(&merge_layers(&default, [&a, &b], &overrides), [&c], &overrides);
        let direct = merge_layers(&default, [&a, &b, &c], &overrides);
        assert_eq!(staged, direct);
    }
}
