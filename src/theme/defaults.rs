//! Built-in default design tokens.
//!
//! A compact token set the engine ships with. Users extend it through
//! `theme.extend` or replace categories through direct `theme` keys.

use super::tree::{ThemeTree, TokenMap, TokenValue};

/// Categories present in the built-in theme.
const BUILTIN_CATEGORIES: &[&str] =
    &["screens", "colors", "spacing", "borderRadius", "fontSize", "fontWeight", "opacity"];

/// Returns the names of all built-in categories.
pub fn builtin_categories() -> Vec<&'static str> {
    BUILTIN_CATEGORIES.to_vec()
}

/// Build the complete built-in theme.
pub fn builtin_theme() -> ThemeTree {
    let mut theme = ThemeTree::new();
    for name in BUILTIN_CATEGORIES {
        if let Some(tokens) = builtin_category(name) {
            theme.insert_category(*name, tokens);
        }
    }
    theme
}

/// Returns a built-in category by name, or None if not found.
pub fn builtin_category(name: &str) -> Option<TokenMap> {
    match name {
        "screens" => Some(screens()),
        "colors" => Some(colors()),
        "spacing" => Some(spacing()),
        "borderRadius" => Some(border_radius()),
        "fontSize" => Some(font_size()),
        "fontWeight" => Some(font_weight()),
        "opacity" => Some(opacity()),
        _ => None,
    }
}

fn leaves(pairs: &[(&str, &str)]) -> TokenMap {
    pairs.iter().map(|(k, v)| (k.to_string(), TokenValue::from(*v))).collect()
}

fn screens() -> TokenMap {
    leaves(&[
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ])
}

/// Shade scale shared by the chromatic palette entries.
fn shades(values: &[(&str, &str)]) -> TokenValue {
    TokenValue::Group(leaves(values))
}

fn colors() -> TokenMap {
    let mut tokens = leaves(&[
        ("inherit", "inherit"),
        ("current", "currentColor"),
        ("transparent", "transparent"),
        ("black", "#000"),
        ("white", "#fff"),
    ]);
    tokens.insert(
        "gray".to_string(),
        shades(&[
            ("100", "#f3f4f6"),
            ("300", "#d1d5db"),
            ("500", "#6b7280"),
            ("700", "#374151"),
            ("900", "#111827"),
        ]),
    );
    tokens.insert(
        "red".to_string(),
        shades(&[
            ("100", "#fee2e2"),
            ("300", "#fca5a5"),
            ("500", "#ef4444"),
            ("700", "#b91c1c"),
            ("900", "#7f1d1d"),
        ]),
    );
    tokens.insert(
        "blue".to_string(),
        shades(&[
            ("100", "#dbeafe"),
            ("300", "#93c5fd"),
            ("500", "#3b82f6"),
            ("700", "#1d4ed8"),
            ("900", "#1e3a8a"),
        ]),
    );
    tokens
}

fn spacing() -> TokenMap {
    leaves(&[
        ("px", "1px"),
        ("0", "0px"),
        ("0.5", "0.125rem"),
        ("1", "0.25rem"),
        ("2", "0.5rem"),
        ("4", "1rem"),
        ("8", "2rem"),
        ("16", "4rem"),
    ])
}

fn border_radius() -> TokenMap {
    leaves(&[
        ("none", "0px"),
        ("sm", "0.125rem"),
        ("DEFAULT", "0.25rem"),
        ("lg", "0.5rem"),
        ("full", "9999px"),
    ])
}

fn font_size() -> TokenMap {
    leaves(&[
        ("xs", "0.75rem"),
        ("sm", "0.875rem"),
        ("base", "1rem"),
        ("lg", "1.125rem"),
        ("xl", "1.25rem"),
    ])
}

fn font_weight() -> TokenMap {
    leaves(&[("normal", "400"), ("medium", "500"), ("semibold", "600"), ("bold", "700")])
}

fn opacity() -> TokenMap {
    leaves(&[("0", "0"), ("50", "0.5"), ("100", "1")])
}
