//! Property-based tests for theme merging and content matching.

use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use windconf::config::ContentSource;
use windconf::content::{expand_braces, ContentMatcher};
use windconf::CancelToken;
use windconf::theme::{merge_layers, ThemeTree, TokenMap, TokenValue};

// ============================================================================
// Strategies
// ============================================================================

fn token_value() -> impl Strategy<Value = TokenValue> {
    let leaf = (0i64..100).prop_map(TokenValue::from);
    leaf.prop_recursive(2, 12, 3, |inner| {
        prop::collection::btree_map("[a-c]", inner, 0..3).prop_map(TokenValue::Group)
    })
}

fn token_map() -> impl Strategy<Value = TokenMap> {
    prop::collection::btree_map("[a-d]{1,2}", token_value(), 0..4)
}

fn theme_tree() -> impl Strategy<Value = ThemeTree> {
    let category = prop::sample::select(vec!["colors", "spacing", "screens", "opacity"]);
    prop::collection::btree_map(category, token_map(), 0..3).prop_map(|categories| {
        let mut tree = ThemeTree::new();
        for (name, tokens) in categories {
            tree.insert_category(name, tokens);
        }
        tree
    })
}

const PATTERN_POOL: &[&str] = &[
    "src/**/*.rs",
    "src/*.html",
    "**/*.{ts,tsx}",
    "docs/**/*.md",
    "!src/generated/**",
    "!**/*.test.ts",
    "app/{pages,components}/**/*.jsx",
];

fn content_path() -> impl Strategy<Value = PathBuf> {
    let dir = prop::sample::select(vec!["src", "docs", "app", "node_modules", "src/generated"]);
    let sub = prop::sample::select(vec!["", "pages", "components", "deep/er"]);
    let file = prop::sample::select(vec!["a.rs", "b.html", "c.ts", "d.test.ts", "e.tsx", "f.md", "g.jsx"]);
    (dir, sub, file).prop_map(|(dir, sub, file)| {
        let mut path = PathBuf::from(dir);
        if !sub.is_empty() {
            path.push(sub);
        }
        path.push(file);
        path
    })
}

/// Patterns mixing nested, bounded and unbounded bases, some inside excluded dirs.
const DISCOVERY_POOL: &[&str] = &[
    "**/*.rs",
    "src/**/*.{rs,html}",
    "src/ui/*.html",
    "src/*/*.ts",
    "node_modules/ui/dist/*.js",
    "node_modules/ui/**/*.rs",
    "src/.git/hooks/*",
    "!src/ui/skip.html",
    "!**/*.test.ts",
];

const TREE_POOL: &[&str] = &[
    "app.rs",
    "index.html",
    "src/lib.rs",
    "src/index.html",
    "src/ui/button.html",
    "src/ui/skip.html",
    "src/ui/widget.ts",
    "src/ui/widget.test.ts",
    "src/deep/er/mod.rs",
    "src/.git/hooks/pre-commit",
    "src/node_modules/pkg/index.rs",
    "node_modules/ui/dist/button.js",
    "node_modules/ui/dist/nested/extra.js",
    "node_modules/ui/src/lib.rs",
    ".git/config.rs",
];

fn matcher(patterns: &[&str]) -> ContentMatcher {
    let sources: Vec<ContentSource> = patterns.iter().map(|p| ContentSource::new(*p)).collect();
    ContentMatcher::compile(&sources, Path::new("/project")).unwrap()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Folding extension fragments in two batches equals folding them at once.
    #[test]
    fn extend_is_associative(
        default in theme_tree(),
        a in theme_tree(),
        b in theme_tree(),
        c in theme_tree(),
        overrides in theme_tree(),
    ) {
        let staged = merge_layers(&merge_layers(&default, [&a, &b], &overrides), [&c], &overrides);
        let single = merge_layers(&default, [&a, &b, &c], &overrides);
        prop_assert_eq!(staged, single);
    }

    /// Applying the same fragment twice changes nothing.
    #[test]
    fn extend_is_idempotent(default in theme_tree(), a in theme_tree()) {
        let none = ThemeTree::new();
        let once = merge_layers(&default, [&a], &none);
        let twice = merge_layers(&default, [&a, &a], &none);
        prop_assert_eq!(once, twice);
    }

    /// An overridden category equals the override exactly, whatever extends it.
    #[test]
    fn override_is_category_atomic(
        default in theme_tree(),
        extend in theme_tree(),
        overrides in theme_tree(),
    ) {
        let resolved = merge_layers(&default, [&extend], &overrides);
        for (category, tokens) in overrides.categories() {
            prop_assert_eq!(resolved.category(category), Some(tokens));
        }
    }

    /// Brace alternative order never changes the expansion.
    #[test]
    fn brace_order_is_irrelevant(
        alternatives in prop::collection::vec("[a-z]{1,4}", 1..5).prop_shuffle(),
    ) {
        let mut sorted = alternatives.clone();
        sorted.sort();
        let shuffled = expand_braces(&format!("src/**/*.{{{}}}", alternatives.join(","))).unwrap();
        let ordered = expand_braces(&format!("src/**/*.{{{}}}", sorted.join(","))).unwrap();
        prop_assert_eq!(shuffled, ordered);
    }

    /// Permuting content patterns never changes what matches.
    #[test]
    fn pattern_order_is_irrelevant(
        patterns in prop::sample::subsequence(PATTERN_POOL.to_vec(), 1..PATTERN_POOL.len()),
        seed in any::<u64>(),
        paths in prop::collection::vec(content_path(), 1..20),
    ) {
        let mut permuted = patterns.clone();
        let len = permuted.len();
        permuted.rotate_left((seed as usize) % len);
        permuted.reverse();

        let forward = matcher(&patterns);
        let backward = matcher(&permuted);
        for path in &paths {
            prop_assert_eq!(forward.matches(path), backward.matches(path), "path {:?}", path);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Eager discovery returns exactly the files `matches` accepts.
    #[test]
    fn discovery_agrees_with_matches(
        patterns in prop::sample::subsequence(DISCOVERY_POOL.to_vec(), 1..DISCOVERY_POOL.len()),
        tree in prop::sample::subsequence(TREE_POOL.to_vec(), 0..TREE_POOL.len()),
    ) {
        let temp = TempDir::new().unwrap();
        for name in &tree {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }

        let sources: Vec<ContentSource> = patterns.iter().map(|p| ContentSource::new(*p)).collect();
        let matcher = ContentMatcher::compile(&sources, temp.path()).unwrap();
        let discovered: Vec<PathBuf> =
            matcher.discover(&CancelToken::new()).unwrap().iter().cloned().collect();

        let mut expected: Vec<PathBuf> = tree
            .iter()
            .map(|name| temp.path().join(name))
            .filter(|path| matcher.matches(path))
            .collect();
        expected.sort();
        prop_assert_eq!(discovered, expected, "patterns {:?}", patterns);
    }
}
