//! Content discovery: turns compiled patterns into a concrete file set.
//!
//! The same predicate drives both the eager directory walk and incremental
//! `matches` checks, so a watcher's decisions always agree with what a full
//! discovery would produce.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use super::pattern::{is_default_excluded, normalize_absolute, CompiledPattern};
use crate::cancel::CancelToken;
use crate::config::ContentSource;
use crate::error::ConfigError;

/// Deduplicated set of absolute content file paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ContentFileSet {
    files: BTreeSet<PathBuf>,
}

impl ContentFileSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if a path is in the set
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Iterate files in path order
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Paths relative to `root`, in path order.
    pub fn relative_to(&self, root: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
            .collect()
    }
}

impl FromIterator<PathBuf> for ContentFileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self { files: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ContentFileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// One directory walk: a base under the root plus an optional depth bound.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WalkSpec {
    base: PathBuf,
    max_depth: Option<usize>,
}

/// Compiled content predicate for a project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMatcher {
    root: PathBuf,
    include: Vec<CompiledPattern>,
    exclude: Vec<CompiledPattern>,
}

impl ContentMatcher {
    /// Compile declared sources against a project root.
    ///
    /// Sources with a leading `!` become exclusions.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidPattern`] for malformed patterns
    /// - [`ConfigError::UnsafePattern`] for patterns escaping `root`
    ///
    /// A relative `root` is taken against the current directory.
    pub fn compile(sources: &[ContentSource], root: &Path) -> Result<Self, ConfigError> {
        let root = normalize_absolute(&absolute_root(root));
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for source in sources {
            let compiled = CompiledPattern::compile(source, &root)?;
            if source.is_exclusion() {
                exclude.extend(compiled);
            } else {
                include.extend(compiled);
            }
        }

        tracing::debug!(
            root = %root.display(),
            include = include.len(),
            exclude = exclude.len(),
            "compiled content patterns"
        );
        Ok(Self { root, include, exclude })
    }

    /// The project root patterns are evaluated against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if no inclusion pattern is present
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Inclusion patterns after brace expansion
    pub fn include_patterns(&self) -> &[CompiledPattern] {
        &self.include
    }

    /// Exclusion patterns after brace expansion
    pub fn exclude_patterns(&self) -> &[CompiledPattern] {
        &self.exclude
    }

    /// Check whether a path is content.
    ///
    /// Accepts an absolute path under the root or a path relative to it.
    /// Does not touch the file system.
    pub fn matches(&self, path: &Path) -> bool {
        let relative = if path.is_absolute() {
            match normalize_absolute(path).strip_prefix(&self.root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => return false,
            }
        } else {
            if path.components().any(|c| matches!(c, Component::ParentDir)) {
                return false;
            }
            path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
        };
        self.matches_relative(&relative)
    }

    fn matches_relative(&self, relative: &Path) -> bool {
        self.include.iter().any(|p| p.matches_relative(relative))
            && !self.exclude.iter().any(|p| p.matches_relative(relative))
    }

    /// Walk the file system and collect every matching file.
    ///
    /// Distinct base directories are walked in parallel. Every visited entry
    /// is a cancellation checkpoint; a cancelled discovery returns
    /// [`ConfigError::Cancelled`] and no partial set.
    pub fn discover(&self, cancel: &CancelToken) -> Result<ContentFileSet, ConfigError> {
        let start = Instant::now();
        let specs = self.walk_specs();

        let found = specs
            .par_iter()
            .map(|spec| self.walk(spec, cancel))
            .collect::<Result<Vec<_>, _>>()?;

        let files: ContentFileSet = found.into_iter().flatten().collect();
        tracing::debug!(
            walks = specs.len(),
            files = files.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "discovered content files"
        );
        Ok(files)
    }

    /// Group inclusion patterns by base directory, dropping bases already
    /// covered by an unbounded walk of an ancestor.
    ///
    /// A base reached only through a default-excluded directory is kept,
    /// since the ancestor's walk prunes that directory.
    fn walk_specs(&self) -> Vec<WalkSpec> {
        let mut by_base: BTreeMap<PathBuf, Option<usize>> = BTreeMap::new();
        for pattern in &self.include {
            let depth = pattern.max_depth();
            by_base
                .entry(pattern.base().to_path_buf())
                .and_modify(|current| {
                    *current = match (*current, depth) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        _ => None,
                    }
                })
                .or_insert(depth);
        }

        let unbounded: Vec<PathBuf> =
            by_base.iter().filter(|(_, d)| d.is_none()).map(|(b, _)| b.clone()).collect();

        by_base
            .into_iter()
            .filter(|(base, _)| !unbounded.iter().any(|u| covers(u, base)))
            .map(|(base, max_depth)| WalkSpec { base, max_depth })
            .collect()
    }

    fn walk(&self, spec: &WalkSpec, cancel: &CancelToken) -> Result<Vec<PathBuf>, ConfigError> {
        let dir = self.root.join(&spec.base);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut walker = WalkDir::new(&dir).follow_links(false).min_depth(1);
        if let Some(depth) = spec.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        let entries = walker.into_iter().filter_entry(|e| {
            !(e.depth() > 0 && e.file_type().is_dir() && is_default_excluded(e.file_name()))
        });
        for entry in entries {
            cancel.checkpoint()?;
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable path during content discovery");
                    continue;
                }
            };

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if relative.to_str().is_none() {
                tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 content path");
                continue;
            }
            if self.matches_relative(relative) {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }
}

fn absolute_root(root: &Path) -> PathBuf {
    if root.is_absolute() {
        return root.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(err) => {
            tracing::warn!(error = %err, root = %root.display(), "cannot resolve relative content root");
            root.to_path_buf()
        }
    }
}

/// Whether an unbounded walk of `ancestor` visits everything under `base`.
fn covers(ancestor: &Path, base: &Path) -> bool {
    if ancestor == base {
        return false;
    }
    match base.strip_prefix(ancestor) {
        Ok(between) => !between.iter().any(is_default_excluded),
        Err(_) => false,
    }
}

/// Resolve content sources to the set of matching files under `project_root`.
///
/// Zero matches is not an error: content may not exist yet.
pub fn resolve(sources: &[ContentSource], project_root: &Path) -> Result<ContentFileSet, ConfigError> {
    ContentMatcher::compile(sources, project_root)?.discover(&CancelToken::new())
}
