//! Content pattern parsing: brace expansion, root containment, compilation.
//!
//! A declared pattern such as `../../packages/ui/src/**/*.{rs,html}` is
//! expanded into plain globs, split into a literal base directory and a
//! wildcard remainder, and checked against the project root. The remainder
//! is compiled with [`glob::Pattern`] and matched against paths relative to
//! the base.

use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::config::ContentSource;
use crate::error::ConfigError;

/// Upper bound on the number of globs a single brace pattern may expand to.
pub const MAX_EXPANSIONS: usize = 1024;

/// Directories skipped below a pattern's base unless the base itself is inside one.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];

/// `*` stays within one path segment; only `**` crosses separators.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expand brace alternation into the cross product of alternatives.
///
/// The result is sorted and deduplicated, so alternative order never
/// affects it. Nested groups are supported.
///
/// # Example
/// ```
/// use windconf::content::expand_braces;
///
/// let globs = expand_braces("src/**/*.{ts,html}").unwrap();
/// assert_eq!(globs, vec!["src/**/*.html", "src/**/*.ts"]);
/// ```
pub fn expand_braces(pattern: &str) -> Result<Vec<String>, String> {
    check_balance(pattern)?;

    let mut expanded = BTreeSet::new();
    let mut produced = 0usize;
    expand_into(pattern, &mut expanded, &mut produced)?;
    Ok(expanded.into_iter().collect())
}

fn check_balance(pattern: &str) -> Result<(), String> {
    let mut depth = 0usize;
    for (pos, ch) in pattern.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Err(format!("unmatched '}}' at position {}", pos)),
            '}' => depth -= 1,
            _ => {}
        }
    }
    if depth > 0 {
        return Err("unclosed '{'".to_string());
    }
    Ok(())
}

fn expand_into(
    pattern: &str,
    out: &mut BTreeSet<String>,
    produced: &mut usize,
) -> Result<(), String> {
    let Some((open, close)) = first_group(pattern) else {
        *produced += 1;
        if *produced > MAX_EXPANSIONS {
            return Err(format!("expands to more than {} alternatives", MAX_EXPANSIONS));
        }
        out.insert(pattern.to_string());
        return Ok(());
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    for alternative in split_alternatives(&pattern[open + 1..close]) {
        expand_into(&format!("{}{}{}", prefix, alternative, suffix), out, produced)?;
    }
    Ok(())
}

/// Byte range of the first top-level `{...}` group. Assumes balanced braces.
fn first_group(pattern: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut open = None;
    for (pos, ch) in pattern.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    open = Some(pos);
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|o| (o, pos));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&body[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Check if a directory name is excluded by default.
pub fn is_default_excluded(name: &OsStr) -> bool {
    DEFAULT_EXCLUDED_DIRS.iter().any(|d| name == OsStr::new(d))
}

/// Render a relative path with `/` separators, or None if it is not plain UTF-8.
pub(crate) fn to_slash(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Lexically normalize relative segments, failing if `..` climbs above the start.
fn normalize_segments<'a, I>(segments: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            other => out.push(other.to_string()),
        }
    }
    Some(out)
}

/// Lexically normalize an absolute path (no file-system access).
pub(crate) fn normalize_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// One compiled glob, rooted at a literal base directory under the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
    source: String,
    base: PathBuf,
    glob: Pattern,
    recursive: bool,
    depth: usize,
    extensions: Vec<String>,
}

impl CompiledPattern {
    /// Compile a declared source into one pattern per brace expansion.
    ///
    /// A leading `!` is stripped; the caller decides whether the source is
    /// an exclusion.
    pub fn compile(source: &ContentSource, root: &Path) -> Result<Vec<Self>, ConfigError> {
        let declared = source.pattern.as_str();
        let body = declared.strip_prefix('!').unwrap_or(declared).trim();
        if body.is_empty() {
            return Err(ConfigError::invalid_pattern(declared, "empty pattern"));
        }

        let expanded =
            expand_braces(body).map_err(|reason| ConfigError::invalid_pattern(declared, reason))?;

        expanded
            .iter()
            .map(|glob| Self::compile_expanded(declared, glob, source, root))
            .collect()
    }

    fn compile_expanded(
        declared: &str,
        glob: &str,
        source: &ContentSource,
        root: &Path,
    ) -> Result<Self, ConfigError> {
        let segments: Vec<&str> = glob.split('/').collect();
        let literal_len = segments.iter().position(|s| has_glob_meta(s)).unwrap_or_else(|| {
            // A fully literal pattern names a file; its parent is the base.
            segments.len().saturating_sub(1)
        });
        let (literal, remainder) = segments.split_at(literal_len);
        let remainder: Vec<&str> =
            remainder.iter().copied().filter(|s| !s.is_empty() && *s != ".").collect();

        if remainder.is_empty() {
            return Err(ConfigError::invalid_pattern(declared, "pattern does not name any file"));
        }
        if remainder.contains(&"..") {
            return Err(ConfigError::unsafe_pattern(declared));
        }

        let base = Self::contained_base(declared, glob, literal, source.base.as_deref(), root)?;

        let joined = remainder.join("/");
        let compiled = Pattern::new(&joined)
            .map_err(|e| ConfigError::invalid_pattern(declared, e.msg))?;

        Ok(Self {
            source: declared.to_string(),
            base,
            glob: compiled,
            recursive: remainder.contains(&"**"),
            depth: remainder.len(),
            extensions: source.extensions.clone(),
        })
    }

    /// Resolve the literal prefix (plus any declared base) to a directory
    /// relative to the root, rejecting anything that escapes it.
    fn contained_base(
        declared: &str,
        glob: &str,
        literal: &[&str],
        declared_base: Option<&Path>,
        root: &Path,
    ) -> Result<PathBuf, ConfigError> {
        let mut segments: Vec<String> = Vec::new();

        if glob.starts_with('/') {
            // Absolute pattern: must lie under the root.
            let absolute = normalize_absolute(Path::new(&literal.join("/")));
            let relative = absolute
                .strip_prefix(normalize_absolute(root))
                .map_err(|_| ConfigError::unsafe_pattern(declared))?;
            let relative =
                to_slash(relative).ok_or_else(|| ConfigError::unsafe_pattern(declared))?;
            segments.push(relative);
        } else {
            if let Some(base) = declared_base {
                let base = if base.is_absolute() {
                    let absolute = normalize_absolute(base);
                    absolute
                        .strip_prefix(normalize_absolute(root))
                        .map(Path::to_path_buf)
                        .map_err(|_| ConfigError::unsafe_pattern(declared))?
                } else {
                    base.to_path_buf()
                };
                let base = base.to_str().ok_or_else(|| ConfigError::unsafe_pattern(declared))?;
                segments.push(base.replace('\\', "/"));
            }
            segments.extend(literal.iter().map(|s| s.to_string()));
        }

        let joined = segments.join("/");
        let normalized = normalize_segments(joined.split('/'))
            .ok_or_else(|| ConfigError::unsafe_pattern(declared))?;
        Ok(normalized.iter().collect())
    }

    /// The pattern as declared
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Literal base directory, relative to the project root
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether the pattern contains `**`
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Walk depth below the base needed to reach every possible match,
    /// or None when unbounded.
    pub fn max_depth(&self) -> Option<usize> {
        if self.recursive {
            None
        } else {
            Some(self.depth)
        }
    }

    /// Match a path relative to the project root.
    pub fn matches_relative(&self, relative: &Path) -> bool {
        let Ok(inner) = relative.strip_prefix(&self.base) else {
            return false;
        };
        if !self.extension_allowed(inner) {
            return false;
        }
        if let Some(parent) = inner.parent() {
            if parent.components().any(|c| is_default_excluded(c.as_os_str())) {
                return false;
            }
        }
        match to_slash(inner) {
            Some(candidate) => self.glob.matches_with(&candidate, MATCH_OPTIONS),
            None => false,
        }
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|allowed| allowed == ext),
            None => false,
        }
    }
}
