//! Content pattern compilation and file discovery.

pub mod pattern;
pub mod resolver;

pub use pattern::{expand_braces, CompiledPattern, DEFAULT_EXCLUDED_DIRS, MAX_EXPANSIONS};
pub use resolver::{resolve, ContentFileSet, ContentMatcher};
