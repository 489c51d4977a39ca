//! Windconf - configuration resolution for utility-class CSS engines
//!
//! This library turns a user's raw configuration into the immutable,
//! fully-resolved configuration an engine consumes:
//! - Validate recognized options and fill in defaults
//! - Resolve content glob patterns (brace expansion, exclusions, root
//!   containment) to a concrete set of files
//! - Merge the engine's default theme with plugin fragments, user
//!   extensions, and category overrides
//! - Register plugins deterministically, in declaration order
//!
//! Config files can be loaded from TOML, JSON, JSON5, or a JS module that
//! exports a plain object literal, and watched for changes.
//!
//! # Example
//! ```
//! use serde_json::json;
//! use windconf::{resolve, EngineDefaults};
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::create_dir_all(dir.path().join("src"))?;
//! std::fs::write(dir.path().join("src/index.html"), "<div class=\"p-4\"></div>")?;
//!
//! let raw = json!({
//!     "content": ["./src/**/*.{html,ts}"],
//!     "theme": { "extend": { "colors": { "brand": "#0f766e" } } }
//! });
//! let resolved = resolve(&raw, dir.path(), &EngineDefaults::builtin())?;
//!
//! assert_eq!(resolved.content_files().map(|f| f.len()), Some(1));
//! assert!(resolved.theme().get("colors", "brand").is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cancel;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod resolve;
pub mod theme;
pub mod watch;

pub use cancel::CancelToken;
pub use config::{load_config, validate, ConfigFile, LoadError, Mode, ValidatedConfig};
pub use content::{ContentFileSet, ContentMatcher};
pub use error::ConfigError;
pub use plugin::{Contribution, FnPlugin, Plugin, PluginCatalog, PluginError};
pub use resolve::{resolve, resolve_with_cancel, EngineDefaults, ResolvedConfig, Resolver};
pub use theme::{ThemeTree, TokenValue};
pub use watch::{watch_and_resolve, WatchError, WatchEvent, WatchOptions};
