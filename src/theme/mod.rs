//! Theme trees and layered merging.

pub mod defaults;
pub mod merge;
pub mod tree;

pub use defaults::builtin_theme;
pub use merge::{merge, merge_layers, merge_tokens};
pub use tree::{ThemeTree, TokenMap, TokenValue};
