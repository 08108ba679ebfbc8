//! Tree snapshots: filtered, structurally normalized recordings of a
//! directory tree's entries and their metadata.
//!
//! A snapshot is built once per (root, ignore-configuration) pair and is
//! immutable afterwards; the diff engine only ever reads it.

mod builder;
mod filter;
mod tree;

pub use builder::{SnapshotError, build_snapshot};
pub use filter::{
    FilterError, GlobPatterns, IgnoreFilter, PatternMatcher, default_name_patterns,
    default_path_patterns,
};
pub use tree::{DirContent, FileSpec, FileTree, SELF_ENTRY};
