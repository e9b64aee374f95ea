//! Ignore-aware file tree indexing.
//!
//! This crate builds filtered, ordered [`treepack_core::FileNode`] trees
//! for a root directory, honoring the root's version-control ignore file
//! and a user-supplied custom rule text. Compiled matchers are cached in
//! [`IgnoreCache`] so repeated builds do not recompile patterns.

mod builder;
mod matcher;

pub use builder::TreeBuilder;
pub use matcher::{IgnoreCache, VCS_IGNORE_FILE};
