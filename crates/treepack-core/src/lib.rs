//! Core types for treepack.
//!
//! This crate provides the fundamental data structures shared by the
//! treepack ecosystem: file-tree nodes, build configuration, and errors.

mod config;
mod error;
mod node;

pub use config::{TreeConfig, TreeConfigBuilder};
pub use error::ScanError;
pub use node::{FileNode, NodeKind};
