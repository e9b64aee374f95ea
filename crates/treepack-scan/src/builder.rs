//! Filtered directory tree construction.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;
use ignore::gitignore::Gitignore;
use tracing::debug;

use treepack_core::{FileNode, ScanError, TreeConfig};

use crate::matcher::IgnoreCache;

/// Builds filtered, ordered file trees.
///
/// The matcher cache is injected so callers can share one across builders
/// or construct an isolated one per test.
pub struct TreeBuilder {
    cache: Arc<IgnoreCache>,
}

impl TreeBuilder {
    /// Create a builder backed by the given matcher cache.
    pub fn new(cache: Arc<IgnoreCache>) -> Self {
        Self { cache }
    }

    /// Build the tree for `config.root`.
    ///
    /// Returns a single-element sequence containing the root node (future
    /// multi-root support keeps the sequence shape). Ignored directories
    /// appear as childless leaf markers; ignored files are listed but
    /// flagged. Any filesystem error during the walk aborts the build.
    pub fn build(&self, config: &TreeConfig) -> Result<Vec<FileNode>, ScanError> {
        let root = &config.root;
        let metadata = fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root.clone() });
        }

        let vcs = if config.use_vcs_ignore {
            self.cache.for_root(root)
        } else {
            None
        };
        let custom = if config.use_custom_ignore {
            self.cache.for_custom_rules(&config.custom_rules)
        } else {
            None
        };
        debug!(
            root = %root.display(),
            vcs = vcs.is_some(),
            custom = custom.is_some(),
            "building tree"
        );

        let name = root
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(root.to_string_lossy()));
        let mut root_node = FileNode::new_directory(name, root.clone(), PathBuf::from("."));
        root_node.children = build_dir(root, root, vcs.as_deref(), custom.as_deref())?;
        Ok(vec![root_node])
    }
}

/// Recursively build the children of one directory.
fn build_dir(
    dir: &Path,
    root: &Path,
    vcs: Option<&Gitignore>,
    custom: Option<&Gitignore>,
) -> Result<Vec<FileNode>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|e| ScanError::io(dir, e))?;

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScanError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ScanError::io(&path, e))?;
        let is_dir = file_type.is_dir();

        // path is always under root here; fall back to the full path
        // rather than panicking if the prefix ever fails to strip.
        let rel_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

        let vcs_ignored = is_match(vcs, &rel_path, is_dir);
        let custom_ignored = is_match(custom, &rel_path, is_dir);

        let name = CompactString::new(entry.file_name().to_string_lossy());
        let mut node = if is_dir {
            FileNode::new_directory(name, path.clone(), rel_path)
        } else {
            let size = entry.metadata().map_err(|e| ScanError::io(&path, e))?.len();
            FileNode::new_file(name, path.clone(), rel_path, size)
        };
        node.vcs_ignored = vcs_ignored;
        node.custom_ignored = custom_ignored;

        // Ignore rules apply to whole subtrees: an ignored directory is
        // recorded as a leaf marker and never descended into.
        if is_dir && !node.is_ignored() {
            node.children = build_dir(&path, root, vcs, custom)?;
        }
        nodes.push(node);
    }

    nodes.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(nodes)
}

fn is_match(matcher: Option<&Gitignore>, rel_path: &Path, is_dir: bool) -> bool {
    matcher.is_some_and(|m| m.matched(rel_path, is_dir).is_ignore())
}
