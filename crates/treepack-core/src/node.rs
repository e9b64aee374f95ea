//! File and directory node types.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Type of file system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File {
        /// Size in bytes.
        size: u64,
    },
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A single file or directory in a scanned tree.
///
/// Trees are built fresh on every scan and owned exclusively by the caller;
/// nodes are never mutated after the build returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// File/directory name (not full path).
    pub name: CompactString,

    /// Absolute path.
    pub path: PathBuf,

    /// Path relative to the scan root; `"."` for the root node.
    pub rel_path: PathBuf,

    /// Node type and associated metadata.
    pub kind: NodeKind,

    /// Matched by the root's version-control ignore file.
    #[serde(default)]
    pub vcs_ignored: bool,

    /// Matched by the user-defined custom ignore rules.
    #[serde(default)]
    pub custom_ignored: bool,

    /// Children nodes (directories only), directories first, then
    /// case-insensitively by name. Empty for pruned (ignored) directories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new file node.
    pub fn new_file(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        rel_path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            rel_path: rel_path.into(),
            kind: NodeKind::File { size },
            vcs_ignored: false,
            custom_ignored: false,
            children: Vec::new(),
        }
    }

    /// Create a new directory node.
    pub fn new_directory(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        rel_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            rel_path: rel_path.into(),
            kind: NodeKind::Directory,
            vcs_ignored: false,
            custom_ignored: false,
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Matched by either ignore source.
    pub fn is_ignored(&self) -> bool {
        self.vcs_ignored || self.custom_ignored
    }

    /// Size in bytes for files, zero for directories.
    pub fn size(&self) -> u64 {
        match self.kind {
            NodeKind::File { size } => size,
            NodeKind::Directory => 0,
        }
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&FileNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Sort direct children: directories before files, then
    /// case-insensitively by name within each group.
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
    }

    /// Check the parent-path invariant against a parent path.
    pub fn is_child_path_of(&self, parent: &Path) -> bool {
        self.path == parent.join(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_node_creation() {
        let node = FileNode::new_file("test.txt", "/root/test.txt", "test.txt", 1024);
        assert!(node.is_file());
        assert!(!node.is_dir());
        assert_eq!(node.size(), 1024);
        assert!(!node.is_ignored());
    }

    #[test]
    fn test_directory_node_creation() {
        let node = FileNode::new_directory("src", "/root/src", "src");
        assert!(node.is_dir());
        assert!(!node.is_file());
        assert_eq!(node.size(), 0);
        assert_eq!(node.child_count(), 0);
    }

    #[test]
    fn test_sort_children_dirs_first_case_insensitive() {
        let mut parent = FileNode::new_directory("root", "/root", ".");
        parent.children = vec![
            FileNode::new_file("Zeta.txt", "/root/Zeta.txt", "Zeta.txt", 1),
            FileNode::new_directory("beta", "/root/beta", "beta"),
            FileNode::new_file("alpha.txt", "/root/alpha.txt", "alpha.txt", 1),
            FileNode::new_directory("Alpha", "/root/Alpha", "Alpha"),
        ];
        parent.sort_children();

        let names: Vec<&str> = parent.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "alpha.txt", "Zeta.txt"]);
    }

    #[test]
    fn test_child_path_invariant() {
        let node = FileNode::new_file("a.txt", "/root/src/a.txt", "src/a.txt", 0);
        assert!(node.is_child_path_of(Path::new("/root/src")));
        assert!(!node.is_child_path_of(Path::new("/root")));
    }
}
