//! Context document assembly: a tree listing followed by file bodies.

use std::fmt::Write as _;
use std::fs;

use tracing::debug;

use treepack_core::{FileNode, ScanError};

/// Render a box-drawing listing of the tree.
pub fn tree_text(root: &FileNode) -> String {
    let mut out = String::new();
    out.push_str(root.name.as_str());
    out.push('\n');
    render_children(&root.children, "", &mut out);
    out
}

fn render_children(children: &[FileNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└─ " } else { "├─ " });
        out.push_str(child.name.as_str());
        out.push('\n');

        if child.is_dir() {
            let continuation = if last { "   " } else { "│  " };
            let next = format!("{prefix}{continuation}");
            render_children(&child.children, &next, out);
        }
    }
}

/// Assemble a context document for the tree: the listing, then every
/// non-ignored file's body wrapped in `<file path="...">` delimiters.
///
/// Files are visited in tree order (directories first, then files, as the
/// builder sorted them). A read error aborts the whole assembly; no
/// partial context is returned.
pub fn assemble(root: &FileNode) -> Result<String, ScanError> {
    let mut out = String::new();
    out.push_str(&tree_text(root));
    out.push('\n');
    append_files(root, &mut out)?;
    debug!(bytes = out.len(), "assembled context");
    Ok(out)
}

fn append_files(node: &FileNode, out: &mut String) -> Result<(), ScanError> {
    for child in &node.children {
        if child.is_dir() {
            append_files(child, out)?;
        } else if !child.is_ignored() {
            let bytes = fs::read(&child.path).map_err(|e| ScanError::io(&child.path, e))?;
            let _ = writeln!(out, "<file path=\"{}\">", child.rel_path.display());
            out.push_str(&String::from_utf8_lossy(&bytes));
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("</file>\n\n");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FileNode {
        let mut root = FileNode::new_directory("proj", "/proj", ".");
        let mut src = FileNode::new_directory("src", "/proj/src", "src");
        src.children = vec![FileNode::new_file(
            "main.rs",
            "/proj/src/main.rs",
            "src/main.rs",
            12,
        )];
        root.children = vec![
            src,
            FileNode::new_file("README.md", "/proj/README.md", "README.md", 8),
        ];
        root
    }

    #[test]
    fn test_tree_text_shape() {
        let text = tree_text(&sample_tree());
        let expected = "proj\n\
                        ├─ src\n\
                        │  └─ main.rs\n\
                        └─ README.md\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_tree_text_ignored_directory_is_leaf() {
        let mut root = FileNode::new_directory("proj", "/proj", ".");
        let mut target = FileNode::new_directory("target", "/proj/target", "target");
        target.vcs_ignored = true;
        root.children = vec![target];

        let text = tree_text(&root);
        assert_eq!(text, "proj\n└─ target\n");
    }

    #[test]
    fn test_assemble_includes_file_bodies() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        std::fs::write(&file, "hello\n").unwrap();

        let mut root = FileNode::new_directory("proj", temp.path(), ".");
        root.children = vec![FileNode::new_file("a.txt", &file, "a.txt", 6)];

        let out = assemble(&root).unwrap();
        assert!(out.starts_with("proj\n└─ a.txt\n"));
        assert!(out.contains("<file path=\"a.txt\">\nhello\n</file>\n"));
    }

    #[test]
    fn test_assemble_skips_ignored_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("secret.log");
        std::fs::write(&file, "shh").unwrap();

        let mut root = FileNode::new_directory("proj", temp.path(), ".");
        let mut node = FileNode::new_file("secret.log", &file, "secret.log", 3);
        node.custom_ignored = true;
        root.children = vec![node];

        let out = assemble(&root).unwrap();
        assert!(!out.contains("shh"));
    }

    #[test]
    fn test_assemble_missing_file_aborts() {
        let mut root = FileNode::new_directory("proj", "/proj", ".");
        root.children = vec![FileNode::new_file(
            "gone.txt",
            "/proj/does-not-exist/gone.txt",
            "gone.txt",
            0,
        )];
        assert!(assemble(&root).is_err());
    }
}
