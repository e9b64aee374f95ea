//! Compiled ignore-rule matchers with per-root and per-rule-set caching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Name of the version-control ignore file read from a scan root.
pub const VCS_IGNORE_FILE: &str = ".gitignore";

/// Shared cache of compiled ignore matchers.
///
/// Root-file matchers are keyed by the root directory path; the custom
/// matcher is a single slot keyed by the normalized rule text and replaced
/// wholesale when the text changes. Both lookups fail open: a matcher that
/// cannot be read or compiled is reported as "no rules" rather than an
/// error, so a broken ignore file never prevents browsing.
///
/// Construct one cache per [`crate::TreeBuilder`] (or share one between
/// builders); there is no process-wide singleton.
#[derive(Debug, Default)]
pub struct IgnoreCache {
    roots: RwLock<HashMap<PathBuf, Arc<Gitignore>>>,
    custom: RwLock<Option<CustomEntry>>,
}

#[derive(Debug)]
struct CustomEntry {
    key: String,
    matcher: Arc<Gitignore>,
}

impl IgnoreCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher for a root's version-control ignore file.
    ///
    /// Returns the cached matcher if one was compiled for this root before;
    /// otherwise compiles `root/.gitignore`. A missing, unreadable, or
    /// malformed ignore file yields `None`.
    pub fn for_root(&self, root: &Path) -> Option<Arc<Gitignore>> {
        {
            let roots = self.roots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(matcher) = roots.get(root) {
                return Some(Arc::clone(matcher));
            }
        }

        let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check: another build may have compiled while we waited.
        if let Some(matcher) = roots.get(root) {
            return Some(Arc::clone(matcher));
        }
        let matcher = Arc::new(compile_root(root)?);
        roots.insert(root.to_path_buf(), Arc::clone(&matcher));
        Some(matcher)
    }

    /// Matcher for a user-defined custom rule text.
    ///
    /// The text is normalized (line endings unified, lines trimmed, blanks
    /// and `#` comments dropped) and the result used as the cache key; rule
    /// texts that normalize identically share one compiled matcher. An
    /// empty normalized rule set yields `None`.
    pub fn for_custom_rules(&self, rules: &str) -> Option<Arc<Gitignore>> {
        let key = normalize_rules(rules);
        if key.is_empty() {
            return None;
        }

        {
            let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = custom.as_ref() {
                if entry.key == key {
                    return Some(Arc::clone(&entry.matcher));
                }
            }
        }

        let mut custom = self.custom.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = custom.as_ref() {
            if entry.key == key {
                return Some(Arc::clone(&entry.matcher));
            }
        }
        let matcher = Arc::new(compile_lines(&key)?);
        *custom = Some(CustomEntry {
            key,
            matcher: Arc::clone(&matcher),
        });
        Some(matcher)
    }
}

/// Compile the ignore file found at `root`, if any.
fn compile_root(root: &Path) -> Option<Gitignore> {
    let ignore_file = root.join(VCS_IGNORE_FILE);
    if !ignore_file.is_file() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&ignore_file) {
        warn!(
            path = %ignore_file.display(),
            error = %err,
            "ignore file could not be read, treating as empty"
        );
        return None;
    }
    match builder.build() {
        Ok(matcher) => {
            debug!(path = %ignore_file.display(), "compiled ignore file");
            Some(matcher)
        }
        Err(err) => {
            warn!(
                path = %ignore_file.display(),
                error = %err,
                "ignore file could not be compiled, treating as empty"
            );
            None
        }
    }
}

/// Compile normalized rule lines into a matcher.
fn compile_lines(rules: &str) -> Option<Gitignore> {
    let mut builder = GitignoreBuilder::new("");
    for line in rules.lines() {
        if let Err(err) = builder.add_line(None, line) {
            warn!(rule = line, error = %err, "skipping unparsable ignore rule");
        }
    }
    match builder.build() {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            warn!(error = %err, "custom ignore rules could not be compiled");
            None
        }
    }
}

/// Normalize a custom rule text into its cache key: unified line endings,
/// trimmed lines, blanks and comments dropped.
fn normalize_rules(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_rules_collapses_noise() {
        let a = normalize_rules("*.log\n\ntarget/\n# comment\n");
        let b = normalize_rules("  *.log  \r\n\r\ntarget/   \r\n");
        assert_eq!(a, b);
        assert_eq!(a, "*.log\ntarget/");
    }

    #[test]
    fn test_custom_rules_share_cache_entry() {
        let cache = IgnoreCache::new();
        let first = cache.for_custom_rules("*.log\n\n# noise\n").unwrap();
        let second = cache.for_custom_rules("  *.log  \r\n").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_custom_rules_replaced_on_change() {
        let cache = IgnoreCache::new();
        let first = cache.for_custom_rules("*.log").unwrap();
        let second = cache.for_custom_rules("*.tmp").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.matched("a.tmp", false).is_ignore());
        assert!(!second.matched("a.log", false).is_ignore());
    }

    #[test]
    fn test_empty_custom_rules_yield_no_matcher() {
        let cache = IgnoreCache::new();
        assert!(cache.for_custom_rules("").is_none());
        assert!(cache.for_custom_rules("\n# only a comment\n   \n").is_none());
    }

    #[test]
    fn test_root_without_ignore_file() {
        let temp = TempDir::new().unwrap();
        let cache = IgnoreCache::new();
        assert!(cache.for_root(temp.path()).is_none());
    }

    #[test]
    fn test_root_ignore_file_compiled_and_cached() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "target/\n*.log\n").unwrap();

        let cache = IgnoreCache::new();
        let first = cache.for_root(temp.path()).unwrap();
        let second = cache.for_root(temp.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(first.matched("target", true).is_ignore());
        assert!(first.matched("debug.log", false).is_ignore());
        assert!(!first.matched("src", true).is_ignore());
    }
}
