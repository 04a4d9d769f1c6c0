//! Local tree scan
//!
//! Walks the source tree into the flat, root-relative entry list the
//! planner consumes. Excluded subtrees are pruned at their top-most entry,
//! which is recorded so the decision report can show the skip. Entries come
//! back in a deterministic order, and anything that is not a regular file
//! or directory (symlinks, sockets) is skipped with a warning — served
//! content has no business containing them.

use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{DeployError, Result};

use super::filter::ExclusionSet;

/// Kind of a local entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalKind {
    /// A directory
    Dir,
    /// A regular file with its modification time (seconds since epoch)
    File {
        /// Modification time, seconds since the Unix epoch
        mtime: u64,
    },
}

/// One entry of the local tree, relative to the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Root-relative, slash-separated path
    pub rel: String,
    /// Entry kind
    pub kind: LocalKind,
}

/// Result of scanning the source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Deployable entries, in walk order
    pub entries: Vec<LocalEntry>,
    /// Top-most excluded paths, directories marked with a trailing slash
    pub excluded: Vec<String>,
}

/// Scan the source tree, honoring the exclusion set.
///
/// The source root itself is not an entry; paths are relative to it.
/// Only the top-most entry of an excluded subtree is recorded — its
/// contents are never visited.
pub fn scan(root: &Path, excludes: &ExclusionSet) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| DeployError::Io(std::io::Error::from(e)))?;
        let rel = relative_of(root, entry.path());
        if rel.is_empty() {
            continue; // the root itself
        }

        let file_type = entry.file_type();
        if excludes.matches(&rel) {
            if file_type.is_dir() {
                result.excluded.push(format!("{rel}/"));
                walker.skip_current_dir();
            } else {
                result.excluded.push(rel);
            }
            continue;
        }

        if file_type.is_dir() {
            result.entries.push(LocalEntry {
                rel,
                kind: LocalKind::Dir,
            });
        } else if file_type.is_file() {
            let metadata = entry
                .metadata()
                .map_err(|e| DeployError::Io(std::io::Error::from(e)))?;
            let mtime = metadata
                .modified()
                .map_err(DeployError::Io)?
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            result.entries.push(LocalEntry {
                rel,
                kind: LocalKind::File { mtime },
            });
        } else {
            warn!("skipping non-regular file {}", entry.path().display());
        }
    }

    result.excluded.sort();
    Ok(result)
}

/// Root-relative path with forward slashes, empty for the root itself
fn relative_of(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exclusions(patterns: &[&str]) -> ExclusionSet {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExclusionSet::compile(&patterns).unwrap()
    }

    #[test]
    fn test_scan_collects_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "body{}").unwrap();

        let result = scan(dir.path(), &exclusions(&[])).unwrap();
        let rels: Vec<&str> = result.entries.iter().map(|e| e.rel.as_str()).collect();

        assert_eq!(rels, vec!["css", "css/site.css", "index.html"]);
        assert_eq!(result.entries[0].kind, LocalKind::Dir);
        assert!(matches!(result.entries[1].kind, LocalKind::File { .. }));
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn test_scan_prunes_excluded_subtree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let result = scan(dir.path(), &exclusions(&[".git"])).unwrap();
        let rels: Vec<&str> = result.entries.iter().map(|e| e.rel.as_str()).collect();

        assert_eq!(rels, vec!["a.txt"]);
        // Only the pruned top is recorded, not its contents.
        assert_eq!(result.excluded, vec![".git/"]);
    }

    #[test]
    fn test_scan_records_excluded_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::write(dir.path().join("index.html"), "x").unwrap();

        let result = scan(dir.path(), &exclusions(&[".env"])).unwrap();
        assert_eq!(result.excluded, vec![".env"]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zebra.txt", "apple.txt", "mango.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let first = scan(dir.path(), &exclusions(&[])).unwrap();
        let second = scan(dir.path(), &exclusions(&[])).unwrap();
        assert_eq!(first, second);

        let rels: Vec<&str> = first.entries.iter().map(|e| e.rel.as_str()).collect();
        assert_eq!(rels, vec!["apple.txt", "mango.txt", "zebra.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let result = scan(dir.path(), &exclusions(&[])).unwrap();
        let rels: Vec<&str> = result.entries.iter().map(|e| e.rel.as_str()).collect();
        assert_eq!(rels, vec!["real.txt"]);
        assert!(result.excluded.is_empty());
    }
}
