//! Sync planning — reconciliation decisions without any remote mutation
//!
//! The planner is a pure function from the two manifests and the conflict
//! mode to an ordered set of actions. Dry runs render the plan; real runs
//! execute it. Keeping this stage side-effect free is what makes the
//! rehearsal report and the actual transfer provably identical.

use std::collections::{HashMap, HashSet};

use crate::config::ConflictMode;

use super::manifest::{RemoteEntry, RemoteKind};
use super::scan::{LocalEntry, LocalKind};

/// A file to transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Root-relative path
    pub rel: String,
    /// Local modification time to stamp onto the destination
    pub mtime: u64,
}

/// The full set of reconciliation decisions for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Directories to create, shallowest first
    pub mkdirs: Vec<String>,
    /// Files to transfer, sorted by path
    pub transfers: Vec<Transfer>,
    /// Remote files to delete, sorted by path
    pub delete_files: Vec<String>,
    /// Remote directories to delete, deepest first
    pub delete_dirs: Vec<String>,
    /// Files skipped because the remote copy is current, sorted by path
    pub skipped: Vec<String>,
    /// Excluded top-most paths, filled in from the local scan so the
    /// decision report can show them; never touched on either side
    pub excluded: Vec<String>,
}

impl SyncPlan {
    /// Whether the plan performs no remote mutation at all
    pub fn is_noop(&self) -> bool {
        self.mkdirs.is_empty()
            && self.transfers.is_empty()
            && self.delete_files.is_empty()
            && self.delete_dirs.is_empty()
    }

    /// Number of entries scheduled for deletion
    pub fn deletions(&self) -> usize {
        self.delete_files.len() + self.delete_dirs.len()
    }
}

/// Compute the reconciliation plan.
///
/// Mirror semantics: the destination ends up equal to the local tree
/// (minus exclusions, which never reach either manifest). Remote entries
/// absent locally are deleted; a remote entry whose kind conflicts with
/// the local one is deleted and rebuilt.
pub fn plan(local: &[LocalEntry], remote: &[RemoteEntry], mode: ConflictMode) -> SyncPlan {
    let mut remote_files: HashMap<&str, u64> = HashMap::new();
    let mut remote_dirs: HashSet<&str> = HashSet::new();
    for entry in remote {
        match entry.kind {
            RemoteKind::File { mtime } => {
                remote_files.insert(entry.rel.as_str(), mtime);
            }
            RemoteKind::Dir => {
                remote_dirs.insert(entry.rel.as_str());
            }
        }
    }

    let local_paths: HashSet<&str> = local.iter().map(|e| e.rel.as_str()).collect();

    let mut out = SyncPlan::default();

    for entry in local {
        match &entry.kind {
            LocalKind::Dir => {
                if !remote_dirs.contains(entry.rel.as_str()) {
                    // A remote file in the way of a local directory gets
                    // removed with the other stale files.
                    if remote_files.contains_key(entry.rel.as_str()) {
                        out.delete_files.push(entry.rel.clone());
                    }
                    out.mkdirs.push(entry.rel.clone());
                }
            }
            LocalKind::File { mtime } => {
                if remote_dirs.contains(entry.rel.as_str()) {
                    // Remote directory in the way of a local file; its
                    // contents are already remote-only and get deleted below.
                    out.delete_dirs.push(entry.rel.clone());
                    out.transfers.push(Transfer {
                        rel: entry.rel.clone(),
                        mtime: *mtime,
                    });
                    continue;
                }
                match (mode, remote_files.get(entry.rel.as_str())) {
                    (_, None) => out.transfers.push(Transfer {
                        rel: entry.rel.clone(),
                        mtime: *mtime,
                    }),
                    (ConflictMode::Force, Some(_)) => out.transfers.push(Transfer {
                        rel: entry.rel.clone(),
                        mtime: *mtime,
                    }),
                    (ConflictMode::UpdateOnly, Some(remote_mtime)) => {
                        if *remote_mtime < *mtime {
                            out.transfers.push(Transfer {
                                rel: entry.rel.clone(),
                                mtime: *mtime,
                            });
                        } else {
                            out.skipped.push(entry.rel.clone());
                        }
                    }
                }
            }
        }
    }

    for entry in remote {
        if local_paths.contains(entry.rel.as_str()) {
            continue;
        }
        match entry.kind {
            RemoteKind::File { .. } => out.delete_files.push(entry.rel.clone()),
            RemoteKind::Dir => out.delete_dirs.push(entry.rel.clone()),
        }
    }

    // Deterministic, execution-safe ordering: parents before children for
    // creation, children before parents for removal.
    out.mkdirs.sort_by(|a, b| depth(a).cmp(&depth(b)).then(a.cmp(b)));
    out.transfers.sort_by(|a, b| a.rel.cmp(&b.rel));
    out.delete_files.sort();
    out.delete_files.dedup();
    out.delete_dirs
        .sort_by(|a, b| depth(b).cmp(&depth(a)).then(b.cmp(a)));
    out.delete_dirs.dedup();
    out.skipped.sort();

    out
}

fn depth(rel: &str) -> usize {
    rel.matches('/').count()
}
