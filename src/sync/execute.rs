//! Plan execution and dry-run rendering
//!
//! Applies a `SyncPlan` to the remote tree over the SSH session, one
//! sequential action at a time. Per-file problems are collected instead of
//! aborting: the run outcome distinguishes a clean mirror from a partial
//! one, and the orchestrator decides what a partial result means.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ConflictMode;
use crate::error::{DeployError, Result};
use crate::ssh::{sh_quote, SshSession};

use super::plan::SyncPlan;

/// Suffix for the temporary files the atomic write path stages into
const TMP_SUFFIX: &str = ".sitepush-tmp";

/// What went wrong with one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The local source file disappeared between scan and transfer
    Vanished,
    /// The remote side refused the content write
    Write,
    /// Content landed but the mtime stamp or rename step failed
    Finalize,
    /// A remote entry scheduled for deletion could not be removed
    Delete,
}

/// One per-file problem, tolerated as a partial-transfer condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIssue {
    /// Root-relative path
    pub rel: String,
    /// Problem category
    pub kind: IssueKind,
    /// Diagnostic detail
    pub detail: String,
}

/// Transfer-level outcome classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// The remote tree mirrors the local tree
    Clean,
    /// The mirror completed with per-file problems
    Partial(Vec<TransferIssue>),
}

/// Counts and classification for a completed (non-dry-run) sync
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Files whose content was written
    pub transferred: usize,
    /// Remote entries removed
    pub deleted: usize,
    /// Files left alone because the remote copy is current
    pub skipped: usize,
    /// Clean or partial
    pub status: SyncStatus,
}

/// Render the plan as the dry-run decision report.
///
/// The output is fully determined by the plan: identical trees produce a
/// byte-identical report.
pub fn render_report(plan: &SyncPlan) -> String {
    let mut lines = Vec::new();
    for rel in &plan.mkdirs {
        lines.push(format!("mkdir {rel}/"));
    }
    for transfer in &plan.transfers {
        lines.push(format!("transfer {}", transfer.rel));
    }
    for rel in &plan.delete_files {
        lines.push(format!("delete {rel}"));
    }
    for rel in &plan.delete_dirs {
        lines.push(format!("delete {rel}/"));
    }
    for rel in &plan.skipped {
        lines.push(format!("skip {rel}"));
    }
    for rel in &plan.excluded {
        lines.push(format!("skip {rel}"));
    }
    let mut report = lines.join("\n");
    if !report.is_empty() {
        report.push('\n');
    }
    report
}

/// Execute the plan against the remote tree.
///
/// Ordering is chosen so kind conflicts resolve correctly: stale entries
/// are removed first (files, then directories deepest-first), then
/// directories are created shallowest-first, then file contents flow.
/// Transport-level failures abort; per-file failures accumulate.
pub async fn execute(
    session: &SshSession,
    source: &Path,
    remote_root: &str,
    plan: &SyncPlan,
    mode: ConflictMode,
    timeout: Duration,
) -> Result<SyncOutcome> {
    let mut issues = Vec::new();
    let mut transferred = 0usize;
    let mut deleted = 0usize;

    // The destination root itself must exist; failure here is a hard
    // invalid-remote-path condition, not a per-file problem.
    let mkdir_root = format!("mkdir -p {}", sh_quote(remote_root));
    let output = session.exec(&mkdir_root, timeout).await?;
    if !output.success() {
        return Err(DeployError::RemoteCommand {
            status: output.status(),
            detail: format!("cannot create {}: {}", remote_root, output.diagnostic()),
        });
    }

    for rel in &plan.delete_files {
        let cmd = format!("rm -f {}", sh_quote(&remote_target(remote_root, rel)));
        let output = session.exec(&cmd, timeout).await?;
        if output.success() {
            deleted += 1;
            debug!("deleted {rel}");
        } else {
            warn!("could not delete {rel}: {}", output.diagnostic());
            issues.push(TransferIssue {
                rel: rel.clone(),
                kind: IssueKind::Delete,
                detail: output.diagnostic(),
            });
        }
    }

    for rel in &plan.delete_dirs {
        let cmd = format!("rmdir {}", sh_quote(&remote_target(remote_root, rel)));
        let output = session.exec(&cmd, timeout).await?;
        if output.success() {
            deleted += 1;
            debug!("deleted {rel}/");
        } else {
            // Typically a directory kept non-empty by excluded remote
            // content; the mirror leaves it in place.
            warn!("could not remove directory {rel}: {}", output.diagnostic());
            issues.push(TransferIssue {
                rel: rel.clone(),
                kind: IssueKind::Delete,
                detail: output.diagnostic(),
            });
        }
    }

    for rel in &plan.mkdirs {
        let cmd = format!("mkdir -p {}", sh_quote(&remote_target(remote_root, rel)));
        let output = session.exec(&cmd, timeout).await?;
        if !output.success() {
            warn!("could not create directory {rel}: {}", output.diagnostic());
            issues.push(TransferIssue {
                rel: rel.clone(),
                kind: IssueKind::Write,
                detail: output.diagnostic(),
            });
        }
    }

    for transfer in &plan.transfers {
        let local_path = source.join(&transfer.rel);
        let content = match tokio::fs::read(&local_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} vanished locally during sync", transfer.rel);
                issues.push(TransferIssue {
                    rel: transfer.rel.clone(),
                    kind: IssueKind::Vanished,
                    detail: "source file vanished during sync".to_string(),
                });
                continue;
            }
            Err(e) => return Err(DeployError::Io(e)),
        };

        let target = remote_target(remote_root, &transfer.rel);
        match mode {
            ConflictMode::UpdateOnly => {
                let tmp = staging_name(&target);
                let write = format!("cat > {}", sh_quote(&tmp));
                let output = session.exec_with_input(&write, &content, timeout).await?;
                if !output.success() {
                    warn!("write of {} refused: {}", transfer.rel, output.diagnostic());
                    issues.push(TransferIssue {
                        rel: transfer.rel.clone(),
                        kind: IssueKind::Write,
                        detail: output.diagnostic(),
                    });
                    continue;
                }
                let finalize = format!(
                    "touch -m -d '@{}' {} && mv -f {} {}",
                    transfer.mtime,
                    sh_quote(&tmp),
                    sh_quote(&tmp),
                    sh_quote(&target)
                );
                let output = session.exec(&finalize, timeout).await?;
                if output.success() {
                    transferred += 1;
                    debug!("transferred {}", transfer.rel);
                } else {
                    warn!(
                        "could not finalize {}: {}",
                        transfer.rel,
                        output.diagnostic()
                    );
                    issues.push(TransferIssue {
                        rel: transfer.rel.clone(),
                        kind: IssueKind::Finalize,
                        detail: output.diagnostic(),
                    });
                    // Best effort: do not leave staging litter behind.
                    let cleanup = format!("rm -f {}", sh_quote(&tmp));
                    let _ = session.exec(&cleanup, timeout).await;
                }
            }
            ConflictMode::Force => {
                // In-place rewrite: works under restrictive directory
                // permissions, at the cost of a brief partial-file window.
                let write = format!("cat > {}", sh_quote(&target));
                let output = session.exec_with_input(&write, &content, timeout).await?;
                if !output.success() {
                    warn!("write of {} refused: {}", transfer.rel, output.diagnostic());
                    issues.push(TransferIssue {
                        rel: transfer.rel.clone(),
                        kind: IssueKind::Write,
                        detail: output.diagnostic(),
                    });
                    continue;
                }
                let finalize = format!("touch -m -d '@{}' {}", transfer.mtime, sh_quote(&target));
                let output = session.exec(&finalize, timeout).await?;
                if output.success() {
                    transferred += 1;
                    debug!("transferred {}", transfer.rel);
                } else {
                    warn!(
                        "could not stamp mtime on {}: {}",
                        transfer.rel,
                        output.diagnostic()
                    );
                    issues.push(TransferIssue {
                        rel: transfer.rel.clone(),
                        kind: IssueKind::Finalize,
                        detail: output.diagnostic(),
                    });
                }
            }
        }
    }

    let status = if issues.is_empty() {
        SyncStatus::Clean
    } else {
        SyncStatus::Partial(issues)
    };

    Ok(SyncOutcome {
        transferred,
        deleted,
        skipped: plan.skipped.len(),
        status,
    })
}

/// Absolute remote path for a root-relative entry
fn remote_target(remote_root: &str, rel: &str) -> String {
    format!("{}/{}", remote_root.trim_end_matches('/'), rel)
}

/// Staging name for the atomic write path: a dot-file next to the target,
/// so the rename stays within one directory
fn staging_name(target: &str) -> String {
    match target.rfind('/') {
        Some(idx) => {
            let (dir, name) = target.split_at(idx + 1);
            format!("{dir}.{name}{TMP_SUFFIX}")
        }
        None => format!(".{target}{TMP_SUFFIX}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::plan::Transfer;

    #[test]
    fn test_remote_target_joins_cleanly() {
        assert_eq!(
            remote_target("/var/www/site", "css/site.css"),
            "/var/www/site/css/site.css"
        );
        assert_eq!(
            remote_target("/var/www/site/", "index.html"),
            "/var/www/site/index.html"
        );
    }

    #[test]
    fn test_staging_name_stays_in_directory() {
        assert_eq!(
            staging_name("/srv/www/css/site.css"),
            "/srv/www/css/.site.css.sitepush-tmp"
        );
        assert_eq!(staging_name("plain.txt"), ".plain.txt.sitepush-tmp");
    }

    #[test]
    fn test_render_report_order_and_shape() {
        let plan = SyncPlan {
            mkdirs: vec!["css".to_string()],
            transfers: vec![
                Transfer {
                    rel: "a.txt".to_string(),
                    mtime: 1,
                },
                Transfer {
                    rel: "b.txt".to_string(),
                    mtime: 1,
                },
            ],
            delete_files: vec!["c.txt".to_string()],
            delete_dirs: vec!["old".to_string()],
            skipped: vec!["logo.png".to_string()],
            excluded: vec![".git/".to_string()],
        };

        let report = render_report(&plan);
        assert_eq!(
            report,
            "mkdir css/\ntransfer a.txt\ntransfer b.txt\ndelete c.txt\ndelete old/\nskip logo.png\nskip .git/\n"
        );
    }

    #[test]
    fn test_render_report_is_deterministic() {
        let plan = SyncPlan {
            transfers: vec![Transfer {
                rel: "a.txt".to_string(),
                mtime: 42,
            }],
            ..SyncPlan::default()
        };
        assert_eq!(render_report(&plan), render_report(&plan));
    }

    #[test]
    fn test_render_report_empty_plan() {
        assert_eq!(render_report(&SyncPlan::default()), "");
    }
}
