//! Remote tree manifest
//!
//! The remote side of the mirror is captured in a single `find` invocation
//! so the whole reconciliation needs exactly one round trip before the
//! transfers start. Entries matching the exclusion set are dropped from the
//! manifest, which both hides them from the planner and protects them from
//! deletion.

use std::time::Duration;

use tracing::debug;

use crate::error::{DeployError, Result};
use crate::ssh::{sh_quote, SshSession};

use super::filter::ExclusionSet;

/// Kind of a remote entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteKind {
    /// A directory
    Dir,
    /// A regular file with its modification time (seconds since epoch)
    File {
        /// Modification time, seconds since the Unix epoch
        mtime: u64,
    },
}

/// One entry of the remote tree, relative to the destination root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Root-relative, slash-separated path
    pub rel: String,
    /// Entry kind
    pub kind: RemoteKind,
}

/// The remote listing command.
///
/// A missing destination root yields an empty listing rather than an
/// error, so first deployments and dry runs against a fresh host behave
/// the same way.
pub fn manifest_command(remote_root: &str) -> String {
    let quoted = sh_quote(remote_root);
    format!(
        "if [ -d {quoted} ]; then find {quoted} -mindepth 1 -printf '%y|%T@|%P\\n'; fi"
    )
}

/// Fetch and parse the remote manifest
pub async fn fetch(
    session: &SshSession,
    remote_root: &str,
    excludes: &ExclusionSet,
    timeout: Duration,
) -> Result<Vec<RemoteEntry>> {
    let output = session.exec(&manifest_command(remote_root), timeout).await?;
    if !output.success() {
        return Err(DeployError::manifest(format!(
            "listing {} failed: {}",
            remote_root,
            output.diagnostic()
        )));
    }
    parse_manifest(&output.stdout, excludes)
}

/// Parse `find -printf '%y|%T@|%P\n'` output into entries.
///
/// Lines describing anything but regular files and directories are dropped
/// with a debug note; the planner treats such remote paths like excluded
/// ones and leaves them alone.
pub fn parse_manifest(text: &str, excludes: &ExclusionSet) -> Result<Vec<RemoteEntry>> {
    let mut entries = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, '|');
        let (Some(kind), Some(mtime), Some(rel)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DeployError::manifest(format!(
                "malformed listing line: {line:?}"
            )));
        };

        if excludes.matches(rel) {
            continue;
        }

        match kind {
            "d" => entries.push(RemoteEntry {
                rel: rel.to_string(),
                kind: RemoteKind::Dir,
            }),
            "f" => {
                let secs = mtime
                    .split('.')
                    .next()
                    .unwrap_or("0")
                    .parse::<u64>()
                    .map_err(|_| {
                        DeployError::manifest(format!("malformed listing line: {line:?}"))
                    })?;
                entries.push(RemoteEntry {
                    rel: rel.to_string(),
                    kind: RemoteKind::File { mtime: secs },
                });
            }
            other => {
                debug!("ignoring remote entry of type {other:?}: {rel}");
            }
        }
    }

    Ok(entries)
}
