//! Sync engine
//!
//! One-way mirror of the local source tree onto the remote destination:
//! scan the local side, list the remote side, plan the reconciliation, and
//! either render the plan (dry run) or execute it.

pub mod execute;
pub mod filter;
pub mod manifest;
pub mod plan;
pub mod scan;

use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::ssh::SshSession;

// Re-exports
pub use execute::{render_report, IssueKind, SyncOutcome, SyncStatus, TransferIssue};
pub use filter::ExclusionSet;
pub use plan::{SyncPlan, Transfer};

/// A completed sync step: the plan that was computed and, unless this was
/// a dry run, the outcome of executing it
#[derive(Debug)]
pub struct SyncRun {
    /// The reconciliation decisions
    pub plan: SyncPlan,
    /// Execution outcome; `None` for dry runs
    pub outcome: Option<SyncOutcome>,
}

/// Run the sync step for this deployment.
///
/// Dry runs stop after planning; nothing on the remote side is touched,
/// not even the destination root.
pub async fn run(session: &SshSession, config: &Config) -> Result<SyncRun> {
    let timeout = Duration::from_millis(config.timeout_ms);

    let excludes = ExclusionSet::compile(&config.excludes)?;
    let local = scan::scan(&config.source, &excludes)?;
    let remote = manifest::fetch(session, &config.remote_path, &excludes, timeout).await?;
    let mut plan = plan::plan(&local.entries, &remote, config.conflict_mode);
    plan.excluded = local.excluded;

    info!(
        "Plan: {} to transfer, {} to delete, {} unchanged",
        plan.transfers.len(),
        plan.deletions(),
        plan.skipped.len()
    );

    if config.dry_run {
        return Ok(SyncRun {
            plan,
            outcome: None,
        });
    }

    let outcome = execute::execute(
        session,
        &config.source,
        &config.remote_path,
        &plan,
        config.conflict_mode,
        timeout,
    )
    .await?;

    Ok(SyncRun {
        plan,
        outcome: Some(outcome),
    })
}
