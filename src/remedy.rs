//! Remote ownership and permission remediation
//!
//! Served content needs two different permission postures: group-writable
//! while the deploy is landing (so the sync can write), locked down once it
//! is serving. Remediation applies one recursive pipeline per posture —
//! ownership, then directory modes, then file modes, each step gated on the
//! previous one — escalated through sudo on the remote host.

use std::time::Duration;

use tracing::info;

use crate::error::{DeployError, Result};
use crate::secret::Secret;
use crate::ssh::{sh_quote, wrap_sudo_command, SshSession};

/// Ownership and mode bits applied recursively to the remote tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationPolicy {
    /// Profile name, for log lines
    pub name: &'static str,
    /// chown target as user:group
    pub owner: String,
    /// Mode bits for directories
    pub dir_mode: &'static str,
    /// Mode bits for files
    pub file_mode: &'static str,
}

impl RemediationPolicy {
    /// Pre-sync profile: group-writable, so the transfer cannot be locked
    /// out by the previous run's restrictive state
    pub fn permissive(owner: &str) -> Self {
        Self {
            name: "permissive",
            owner: owner.to_string(),
            dir_mode: "2775",
            file_mode: "664",
        }
    }

    /// Post-sync profile: world-readable, owner-writable serving state
    pub fn restrictive(owner: &str) -> Self {
        Self {
            name: "restrictive",
            owner: owner.to_string(),
            dir_mode: "755",
            file_mode: "644",
        }
    }

    /// The remediation pipeline: one logical AND chain so a failed step
    /// short-circuits the rest
    pub fn command(&self, remote_path: &str) -> String {
        let path = sh_quote(remote_path);
        format!(
            "chown -R {owner} {path} && find {path} -type d -exec chmod {dir_mode} {{}} + && find {path} -type f -exec chmod {file_mode} {{}} +",
            owner = sh_quote(&self.owner),
            path = path,
            dir_mode = self.dir_mode,
            file_mode = self.file_mode,
        )
    }
}

/// Apply a remediation policy to the remote tree.
///
/// The pipeline runs under sudo: the privileged password is piped to
/// sudo's stdin when one is held, otherwise `sudo -n` is attempted.
/// Failure carries the remote exit status and diagnostic output.
pub async fn apply(
    session: &SshSession,
    remote_path: &str,
    policy: &RemediationPolicy,
    password: Option<&Secret>,
    timeout: Duration,
) -> Result<()> {
    info!(
        "Applying {} permission profile to {}",
        policy.name, remote_path
    );

    let wrapped = wrap_sudo_command(&policy.command(remote_path), password.map(Secret::expose));
    let output = session.exec(&wrapped, timeout).await?;

    if output.success() {
        info!("{} profile applied", policy.name);
        Ok(())
    } else {
        Err(DeployError::RemoteCommand {
            status: output.status(),
            detail: format!(
                "{} remediation of {} failed: {}",
                policy.name,
                remote_path,
                output.diagnostic()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_profile_bits() {
        let policy = RemediationPolicy::permissive("www-data:www-data");
        assert_eq!(policy.dir_mode, "2775");
        assert_eq!(policy.file_mode, "664");
    }

    #[test]
    fn test_restrictive_profile_bits() {
        let policy = RemediationPolicy::restrictive("www-data:www-data");
        assert_eq!(policy.dir_mode, "755");
        assert_eq!(policy.file_mode, "644");
    }

    #[test]
    fn test_command_is_a_single_and_chain() {
        let policy = RemediationPolicy::restrictive("www-data:www-data");
        let cmd = policy.command("/var/www/site");
        assert_eq!(
            cmd,
            "chown -R 'www-data:www-data' '/var/www/site' && find '/var/www/site' -type d -exec chmod 755 {} + && find '/var/www/site' -type f -exec chmod 644 {} +"
        );
    }

    #[test]
    fn test_command_quotes_awkward_paths() {
        let policy = RemediationPolicy::permissive("web:web");
        let cmd = policy.command("/srv/it's www");
        assert!(cmd.contains("'/srv/it'\"'\"'s www'"));
    }
}
