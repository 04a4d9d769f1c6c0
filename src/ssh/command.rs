//! Command execution over SSH
//!
//! Provides the `CommandOutput` struct and the exec primitives the sync
//! engine and permission remediation are built on: plain remote commands
//! and commands fed from a local byte buffer via channel stdin.

use std::time::Duration;

use russh::ChannelMsg;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::connection::SshSession;
use crate::error::{DeployError, Result};

/// Output from a remote command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// Exit code of the command (if available)
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0 or no exit code available)
    pub fn success(&self) -> bool {
        self.exit_code.is_none_or(|code| code == 0)
    }

    /// Exit status as an i32, defaulting to 1 when the remote side
    /// reported none
    pub fn status(&self) -> i32 {
        self.exit_code.map(|c| c as i32).unwrap_or(1)
    }

    /// Diagnostic text for failure reporting: stderr if present,
    /// stdout otherwise
    pub fn diagnostic(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        text.to_string()
    }
}

impl SshSession {
    /// Execute a command over SSH and collect its output.
    ///
    /// Opens a fresh exec channel, runs the command, and gathers
    /// stdout/stderr until the channel closes or the timeout fires.
    /// Timeouts are fatal: a deployment step that hangs cannot be
    /// meaningfully retried mid-run.
    pub async fn exec(&self, command: &str, timeout_duration: Duration) -> Result<CommandOutput> {
        let channel = self.open_channel().await?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| DeployError::connection(format!("Failed to exec command: {}", e)))?;

        match timeout(timeout_duration, collect_output(channel)).await {
            Ok(output) => output,
            Err(_) => {
                warn!(
                    "Remote command timed out after {}ms",
                    timeout_duration.as_millis()
                );
                Err(DeployError::Timeout(timeout_duration.as_millis() as u64))
            }
        }
    }

    /// Execute a command over SSH, feeding `input` to its stdin.
    ///
    /// This is the transfer primitive: file contents are streamed into a
    /// remote `cat > target` process, so the secret-free data path and the
    /// command path share one mechanism.
    pub async fn exec_with_input(
        &self,
        command: &str,
        input: &[u8],
        timeout_duration: Duration,
    ) -> Result<CommandOutput> {
        let channel = self.open_channel().await?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| DeployError::connection(format!("Failed to exec command: {}", e)))?;

        let fed = async {
            channel
                .data(input)
                .await
                .map_err(|e| DeployError::connection(format!("Failed to stream data: {}", e)))?;
            channel
                .eof()
                .await
                .map_err(|e| DeployError::connection(format!("Failed to close stream: {}", e)))?;
            collect_output(channel).await
        };

        match timeout(timeout_duration, fed).await {
            Ok(output) => output,
            Err(_) => {
                warn!(
                    "Remote transfer timed out after {}ms",
                    timeout_duration.as_millis()
                );
                Err(DeployError::Timeout(timeout_duration.as_millis() as u64))
            }
        }
    }
}

/// Collect output from a channel until it closes
async fn collect_output(mut channel: russh::Channel<russh::client::Msg>) -> Result<CommandOutput> {
    let mut output = CommandOutput::default();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                output.stdout.push_str(&String::from_utf8_lossy(&data));
            }
            ChannelMsg::ExtendedData { data, ext } => {
                // ext == 1 is stderr
                if ext == 1 {
                    output.stderr.push_str(&String::from_utf8_lossy(&data));
                } else {
                    output.stdout.push_str(&String::from_utf8_lossy(&data));
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                output.exit_code = Some(exit_status);
            }
            ChannelMsg::Close | ChannelMsg::Eof => {
                break;
            }
            _ => {}
        }
    }

    debug!(
        "Remote command completed: exit_code={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.stdout.len(),
        output.stderr.len()
    );

    Ok(output)
}
