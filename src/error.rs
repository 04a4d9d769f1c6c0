//! Error types for sitepush

use thiserror::Error;

/// Exit code for operator input errors (clap uses the same code for bad flags)
pub const USAGE_EXIT_CODE: i32 = 2;

/// Exit code for authentication failures
pub const AUTH_EXIT_CODE: i32 = 5;

/// Exit code for connection failures
pub const CONNECTION_EXIT_CODE: i32 = 10;

/// Exit code for local I/O failures
pub const LOCAL_IO_EXIT_CODE: i32 = 11;

/// Exit code for remote listing/protocol failures
pub const PROTOCOL_EXIT_CODE: i32 = 12;

/// Exit code for a partial transfer promoted to a run failure
pub const PARTIAL_TRANSFER_EXIT_CODE: i32 = 23;

/// Exit code for remote command timeouts
pub const TIMEOUT_EXIT_CODE: i32 = 30;

/// Main error type for sitepush
#[derive(Debug, Error)]
pub enum DeployError {
    /// SSH connection failed
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Authentication failed (password and key methods exhausted)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Remote command execution timed out
    #[error("Remote command timeout after {0}ms")]
    Timeout(u64),

    /// Invalid configuration or parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Remote tree listing failed or returned unparseable data
    #[error("Remote listing error: {0}")]
    Manifest(String),

    /// A remote command exited non-zero in a context where that is fatal
    #[error("Remote command failed (status {status}): {detail}")]
    RemoteCommand {
        /// Exit status reported by the remote shell
        status: i32,
        /// Diagnostic output captured from the remote command
        detail: String,
    },

    /// Per-file transfer problems promoted to a run failure
    #[error("Partial transfer: {issues} file(s) affected")]
    PartialTransfer {
        /// Number of files that could not be fully synchronized
        issues: usize,
    },

    /// Local I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        DeployError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        DeployError::Authentication(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        DeployError::InvalidParams(msg.into())
    }

    /// Create a remote listing error from a string
    pub fn manifest(msg: impl Into<String>) -> Self {
        DeployError::Manifest(msg.into())
    }

    /// Map the error to the process exit code.
    ///
    /// Remote command failures propagate the remote exit status so the
    /// operator sees the underlying transport's code; a zero status is
    /// clamped to 1 since the command still failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::Connection(_) => CONNECTION_EXIT_CODE,
            DeployError::Authentication(_) => AUTH_EXIT_CODE,
            DeployError::Timeout(_) => TIMEOUT_EXIT_CODE,
            DeployError::InvalidParams(_) => USAGE_EXIT_CODE,
            DeployError::Manifest(_) => PROTOCOL_EXIT_CODE,
            DeployError::RemoteCommand { status, .. } => {
                if *status > 0 {
                    *status
                } else {
                    1
                }
            }
            DeployError::PartialTransfer { .. } => PARTIAL_TRANSFER_EXIT_CODE,
            DeployError::Io(_) => LOCAL_IO_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::Connection("failed to connect".to_string());
        assert_eq!(err.to_string(), "SSH connection error: failed to connect");

        let err = DeployError::Timeout(5000);
        assert_eq!(err.to_string(), "Remote command timeout after 5000ms");
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(DeployError::connection("x").exit_code(), 10);
        assert_eq!(DeployError::auth("x").exit_code(), 5);
        assert_eq!(DeployError::Timeout(1).exit_code(), 30);
        assert_eq!(DeployError::invalid_params("x").exit_code(), 2);
        assert_eq!(DeployError::manifest("x").exit_code(), 12);
        assert_eq!(DeployError::PartialTransfer { issues: 3 }.exit_code(), 23);
        assert_eq!(DeployError::Io(std::io::Error::other("x")).exit_code(), 11);
    }

    #[test]
    fn test_remote_command_exit_code_propagates_status() {
        let err = DeployError::RemoteCommand {
            status: 126,
            detail: "permission denied".to_string(),
        };
        assert_eq!(err.exit_code(), 126);

        // A failed command that somehow reported status 0 still exits non-zero.
        let err = DeployError::RemoteCommand {
            status: 0,
            detail: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
