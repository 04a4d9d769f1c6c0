//! SSH configuration types
//!
//! Connection parameters for the deployment session. The login password is
//! deliberately not part of this struct: the orchestrator owns the resolved
//! secret and lends it to the connection layer at authentication time only.

use std::path::PathBuf;

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Explicit private key path for ambient authentication; when absent,
    /// the operator's default key files are tried
    pub key_path: Option<PathBuf>,
}

impl SshConfig {
    /// Create a new SSH configuration with minimal required fields
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            key_path: None,
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set an explicit private key path
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_config_builder() {
        let config = SshConfig::new("203.0.113.7", "webadmin")
            .with_port(2222)
            .with_key_path("/home/op/.ssh/deploy_key");

        assert_eq!(config.host, "203.0.113.7");
        assert_eq!(config.port, 2222);
        assert_eq!(config.username, "webadmin");
        assert_eq!(
            config.key_path,
            Some(PathBuf::from("/home/op/.ssh/deploy_key"))
        );
    }
}
