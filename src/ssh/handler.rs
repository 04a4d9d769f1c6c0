//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait to handle SSH connection
//! events for deployment sessions.

/// SSH client handler for russh
///
/// Handles SSH events such as server key verification. Deployments target a
/// host the operator configured explicitly, so all server keys are accepted;
/// host key pinning would go here if a deployment pipeline needs it.
#[derive(Debug, Clone)]
pub struct SshHandler;

impl SshHandler {
    /// Create a new SSH handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for SshHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl russh::client::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
