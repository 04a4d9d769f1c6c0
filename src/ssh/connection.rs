//! SSH session management
//!
//! Establishes the single SSH session a deployment run rides on: connect
//! with a timeout, authenticate (injected password first, ambient keys as
//! fallback), hand out channels, disconnect.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use russh::Channel;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::config::SshConfig;
use super::handler::SshHandler;
use crate::config::CONNECTION_TIMEOUT_SECS;
use crate::error::{DeployError, Result};
use crate::secret::Secret;

/// Default key files tried for ambient authentication, in order
const DEFAULT_KEY_NAMES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

/// An authenticated SSH session to the deployment target.
///
/// The session is established once per run and every remote interaction
/// (listing, transfers, remediation) opens its own exec channel on it.
pub struct SshSession {
    handle: Handle<SshHandler>,
    host: String,
    port: u16,
    username: String,
}

impl SshSession {
    /// Connect and authenticate.
    ///
    /// When `credential` is present (secret-injected transport) password
    /// authentication is attempted first; a rejection degrades to ambient
    /// key authentication with a warning rather than failing the run on
    /// that basis alone. Only the exhaustion of all methods is fatal.
    pub async fn connect(config: &SshConfig, credential: Option<&Secret>) -> Result<Self> {
        info!("Connecting to {}:{}...", config.host, config.port);

        let connection_timeout = Duration::from_secs(CONNECTION_TIMEOUT_SECS);
        let ssh_config = Arc::new(client::Config::default());

        let addr = format!("{}:{}", config.host, config.port);
        let connect_result = timeout(
            connection_timeout,
            client::connect(ssh_config, addr.as_str(), SshHandler::new()),
        )
        .await;

        let mut handle = match connect_result {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                error!("SSH connection failed: {}", e);
                return Err(DeployError::connection(e.to_string()));
            }
            Err(_) => {
                error!("SSH connection timeout after {}s", CONNECTION_TIMEOUT_SECS);
                return Err(DeployError::connection(format!(
                    "Connection timeout after {}s",
                    CONNECTION_TIMEOUT_SECS
                )));
            }
        };

        authenticate(&mut handle, config, credential).await?;

        info!(
            "Connected as {}@{}:{}",
            config.username, config.host, config.port
        );

        Ok(Self {
            handle,
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
        })
    }

    /// Open a new session channel
    pub async fn open_channel(&self) -> Result<Channel<client::Msg>> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| DeployError::connection(format!("Failed to open channel: {}", e)))
    }

    /// Remote endpoint as user@host:port, for log and summary lines
    pub fn endpoint(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }

    /// Close the SSH session
    pub async fn close(&self) {
        let _ = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await;
        info!("SSH connection closed");
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish()
    }
}

/// Authenticate with the SSH server
async fn authenticate(
    handle: &mut Handle<SshHandler>,
    config: &SshConfig,
    credential: Option<&Secret>,
) -> Result<()> {
    if let Some(secret) = credential {
        debug!(
            "Attempting password authentication for user '{}'",
            config.username
        );
        let auth_result = handle
            .authenticate_password(&config.username, secret.expose())
            .await
            .map_err(|e| DeployError::auth(e.to_string()))?;

        if auth_result.success() {
            info!("Password authentication successful");
            return Ok(());
        }
        warn!("Password authentication rejected, falling back to ambient key authentication");
    }

    for key_path in key_candidates(config) {
        debug!("Trying key file {}", key_path.display());

        let key_content = match tokio::fs::read_to_string(&key_path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read {}: {}", key_path.display(), e);
                continue;
            }
        };

        let key = match russh::keys::PrivateKey::from_openssh(key_content.as_bytes()) {
            Ok(key) => key,
            Err(e) => {
                debug!("Cannot parse {}: {}", key_path.display(), e);
                continue;
            }
        };

        let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), None);
        let auth_result = handle
            .authenticate_publickey(&config.username, key_with_alg)
            .await
            .map_err(|e| DeployError::auth(e.to_string()))?;

        if auth_result.success() {
            info!("Key authentication successful ({})", key_path.display());
            return Ok(());
        }
        debug!("Key {} rejected by server", key_path.display());
    }

    Err(DeployError::auth(
        "no authentication method succeeded (password rejected or no usable key)",
    ))
}

/// Key files to try for ambient authentication.
///
/// An explicit `--key` pins the list to that single file; otherwise the
/// operator's default key files are tried in order.
fn key_candidates(config: &SshConfig) -> Vec<PathBuf> {
    if let Some(ref key_path) = config.key_path {
        return vec![key_path.clone()];
    }

    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    let ssh_dir = home.join(".ssh");
    DEFAULT_KEY_NAMES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|path| path.exists())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_pins_candidates() {
        let config =
            SshConfig::new("localhost", "tester").with_key_path("/tmp/nonexistent-deploy-key");
        let candidates = key_candidates(&config);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/tmp/nonexistent-deploy-key")]
        );
    }

    #[test]
    fn test_default_candidates_only_existing_files() {
        let config = SshConfig::new("localhost", "tester");
        for path in key_candidates(&config) {
            assert!(path.exists());
        }
    }
}
