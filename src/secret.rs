//! Credential resolution and in-memory secret handling
//!
//! The remote login password lives, encrypted, in an artifact next to the
//! content it deploys. Resolution shells out to the operator's installed
//! `gpg`; every degraded outcome (no artifact, no gpg, failed or empty
//! decryption) downgrades the run to ambient authentication instead of
//! failing it.

use std::path::Path;
use std::process::Stdio;

use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;
use tracing::{debug, warn};

/// An in-memory secret with automatic zeroing on drop.
///
/// Wraps `secrecy::SecretString` so the plaintext is wiped when the value
/// goes out of scope, `Debug`/`Display` print `[REDACTED]`, and access
/// requires an explicit `expose()` call. The deployment orchestrator owns
/// every `Secret` for the lifetime of a run; there is no `Clone`.
pub struct Secret {
    inner: SecretString,
}

impl Secret {
    /// Move a plaintext string into secure storage
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Expose the secret value for immediate use.
    ///
    /// The exposed value must not be logged, persisted, or placed on a
    /// command line; it is only ever streamed to a subprocess stdin or an
    /// SSH authentication request.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Check whether the secret is empty without exposing it
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Resolve the deploy password from the encrypted artifact.
///
/// Returns `None` in every non-fatal case:
/// - the artifact does not exist (the normal, expected state);
/// - `gpg` is not installed;
/// - decryption fails or produces an empty secret.
///
/// gpg may prompt for its own passphrase on the controlling terminal
/// (stdin is inherited for that reason); the decrypted secret only travels
/// through the captured stdout pipe.
pub async fn resolve(artifact: &Path) -> Option<Secret> {
    if !artifact.exists() {
        debug!(
            "no secret artifact at {}, using ambient authentication",
            artifact.display()
        );
        return None;
    }

    let result = Command::new("gpg")
        .arg("--quiet")
        .arg("--decrypt")
        .arg(artifact)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("gpg is not installed; continuing with ambient authentication");
            return None;
        }
        Err(e) => {
            warn!("failed to run gpg: {e}; continuing with ambient authentication");
            return None;
        }
    };

    if !output.status.success() {
        warn!(
            "gpg could not decrypt {}: {}; continuing with ambient authentication",
            artifact.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let secret = text.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        warn!(
            "decrypted secret from {} is empty; continuing with ambient authentication",
            artifact.display()
        );
        return None;
    }

    debug!("resolved deploy secret from {}", artifact.display());
    Some(Secret::new(secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_expose_returns_value() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(secret.expose(), "hunter2");
        assert!(!secret.is_empty());
    }

    #[tokio::test]
    async fn test_absent_artifact_resolves_to_none() {
        // Must return quickly with None: no decryption attempt, no prompt.
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("missing.gpg");
        assert!(resolve(&artifact).await.is_none());
    }
}
