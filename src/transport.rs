//! Transport mode selection
//!
//! Decides, once per run, whether the resolved deploy secret is injected
//! into the SSH login or the run relies on ambient authentication (keys).
//! Selection never fails: a missing secret only narrows capability.

use tracing::{debug, info};

use crate::secret::Secret;

/// How outbound SSH connections authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Rely on pre-existing credentials: an explicit key file or the
    /// operator's default SSH keys
    Ambient,
    /// Supply the resolved secret as the login password
    SecretInjected,
}

impl TransportMode {
    /// Select the transport mode for this run.
    ///
    /// `SecretInjected` requires a resolved credential. The password
    /// injection capability itself is part of the SSH stack, so the only
    /// remaining degradation path is at authentication time: a rejected
    /// password falls back to ambient keys instead of failing the run
    /// (see the connection layer).
    pub fn select(credential: Option<&Secret>) -> Self {
        match credential {
            Some(_) => {
                debug!("deploy secret resolved, injecting it into the SSH login");
                TransportMode::SecretInjected
            }
            None => {
                info!("no deploy secret resolved; relying on ambient SSH authentication");
                TransportMode::Ambient
            }
        }
    }

    /// Whether the resolved secret is injected into the login
    pub fn is_injected(self) -> bool {
        matches!(self, TransportMode::SecretInjected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_with_credential() {
        let secret = Secret::new("pw".to_string());
        let mode = TransportMode::select(Some(&secret));
        assert_eq!(mode, TransportMode::SecretInjected);
        assert!(mode.is_injected());
    }

    #[test]
    fn test_select_without_credential() {
        let mode = TransportMode::select(None);
        assert_eq!(mode, TransportMode::Ambient);
        assert!(!mode.is_injected());
    }
}
