//! sitepush - one-way deployment of a local directory tree over SSH
//!
//! This crate publishes a local directory to a remote host, making the
//! remote tree mirror the local one: new and stale files are transferred,
//! remote-only entries are deleted, and excluded paths never move in either
//! direction. Around the mirror it can repair remote ownership and
//! permissions (group-writable while deploying, locked down for serving)
//! and it supports a fully side-effect-free dry run.
//!
//! # Authentication
//!
//! The remote login password may live encrypted next to the content
//! (decrypted via the operator's gpg at run time) and is injected into the
//! SSH login; without it the run degrades to ambient key authentication.
//! Secrets are held in zeroize-on-drop wrappers and never appear on
//! command lines or in logs.
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! sitepush ./public --host=example.net --user=webadmin --remote-path=/var/www/site
//! sitepush ./public --host=example.net --user=webadmin --remote-path=/var/www/site --dry-run
//! ```

pub mod config;
pub mod deploy;
pub mod error;
pub mod remedy;
pub mod secret;
pub mod ssh;
pub mod sync;
pub mod transport;

// Re-exports for convenience
pub use config::{Args, Config, ConflictMode};
pub use deploy::{Deployment, RunOutcome};
pub use error::{DeployError, Result};
pub use secret::Secret;
pub use ssh::{CommandOutput, SshConfig, SshSession};
pub use transport::TransportMode;
