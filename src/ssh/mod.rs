//! SSH session module
//!
//! Connection establishment, authentication, command execution, shell
//! quoting, and sudo wrapping for the deployment session.

pub mod command;
pub mod config;
pub mod connection;
pub mod elevation;
pub mod handler;
pub mod quote;

// Re-exports
pub use command::CommandOutput;
pub use config::SshConfig;
pub use connection::SshSession;
pub use elevation::wrap_sudo_command;
pub use handler::SshHandler;
pub use quote::{escape_single_quotes, sh_quote};
