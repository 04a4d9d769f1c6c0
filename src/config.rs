//! Configuration and CLI argument parsing for sitepush

use clap::Parser;
use std::path::PathBuf;

use crate::error::{DeployError, Result};

/// Default timeout for remote command execution in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000; // 60 seconds

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Default name of the encrypted password artifact, resolved inside the
/// source tree
pub const DEFAULT_SECRET_FILE: &str = ".deploy-pass.gpg";

/// Environment variable that pre-seeds the privileged password and
/// suppresses the interactive sudo prompt
pub const SUDO_PASSWORD_ENV: &str = "SITEPUSH_SUDO_PASSWORD";

/// Paths that are never deployed: VCS metadata, environment files, and the
/// tool's own secret artifact
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", ".env", DEFAULT_SECRET_FILE];

/// sitepush CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "sitepush")]
#[command(version)]
#[command(about = "Publish a local directory tree to a remote host over SSH")]
pub struct Args {
    /// Local directory tree to deploy
    #[arg(default_value = ".")]
    pub source: PathBuf,

    /// Remote host to deploy to
    #[arg(long, env = "SITEPUSH_HOST")]
    pub host: String,

    /// SSH port
    #[arg(long, default_value_t = 22, env = "SITEPUSH_PORT")]
    pub port: u16,

    /// SSH username
    #[arg(long, env = "SITEPUSH_USER")]
    pub user: String,

    /// Absolute destination path on the remote host
    #[arg(long, env = "SITEPUSH_REMOTE_PATH")]
    pub remote_path: String,

    /// Path to an SSH private key file for ambient authentication
    #[arg(long, env = "SITEPUSH_KEY")]
    pub key: Option<PathBuf>,

    /// Path to the encrypted password artifact (default: .deploy-pass.gpg
    /// inside the source tree)
    #[arg(long, env = "SITEPUSH_SECRET_FILE")]
    pub secret_file: Option<PathBuf>,

    /// Ownership applied by permission remediation, as user:group
    /// (default: USER:USER)
    #[arg(long, env = "SITEPUSH_OWNER")]
    pub owner: Option<String>,

    /// Additional exclusion pattern, appended to the built-in set.
    /// May be repeated.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Rehearse: compute and report decisions without touching the remote tree
    #[arg(long)]
    pub dry_run: bool,

    /// Re-transfer every file, overwriting destination contents in place
    #[arg(long)]
    pub force: bool,

    /// Repair remote ownership/permissions before and after the sync
    #[arg(
        long,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1,
        action = clap::ArgAction::Set
    )]
    pub fix_perms: bool,

    /// Remote command timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, env = "SITEPUSH_TIMEOUT")]
    pub timeout: u64,
}

/// How existing remote files are overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    /// Skip remote files whose modification time is not older than the
    /// local source; write updates via a temp file and rename
    UpdateOnly,
    /// Re-transfer every file, rewriting destination contents in place
    Force,
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Local source tree
    pub source: PathBuf,

    /// Remote host
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// Absolute destination path, without a trailing slash
    pub remote_path: String,

    /// Explicit SSH private key path
    pub key: Option<PathBuf>,

    /// Encrypted password artifact
    pub secret_file: PathBuf,

    /// Ownership applied by remediation (user:group)
    pub owner: String,

    /// Exclusion patterns: built-in defaults plus operator additions,
    /// in that order
    pub excludes: Vec<String>,

    /// Overwrite policy
    pub conflict_mode: ConflictMode,

    /// Rehearsal mode
    pub dry_run: bool,

    /// Whether pre/post permission remediation is enabled
    pub fix_perms: bool,

    /// Remote command timeout in milliseconds
    pub timeout_ms: u64,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        validate_args(&args)?;

        let remote_path = normalize_remote_path(&args.remote_path);
        let owner = args
            .owner
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| format!("{}:{}", args.user, args.user));
        let secret_file = args
            .secret_file
            .unwrap_or_else(|| args.source.join(DEFAULT_SECRET_FILE));

        let mut excludes: Vec<String> =
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
        // A custom artifact living inside the source tree must never be
        // deployed either.
        if let Ok(rel) = secret_file.strip_prefix(&args.source) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !rel.is_empty() && !excludes.contains(&rel) {
                excludes.push(rel);
            }
        }
        excludes.extend(args.excludes);

        let conflict_mode = if args.force {
            ConflictMode::Force
        } else {
            ConflictMode::UpdateOnly
        };

        Ok(Config {
            source: args.source,
            host: args.host,
            port: args.port,
            user: args.user,
            remote_path,
            key: args.key,
            secret_file,
            owner,
            excludes,
            conflict_mode,
            dry_run: args.dry_run,
            fix_perms: args.fix_perms,
            timeout_ms: args.timeout,
        })
    }
}

/// Validate CLI arguments
fn validate_args(args: &Args) -> Result<()> {
    let mut errors = Vec::new();

    if args.host.is_empty() {
        errors.push("Missing required --host".to_string());
    }

    if args.user.is_empty() {
        errors.push("Missing required --user".to_string());
    }

    if !args.remote_path.starts_with('/') {
        errors.push(format!(
            "--remote-path must be absolute, got {:?}",
            args.remote_path
        ));
    } else if normalize_remote_path(&args.remote_path) == "/" {
        errors.push("--remote-path may not be the filesystem root".to_string());
    }

    if !args.source.is_dir() {
        errors.push(format!(
            "Source directory not found: {}",
            args.source.display()
        ));
    }

    if let Some(ref key_path) = args.key {
        if !key_path.exists() {
            errors.push(format!("SSH key file not found: {}", key_path.display()));
        }
    }

    if args.timeout == 0 {
        errors.push("--timeout must be greater than zero".to_string());
    }

    if !errors.is_empty() {
        return Err(DeployError::InvalidParams(errors.join("\n")));
    }

    Ok(())
}

/// Strip trailing slashes, keeping the root path intact
fn normalize_remote_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(source: &std::path::Path) -> Args {
        Args {
            source: source.to_path_buf(),
            host: "deploy.example.net".to_string(),
            port: 22,
            user: "webadmin".to_string(),
            remote_path: "/var/www/site".to_string(),
            key: None,
            secret_file: None,
            owner: None,
            excludes: Vec::new(),
            dry_run: false,
            force: false,
            fix_perms: true,
            timeout: DEFAULT_TIMEOUT_MS,
        }
    }

    #[test]
    fn test_config_from_valid_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_args(base_args(dir.path())).unwrap();

        assert_eq!(config.remote_path, "/var/www/site");
        assert_eq!(config.owner, "webadmin:webadmin");
        assert_eq!(config.conflict_mode, ConflictMode::UpdateOnly);
        assert_eq!(config.secret_file, dir.path().join(DEFAULT_SECRET_FILE));
        assert!(config.fix_perms);
    }

    #[test]
    fn test_default_excludes_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.excludes = vec!["*.tmp".to_string()];
        let config = Config::from_args(args).unwrap();

        for builtin in DEFAULT_EXCLUDES {
            assert!(config.excludes.iter().any(|p| p == builtin));
        }
        // Operator patterns come after the built-ins.
        assert_eq!(config.excludes.last().unwrap(), "*.tmp");
    }

    #[test]
    fn test_custom_secret_file_inside_source_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.secret_file = Some(dir.path().join("secrets/pass.gpg"));
        let config = Config::from_args(args).unwrap();

        assert!(config.excludes.iter().any(|p| p == "secrets/pass.gpg"));
    }

    #[test]
    fn test_force_switches_conflict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.force = true;
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.conflict_mode, ConflictMode::Force);
    }

    #[test]
    fn test_relative_remote_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.remote_path = "var/www/site".to_string();
        let err = Config::from_args(args).unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn test_root_remote_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.remote_path = "///".to_string();
        let err = Config::from_args(args).unwrap_err();
        assert!(err.to_string().contains("filesystem root"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.remote_path = "/var/www/site/".to_string();
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.remote_path, "/var/www/site");
    }

    #[test]
    fn test_missing_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.source = dir.path().join("nope");
        let err = Config::from_args(args).unwrap_err();
        assert!(err.to_string().contains("Source directory not found"));
    }

    #[test]
    fn test_cli_flag_parsing() {
        use clap::Parser;

        let args = Args::try_parse_from([
            "sitepush",
            "--host",
            "h",
            "--user",
            "u",
            "--remote-path",
            "/srv/www",
            "--dry-run",
            "--force",
            "--fix-perms=false",
        ])
        .unwrap();

        assert!(args.dry_run);
        assert!(args.force);
        assert!(!args.fix_perms);
        assert_eq!(args.source, PathBuf::from("."));
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        use clap::Parser;

        let err = Args::try_parse_from([
            "sitepush",
            "--host",
            "h",
            "--user",
            "u",
            "--remote-path",
            "/srv/www",
            "--frobnicate",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_is_not_an_input_error() {
        use clap::Parser;

        let err = Args::try_parse_from(["sitepush", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
