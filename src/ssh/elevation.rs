//! Privilege escalation for remote remediation commands
//!
//! Wraps commands with `sudo`, piping the privileged password to sudo's
//! stdin when one is held. The password travels inside the command stream
//! of an encrypted channel, never on a visible argument list, and the
//! empty `-p ""` prompt keeps it out of captured stderr.

use super::quote::escape_single_quotes;

/// Wraps a command for execution with sudo privileges.
///
/// With no password, uses `sudo -n` so the command fails fast instead of
/// hanging on a prompt nothing will answer. With a password, uses
/// `printf | sudo -S` to pipe it in; this avoids PTY handling on the SSH
/// channel entirely.
///
/// # Examples
///
/// ```
/// use sitepush::ssh::elevation::wrap_sudo_command;
///
/// // Passwordless sudo
/// let cmd = wrap_sudo_command("chown -R www:www /srv/www", None);
/// assert_eq!(cmd, "sudo -n sh -c 'chown -R www:www /srv/www'");
///
/// // Sudo with password
/// let cmd = wrap_sudo_command("chown -R www:www /srv/www", Some("mypassword"));
/// assert_eq!(
///     cmd,
///     "printf '%s\\n' 'mypassword' | sudo -p \"\" -S sh -c 'chown -R www:www /srv/www'"
/// );
/// ```
pub fn wrap_sudo_command(command: &str, password: Option<&str>) -> String {
    let escaped_command = escape_single_quotes(command);

    match password {
        None => {
            // No password held, use -n to fail if sudo requires one
            format!("sudo -n sh -c '{}'", escaped_command)
        }
        Some(pwd) => {
            let escaped_pwd = escape_single_quotes(pwd);
            format!(
                "printf '%s\\n' '{}' | sudo -p \"\" -S sh -c '{}'",
                escaped_pwd, escaped_command
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_sudo_command_without_password() {
        let result = wrap_sudo_command("chmod -R 755 /srv/www", None);
        assert_eq!(result, "sudo -n sh -c 'chmod -R 755 /srv/www'");
    }

    #[test]
    fn test_wrap_sudo_command_with_password() {
        let result = wrap_sudo_command("chmod -R 755 /srv/www", Some("secret123"));
        assert_eq!(
            result,
            "printf '%s\\n' 'secret123' | sudo -p \"\" -S sh -c 'chmod -R 755 /srv/www'"
        );
    }

    #[test]
    fn test_wrap_sudo_command_with_quotes_in_command() {
        let result = wrap_sudo_command("chown -R www:www '/srv/my site'", None);
        assert_eq!(
            result,
            "sudo -n sh -c 'chown -R www:www '\"'\"'/srv/my site'\"'\"''"
        );
    }

    #[test]
    fn test_wrap_sudo_command_with_quotes_in_password() {
        let result = wrap_sudo_command("chmod -R 755 /srv/www", Some("pass'word"));
        assert_eq!(
            result,
            "printf '%s\\n' 'pass'\"'\"'word' | sudo -p \"\" -S sh -c 'chmod -R 755 /srv/www'"
        );
    }

    #[test]
    fn test_wrap_sudo_command_chained_pipeline() {
        let result = wrap_sudo_command(
            "chown -R www:www /srv/www && find /srv/www -type d -exec chmod 755 {} +",
            Some("admin123"),
        );
        assert_eq!(
            result,
            "printf '%s\\n' 'admin123' | sudo -p \"\" -S sh -c 'chown -R www:www /srv/www && find /srv/www -type d -exec chmod 755 {} +'"
        );
    }
}
