//! Shell quoting for remote command construction
//!
//! Every remote command sitepush runs is assembled locally and handed to the
//! remote shell as a string, so paths and arguments must be quoted for
//! single-quoted shell contexts.

/// Escape a string for use inside single-quoted shell contexts.
///
/// Replaces single quotes with the pattern `'"'"'` which:
/// 1. Ends the current single-quoted string
/// 2. Adds a literal single quote via double quotes
/// 3. Starts a new single-quoted string
pub fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Wrap a string in single quotes, escaping embedded quotes.
///
/// The result is safe to splice into a remote shell command as one word.
pub fn sh_quote(s: &str) -> String {
    format!("'{}'", escape_single_quotes(s))
}
