//! Exclusion pattern evaluation
//!
//! Compiles the ordered exclusion pattern list into a matcher applied to
//! slash-separated paths relative to the transfer root. Patterns follow the
//! familiar transfer-tool conventions: a leading `/` anchors a pattern to
//! the root, a trailing `/` is accepted for directory rules, and an
//! unanchored pattern matches at any depth. A matching directory excludes
//! its whole subtree.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{DeployError, Result};

/// Compiled exclusion set
#[derive(Debug)]
pub struct ExclusionSet {
    set: GlobSet,
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Compile raw patterns into a matcher.
    ///
    /// Compilation fails only on glob syntax errors, reported as operator
    /// input errors with the offending pattern.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for raw in patterns {
            for glob in expand_pattern(raw)? {
                builder.add(glob);
            }
        }
        let set = builder
            .build()
            .map_err(|e| DeployError::invalid_params(format!("invalid exclusion set: {e}")))?;
        Ok(Self {
            set,
            patterns: patterns.to_vec(),
        })
    }

    /// Whether a root-relative, slash-separated path is excluded
    pub fn matches(&self, rel: &str) -> bool {
        self.set.is_match(rel)
    }

    /// The raw patterns this set was compiled from
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Expand one raw pattern into the globs that implement its semantics:
/// the pattern itself plus `<pattern>/**` for its contents, and an
/// implicit `**/` prefix when the pattern is not anchored.
fn expand_pattern(raw: &str) -> Result<Vec<Glob>> {
    let trimmed = raw.trim_end_matches('/');
    let anchored = trimmed.starts_with('/');
    let base = trimmed.trim_start_matches('/');
    if base.is_empty() {
        return Err(DeployError::invalid_params(format!(
            "invalid exclusion pattern {raw:?}"
        )));
    }

    let mut stems = vec![base.to_string()];
    if !anchored {
        stems.push(format!("**/{base}"));
    }

    let mut globs = Vec::with_capacity(stems.len() * 2);
    for stem in stems {
        globs.push(new_glob(&stem, raw)?);
        globs.push(new_glob(&format!("{stem}/**"), raw)?);
    }
    Ok(globs)
}

fn new_glob(pattern: &str, raw: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| DeployError::invalid_params(format!("invalid exclusion pattern {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(patterns: &[&str]) -> ExclusionSet {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExclusionSet::compile(&patterns).unwrap()
    }

    #[test]
    fn test_name_pattern_matches_at_any_depth() {
        let set = compile(&[".git"]);
        assert!(set.matches(".git"));
        assert!(set.matches(".git/config"));
        assert!(set.matches("vendor/lib/.git"));
        assert!(set.matches("vendor/lib/.git/hooks/pre-commit"));
        assert!(!set.matches("gitignore"));
        assert!(!set.matches("src/git.rs"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let set = compile(&["*.tmp"]);
        assert!(set.matches("scratch.tmp"));
        assert!(set.matches("deep/nested/scratch.tmp"));
        assert!(!set.matches("scratch.tmpl"));
    }

    #[test]
    fn test_anchored_pattern_matches_only_at_root() {
        let set = compile(&["/build"]);
        assert!(set.matches("build"));
        assert!(set.matches("build/out.bin"));
        assert!(!set.matches("src/build"));
        assert!(!set.matches("src/build/out.bin"));
    }

    #[test]
    fn test_trailing_slash_accepted() {
        let set = compile(&["node_modules/"]);
        assert!(set.matches("node_modules"));
        assert!(set.matches("node_modules/left-pad/index.js"));
    }

    #[test]
    fn test_default_set_covers_artifact() {
        let patterns: Vec<String> = crate::config::DEFAULT_EXCLUDES
            .iter()
            .map(|p| p.to_string())
            .collect();
        let set = ExclusionSet::compile(&patterns).unwrap();
        assert!(set.matches(".git/HEAD"));
        assert!(set.matches(".env"));
        assert!(set.matches(".deploy-pass.gpg"));
        assert!(!set.matches("index.html"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let patterns = vec!["/".to_string()];
        assert!(ExclusionSet::compile(&patterns).is_err());
    }
}
