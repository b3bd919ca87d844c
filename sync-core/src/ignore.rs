//! Ignore-file compilation for patchsync.
//!
//! This module turns the lines of a `.gitignore`-style file into an ordered
//! [`RuleSet`]. The rules keep their file order: evaluation walks them once,
//! front to back, and the last rule that matches decides (see
//! [`RuleSet::is_excluded`]). A negated rule (`!pattern`) can therefore
//! re-include a path excluded earlier, and a later plain rule can exclude it
//! again.
//!
//! Glob translation follows git:
//! - a pattern without `/` is matched against the basename of the path, at
//!   any depth;
//! - a pattern with a `/` (or a leading `/`) is anchored to the root and its
//!   wildcards never cross a `/`; `**` spans directories;
//! - a trailing `/` restricts the rule to directories;
//! - a rule that matches a directory matches everything beneath it.

use globset::{Glob, GlobBuilder, GlobMatcher};
use thiserror::Error;

use crate::classify::normalize_path;

/// Error for a single ignore line that could not be compiled.
///
/// These are never fatal: the offending line is dropped and compilation of
/// the remaining lines continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleCompileError {
    /// Nothing left to match once `!`, `/` prefixes and suffixes are stripped.
    #[error("line {line}: empty pattern")]
    EmptyPattern {
        /// 1-based line number in the ignore file.
        line: usize,
    },
    /// The glob syntax is invalid (for example an unclosed `[`).
    #[error("line {line}: invalid glob `{pattern}`: {reason}")]
    InvalidGlob {
        /// 1-based line number in the ignore file.
        line: usize,
        /// The pattern as written.
        pattern: String,
        /// Why the glob was rejected.
        reason: String,
    },
}

impl RuleCompileError {
    /// 1-based line number of the rejected rule.
    pub fn line(&self) -> usize {
        match self {
            RuleCompileError::EmptyPattern { line } => *line,
            RuleCompileError::InvalidGlob { line, .. } => *line,
        }
    }
}

/// One compiled ignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    negated: bool,
    order: usize,
    dir_only: bool,
    anchored: bool,
    glob: Glob,
    matcher: GlobMatcher,
}

impl IgnoreRule {
    /// Compile one ignore-file line.
    ///
    /// Returns `Ok(None)` for blank lines and comments, which produce no rule.
    /// `order` is the 0-based position of the line in its file.
    pub fn parse(line: &str, order: usize) -> Result<Option<Self>, RuleCompileError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let mut glob_src = body;
        let dir_only = glob_src.ends_with('/');
        if dir_only {
            glob_src = glob_src.trim_end_matches('/');
        }
        let rooted = glob_src.starts_with('/');
        if rooted {
            glob_src = &glob_src[1..];
        }
        if glob_src.is_empty() {
            return Err(RuleCompileError::EmptyPattern { line: order + 1 });
        }
        let anchored = rooted || glob_src.contains('/');

        let glob = GlobBuilder::new(glob_src)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| RuleCompileError::InvalidGlob {
                line: order + 1,
                pattern: body.to_string(),
                reason: e.kind().to_string(),
            })?;
        let matcher = glob.compile_matcher();

        Ok(Some(Self {
            pattern: body.to_string(),
            negated,
            order,
            dir_only,
            anchored,
            glob,
            matcher,
        }))
    }

    /// The pattern as written, without the `!` prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this rule re-includes what it matches.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// 0-based position of the rule's line in the ignore file.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Whether the rule only applies to directories (trailing `/`).
    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    /// Whether the rule is matched against the full relative path.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Check the rule against a normalized relative path.
    ///
    /// The path itself is tested unless the rule is directory-only; every
    /// ancestor directory of the path is tested as well.
    pub fn matches(&self, path: &str) -> bool {
        if !self.dir_only && self.matches_entry(path) {
            return true;
        }
        path.match_indices('/')
            .any(|(idx, _)| self.matches_entry(&path[..idx]))
    }

    fn matches_entry(&self, entry: &str) -> bool {
        if self.anchored {
            self.matcher.is_match(entry)
        } else {
            let basename = entry.rsplit('/').next().unwrap_or(entry);
            self.matcher.is_match(basename)
        }
    }
}

impl PartialEq for IgnoreRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.negated == other.negated
            && self.order == other.order
            && self.dir_only == other.dir_only
            && self.anchored == other.anchored
            && self.glob == other.glob
    }
}

impl Eq for IgnoreRule {}

/// Ordered ignore rules, in original file order.
///
/// Immutable once built; reload the ignore file to get a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
}

impl RuleSet {
    /// Create an empty rule set (nothing is excluded).
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile ignore-file lines, silently dropping malformed ones.
    pub fn compile<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::compile_with_errors(lines).0
    }

    /// Compile ignore-file lines, returning the rejected lines alongside.
    pub fn compile_with_errors<I, S>(lines: I) -> (Self, Vec<RuleCompileError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for (order, line) in lines.into_iter().enumerate() {
            match IgnoreRule::parse(line.as_ref(), order) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        (Self { rules }, errors)
    }

    /// Compile the full text of an ignore file.
    pub fn parse(text: &str) -> (Self, Vec<RuleCompileError>) {
        Self::compile_with_errors(text.lines())
    }

    /// The compiled rules, in file order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The last rule in file order that matches `path`, if any.
    ///
    /// This is the rule that decides the path's fate.
    pub fn deciding_rule(&self, path: &str) -> Option<&IgnoreRule> {
        let path = normalize_path(path);
        self.rules.iter().rev().find(|rule| rule.matches(&path))
    }

    /// Whether the rules exclude `path` from sync.
    ///
    /// Single pass in file order, last match wins. A path no rule matches is
    /// included.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let mut excluded = false;
        for rule in &self.rules {
            if rule.matches(&path) {
                excluded = !rule.negated;
            }
        }
        excluded
    }
}
