//! Segment-wise path patterns
//!
//! A pattern like `small_variants/.+-germline.vcf.gz$` holds one regex
//! fragment per directory level. Resolution starts at a root directory and, at
//! each level, keeps the children whose path relative to the root contains a
//! match for that level's fragment.

use super::error::{DiscoveryError, Result};
use super::vfs::{DirectoryEntry, Entry};
use regex::Regex;
use std::fmt;
use tracing::warn;

/// Compiled segment pattern with an optional exclusion
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    fragments: Vec<Regex>,
    exclude: Option<Regex>,
}

impl PathPattern {
    pub fn new(raw: &str) -> Result<Self> {
        let fragments = raw
            .split('/')
            .map(|fragment| compile(raw, fragment))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            raw: raw.to_string(),
            fragments,
            exclude: None,
        })
    }

    /// Drop results whose relative path matches `exclude`.
    pub fn with_exclude(mut self, exclude: &str) -> Result<Self> {
        self.exclude = Some(compile(exclude, exclude)?);
        Ok(self)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of directory levels the pattern descends.
    pub fn depth(&self) -> usize {
        self.fragments.len()
    }

    /// Every entry matching the pattern below `root`, sorted by path.
    ///
    /// Non-directory candidates are dropped before the next level is expanded,
    /// so only the last fragment can select files.
    pub fn expand(&self, root: &Entry) -> Result<Vec<Entry>> {
        let mut candidates = vec![root.clone()];
        for fragment in &self.fragments {
            let mut next = Vec::new();
            for candidate in candidates.iter().filter(|c| c.is_dir()) {
                for child in candidate.children()? {
                    if fragment.is_match(&child.relative_to(root)) {
                        next.push(child);
                    }
                }
            }
            candidates = next;
        }

        if let Some(exclude) = &self.exclude {
            candidates.retain(|entry| !exclude.is_match(&entry.relative_to(root)));
        }
        candidates.sort_by_key(|entry| entry.display_path());
        Ok(candidates)
    }

    /// Whether anything below `root` matches.
    pub fn probe(&self, root: &Entry) -> Result<bool> {
        Ok(!self.expand(root)?.is_empty())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn compile(pattern: &str, fragment: &str) -> Result<Regex> {
    Regex::new(fragment).map_err(|source| DiscoveryError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// What to do when a pattern resolves to more than one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Several matches are a fatal error.
    #[default]
    Strict,
    /// Take the lexicographically first path and warn.
    FirstByPath,
}

/// Resolve `pattern` below `root` to at most one entry.
pub fn resolve(pattern: &PathPattern, root: &Entry, policy: AmbiguityPolicy) -> Result<Option<Entry>> {
    let mut matches = pattern.expand(root)?;
    match (matches.len(), policy) {
        (0, _) => Ok(None),
        (1, _) => Ok(matches.pop()),
        (count, AmbiguityPolicy::FirstByPath) => {
            let selected = matches.swap_remove(0);
            warn!(
                directory = %root,
                pattern = %pattern,
                count,
                selected = %selected,
                "Multiple matches, only one is compared; selecting the first by path"
            );
            Ok(Some(selected))
        }
        (_, AmbiguityPolicy::Strict) => Err(DiscoveryError::AmbiguousMatch {
            pattern: pattern.to_string(),
            directory: root.display_path(),
            matches: matches.iter().map(Entry::display_path).collect(),
        }),
    }
}
