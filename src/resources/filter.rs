//! Include/exclude selection of archive entries.

use crate::error::{ReleaseError, Result};
use crate::features::ResourceBundleDescriptor;
use regex::Regex;

/// Compiled include/exclude patterns for one bundle.
///
/// Patterns are anchored at the start of the entry path. An exclude match
/// always wins; an empty include list admits every entry not excluded.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl EntryFilter {
    /// Compile the patterns of `bundle`.
    pub fn compile(bundle: &ResourceBundleDescriptor) -> Result<Self> {
        Ok(Self {
            include: compile_all(&bundle.include)?,
            exclude: compile_all(&bundle.exclude)?,
        })
    }

    /// Build directly from pattern lists.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Whether the entry at archive path `path` should be extracted.
    pub fn admits(&self, path: &str) -> bool {
        if self.exclude.iter().any(|p| p.is_match(path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.is_match(path))
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(&format!("^(?:{})", p)).map_err(|e| {
                ReleaseError::invalid_config(format!("bad entry pattern {:?}: {}", p, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_wins_over_include() {
        let filter = EntryFilter::new(&["^data/.*"], &["^data/secret.*"]).unwrap();
        assert!(!filter.admits("data/secret/x"));
        assert!(filter.admits("data/public/y"));
        assert!(!filter.admits("other/z"));
    }

    #[test]
    fn empty_include_admits_everything_not_excluded() {
        let filter = EntryFilter::new(&[], &["debug/"]).unwrap();
        assert!(filter.admits("bin/app.dll"));
        assert!(!filter.admits("debug/app.pdb"));
    }

    #[test]
    fn patterns_are_anchored_at_start() {
        let filter = EntryFilter::new(&["lib/"], &[]).unwrap();
        assert!(filter.admits("lib/x.so"));
        assert!(!filter.admits("usr/lib/x.so"));
    }

    #[test]
    fn invalid_pattern_is_configuration_error() {
        let err = EntryFilter::new(&["("], &[]).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidConfiguration { .. }));
    }
}
