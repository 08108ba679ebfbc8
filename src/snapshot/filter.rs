use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use snafu::{ResultExt, Snafu};

/// Matching capability injected into the [`IgnoreFilter`], so alternate
/// pattern syntaxes can be substituted without touching the filter or
/// the snapshot builder.
pub trait PatternMatcher {
    fn is_match(&self, candidate: &str) -> bool;
}

impl<F> PatternMatcher for F
where
    F: Fn(&str) -> bool,
{
    fn is_match(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// A compiled set of glob patterns. An empty set matches nothing.
///
/// Globs are compiled with default `globset` semantics, where `*` may
/// cross path separators, matching what `fnmatch`-style ignore patterns
/// expect.
#[derive(Debug, Clone, Default)]
pub struct GlobPatterns {
    set: GlobSet,
}

impl GlobPatterns {
    pub fn compile(patterns: &[String]) -> Result<Self, FilterError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).context(InvalidPatternSnafu { pattern })?;
            builder.add(glob);
        }
        let set = builder.build().context(PatternSetSnafu)?;
        Ok(Self { set })
    }
}

impl PatternMatcher for GlobPatterns {
    fn is_match(&self, candidate: &str) -> bool {
        self.set.is_match(candidate)
    }
}

/// Decides whether a directory entry is excluded from a snapshot, from two
/// independent pattern sets: name patterns matched against the bare entry
/// name and path patterns matched against the entry's full path. An entry
/// is excluded if either set matches; names are checked first and
/// short-circuit.
///
/// The filter is applied identically to subdirectory names (preventing
/// descent) and file names at every directory level.
#[derive(Debug, Clone)]
pub struct IgnoreFilter<N = GlobPatterns, P = GlobPatterns> {
    names: N,
    paths: P,
}

impl IgnoreFilter {
    pub fn from_patterns(
        name_patterns: &[String],
        path_patterns: &[String],
    ) -> Result<Self, FilterError> {
        Ok(Self {
            names: GlobPatterns::compile(name_patterns)?,
            paths: GlobPatterns::compile(path_patterns)?,
        })
    }
}

impl<N, P> IgnoreFilter<N, P>
where
    N: PatternMatcher,
    P: PatternMatcher,
{
    pub fn with_matchers(names: N, paths: P) -> Self {
        Self { names, paths }
    }

    pub fn is_ignored(&self, name: &str, full_path: &Path) -> bool {
        self.names.is_match(name) || self.paths.is_match(&full_path.to_string_lossy())
    }
}

/// Built-in name patterns: version-control directories, OS metadata files
/// and compiled-bytecode caches. Overridable via `--ignore-files`.
pub fn default_name_patterns() -> Vec<String> {
    [
        ".git",
        ".svn",
        ".hg",
        ".DS_Store",
        "Thumbs.db",
        "__pycache__",
        "*.pyc",
        ".mypy_cache",
        "node_modules",
        "*~",
        ".#*",
        "#*",
        "*.tmp",
    ]
    .map(String::from)
    .to_vec()
}

/// No full-path patterns are excluded by default.
pub fn default_path_patterns() -> Vec<String> {
    Vec::new()
}

#[derive(Debug, Snafu)]
pub enum FilterError {
    #[snafu(display("Invalid ignore pattern '{}'", pattern))]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
    #[snafu(display("Failed to build the ignore pattern set"))]
    PatternSet { source: globset::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn filter(names: &[&str], paths: &[&str]) -> IgnoreFilter {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let paths: Vec<String> = paths.iter().map(|s| s.to_string()).collect();
        IgnoreFilter::from_patterns(&names, &paths).expect("patterns should compile")
    }

    #[rstest]
    #[case("main.pyc", true)]
    #[case("main.py", false)]
    #[case(".git", true)]
    #[case("backup~", true)]
    #[case(".DS_Store", true)]
    #[case("notes.txt", false)]
    fn default_name_patterns_cover_common_noise(#[case] name: &str, #[case] ignored: bool) {
        let filter =
            IgnoreFilter::from_patterns(&default_name_patterns(), &default_path_patterns())
                .expect("default patterns compile");
        assert_eq!(filter.is_ignored(name, Path::new(name)), ignored);
    }

    #[test]
    fn path_patterns_match_the_full_path() {
        let filter = filter(&[], &["*/build/*"]);

        assert!(filter.is_ignored("out.o", Path::new("/proj/build/out.o")));
        assert!(!filter.is_ignored("out.o", Path::new("/proj/src/out.o")));
    }

    #[test]
    fn exclusion_is_an_or_of_both_sets() {
        let filter = filter(&["*.log"], &["*/tmp/*"]);

        assert!(filter.is_ignored("x.log", Path::new("/keep/x.log")));
        assert!(filter.is_ignored("x.txt", Path::new("/a/tmp/x.txt")));
        assert!(!filter.is_ignored("x.txt", Path::new("/keep/x.txt")));
    }

    #[test]
    fn empty_sets_exclude_nothing() {
        let filter = filter(&[], &[]);
        assert!(!filter.is_ignored(".git", Path::new("/repo/.git")));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let result = IgnoreFilter::from_patterns(&["[".to_string()], &[]);
        assert!(matches!(result, Err(FilterError::InvalidPattern { .. })));
    }

    #[test]
    fn matchers_are_injectable() {
        let filter =
            IgnoreFilter::with_matchers(|name: &str| name == "exact", |_: &str| false);

        assert!(filter.is_ignored("exact", Path::new("/any/exact")));
        assert!(!filter.is_ignored("other", Path::new("/any/other")));
    }
}
