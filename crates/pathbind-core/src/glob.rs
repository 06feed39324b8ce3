//! Shell-style glob pattern compilation and matching.
//!
//! Both backends funnel their patterns through [`Pattern`] so matching
//! behavior cannot drift between them: the local backend feeds it paths from
//! a directory walk, the remote backend feeds it entry names from listings.
//! The remote protocol itself never sees glob syntax.

use globset::{GlobBuilder, GlobMatcher};
use once_cell::sync::OnceCell;

use crate::errors::{ErrorKind, PathError, Result};

/// A validated, compiled glob pattern.
///
/// Candidate paths are matched relative to the directory being globbed
/// (`a/b.txt`, never `/a/b.txt`).
#[derive(Debug)]
pub(crate) struct Pattern {
    raw: String,
    matcher: GlobMatcher,
    /// Matchers for each leading segment count, compiled on first use and
    /// used to prune directories that cannot contain matches. Unused for
    /// recursive patterns.
    prefixes: OnceCell<Vec<GlobMatcher>>,
    recursive: bool,
    depth: Option<usize>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |message: String| PathError::new(ErrorKind::InvalidArgument, message);
        if pattern.is_empty() {
            return Err(invalid("glob pattern cannot be empty".into()));
        }
        if pattern.starts_with('/') {
            return Err(invalid(format!(
                "glob pattern must be relative: {pattern:?}"
            )));
        }
        let segments: Vec<&str> = pattern.split('/').collect();
        let mut recursive = false;
        for segment in &segments {
            if segment.is_empty() {
                return Err(invalid(format!(
                    "glob pattern has an empty segment: {pattern:?}"
                )));
            }
            if *segment == "." || *segment == ".." {
                return Err(invalid(format!(
                    "glob pattern cannot contain {segment:?} segments"
                )));
            }
            if segment.contains("**") {
                if *segment != "**" {
                    return Err(invalid(format!(
                        "`**` must be a whole segment: {pattern:?}"
                    )));
                }
                recursive = true;
            }
        }
        let matcher = compile(pattern)?;
        let depth = (!recursive).then_some(segments.len());
        Ok(Self {
            raw: pattern.to_string(),
            matcher,
            prefixes: OnceCell::new(),
            recursive,
            depth,
        })
    }

    /// The exact segment depth matches sit at, `None` for recursive patterns.
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    /// Whether `rel` (a path relative to the globbed directory) matches.
    pub fn matches(&self, rel: &str) -> bool {
        self.matcher.is_match(rel)
    }

    /// Whether a directory at `rel`, `depth` segments below the globbed
    /// directory, can contain matches and should be descended into.
    pub fn descends_into(&self, rel: &str, depth: usize) -> bool {
        if self.recursive {
            return true;
        }
        let Some(target) = self.depth else {
            return false;
        };
        if depth >= target {
            return false;
        }
        match self.prefixes().get(depth - 1) {
            Some(matcher) => matcher.is_match(rel),
            // Prefix compilation failed; walk everything rather than miss.
            None => true,
        }
    }

    fn prefixes(&self) -> &[GlobMatcher] {
        self.prefixes.get_or_init(|| {
            let segments: Vec<&str> = self.raw.split('/').collect();
            let mut matchers = Vec::with_capacity(segments.len().saturating_sub(1));
            for count in 1..segments.len() {
                match compile(&segments[..count].join("/")) {
                    Ok(matcher) => matchers.push(matcher),
                    Err(_) => return Vec::new(),
                }
            }
            matchers
        })
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| PathError::new(ErrorKind::InvalidArgument, err.to_string()))
}
