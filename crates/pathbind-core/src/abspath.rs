//! Purely structural absolute paths.
//!
//! [`AbsPath`] is the value half of a bound path: an absolute POSIX-style
//! path held in normalized form. Joining, splitting, and comparing never
//! touch a filesystem, and `.`/`..` are ordinary opaque segments; resolving
//! them would require filesystem knowledge the remote backend cannot safely
//! provide.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Div;
use std::str::FromStr;

use crate::errors::{ErrorKind, PathError, Result};

/// An absolute path held in normalized form: duplicate separators collapsed,
/// no trailing separator except for the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsPath {
    inner: String,
}

impl AbsPath {
    /// Parse an absolute path string.
    ///
    /// Relative or empty input is rejected with [`ErrorKind::InvalidArgument`].
    pub fn new(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return Err(PathError::new(
                ErrorKind::InvalidArgument,
                format!("path must be absolute: {path:?}"),
            ));
        }
        let mut inner = String::with_capacity(path.len());
        inner.push('/');
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !inner.ends_with('/') {
                inner.push('/');
            }
            inner.push_str(segment);
        }
        Ok(Self { inner })
    }

    /// The filesystem root, `/`.
    pub fn root() -> Self {
        Self { inner: "/".into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_root(&self) -> bool {
        self.inner == "/"
    }

    /// The path's segments, in order. Empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner[1..].split('/').filter(|s| !s.is_empty())
    }

    /// The final segment, or `""` for the root.
    pub fn name(&self) -> &str {
        match self.inner.rfind('/') {
            Some(idx) => &self.inner[idx + 1..],
            None => "",
        }
    }

    /// The final `.ext` of the name, including the dot. Empty when the name
    /// has no extension; a leading or trailing dot alone does not count.
    pub fn suffix(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if idx > 0 && idx < name.len() - 1 => &name[idx..],
            _ => "",
        }
    }

    /// The name with its suffix removed.
    pub fn stem(&self) -> &str {
        let name = self.name();
        &name[..name.len() - self.suffix().len()]
    }

    /// The path with the final segment removed. The root is its own parent.
    pub fn parent(&self) -> AbsPath {
        match self.inner.rfind('/') {
            Some(0) => AbsPath::root(),
            Some(idx) => AbsPath {
                inner: self.inner[..idx].to_string(),
            },
            None => AbsPath::root(),
        }
    }

    /// Every strict ancestor except the root, ordered from the root-most
    /// ancestor down to the parent. Empty for the root and for its direct
    /// children.
    pub fn ancestors(&self) -> Vec<AbsPath> {
        let mut out = Vec::new();
        let mut prefix = String::new();
        let mut segments: Vec<&str> = self.segments().collect();
        segments.pop();
        for segment in segments {
            prefix.push('/');
            prefix.push_str(segment);
            out.push(AbsPath {
                inner: prefix.clone(),
            });
        }
        out
    }

    /// Append one or more segments, producing a new path.
    ///
    /// `part` may contain several segments (`"a/b"`); a part that is itself
    /// absolute replaces the whole path, following the usual path-library
    /// convention. An empty part is a usage error.
    pub fn join(&self, part: &str) -> Result<AbsPath> {
        if part.is_empty() {
            return Err(PathError::new(
                ErrorKind::InvalidArgument,
                "cannot join an empty path segment",
            ));
        }
        if part.starts_with('/') {
            return AbsPath::new(part);
        }
        let mut inner = self.inner.clone();
        for segment in part.split('/').filter(|s| !s.is_empty()) {
            if !inner.ends_with('/') {
                inner.push('/');
            }
            inner.push_str(segment);
        }
        Ok(AbsPath { inner })
    }
}

impl FromStr for AbsPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        AbsPath::new(s)
    }
}

impl fmt::Display for AbsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

// Ordering compares the segment sequence, not the raw string: `/a/c` sorts
// before `/a!b` because `a` precedes `a!b`, even though '!' < '/' byte-wise.
impl Ord for AbsPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for AbsPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Div<&str> for &AbsPath {
    type Output = AbsPath;

    /// Panics if `rhs` is empty; use [`AbsPath::join`] to handle the error.
    fn div(self, rhs: &str) -> AbsPath {
        match self.join(rhs) {
            Ok(path) => path,
            Err(err) => panic!("{err}"),
        }
    }
}

impl Div<&str> for AbsPath {
    type Output = AbsPath;

    /// Panics if `rhs` is empty; use [`AbsPath::join`] to handle the error.
    fn div(self, rhs: &str) -> AbsPath {
        &self / rhs
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn parses_and_normalizes() {
        assert_eq!(AbsPath::new("/").unwrap().as_str(), "/");
        assert_eq!(AbsPath::new("//").unwrap().as_str(), "/");
        assert_eq!(AbsPath::new("/foo//bar/").unwrap().as_str(), "/foo/bar");
        assert_eq!(
            AbsPath::new("/foo/bar").unwrap(),
            AbsPath::new("//foo///bar//").unwrap()
        );
    }

    #[test]
    fn rejects_relative_and_empty() {
        for bad in ["", ".", "foo", "foo/bar", "./foo"] {
            let err = AbsPath::new(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
    }

    #[test]
    fn dots_are_opaque_segments() {
        let path = AbsPath::new("/a/./b/..").unwrap();
        assert_eq!(path.as_str(), "/a/./b/..");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["a", ".", "b", ".."]);
    }

    #[test]
    fn join_appends_segments() {
        let base = AbsPath::new("/etc").unwrap();
        assert_eq!(base.join("app").unwrap().as_str(), "/etc/app");
        assert_eq!(base.join("app/conf.d").unwrap().as_str(), "/etc/app/conf.d");
        assert_eq!((&base / "app" / "x.conf").as_str(), "/etc/app/x.conf");
    }

    #[test]
    fn join_absolute_part_replaces() {
        let base = AbsPath::new("/foo/bar").unwrap();
        assert_eq!(base.join("/baz").unwrap().as_str(), "/baz");
    }

    #[test]
    fn join_empty_is_an_error() {
        let base = AbsPath::new("/foo").unwrap();
        assert_eq!(
            base.join("").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    #[should_panic]
    fn div_panics_on_empty_segment() {
        let _ = AbsPath::new("/foo").unwrap() / "";
    }

    #[test]
    fn parent_stops_at_root() {
        let path = AbsPath::new("/a/b/c").unwrap();
        assert_eq!(path.parent().as_str(), "/a/b");
        assert_eq!(path.parent().parent().as_str(), "/a");
        assert_eq!(path.parent().parent().parent().as_str(), "/");
        assert_eq!(AbsPath::root().parent(), AbsPath::root());
    }

    #[test]
    fn join_then_parent_round_trips() {
        let base = AbsPath::new("/srv/data").unwrap();
        let joined = base.join("a/b/c").unwrap();
        assert_eq!(joined.parent().parent().parent(), base);
    }

    #[test]
    fn ancestors_are_top_down() {
        let path = AbsPath::new("/a/b/c").unwrap();
        let strs: Vec<String> = path.ancestors().iter().map(|p| p.to_string()).collect();
        assert_eq!(strs, ["/a", "/a/b"]);
        assert!(AbsPath::root().ancestors().is_empty());
        assert!(AbsPath::new("/a").unwrap().ancestors().is_empty());
    }

    #[test]
    fn name_stem_suffix() {
        let cases = [
            ("/", "", "", ""),
            ("/foo", "foo", "foo", ""),
            ("/foo.txt", "foo.txt", "foo", ".txt"),
            ("/a/foo.txt.zip", "foo.txt.zip", "foo.txt", ".zip"),
            ("/a/.hidden", ".hidden", ".hidden", ""),
            ("/a/trailing.", "trailing.", "trailing.", ""),
        ];
        for (input, name, stem, suffix) in cases {
            let path = AbsPath::new(input).unwrap();
            assert_eq!(path.name(), name, "name of {input}");
            assert_eq!(path.stem(), stem, "stem of {input}");
            assert_eq!(path.suffix(), suffix, "suffix of {input}");
        }
    }

    #[test]
    fn ordering_is_segment_wise() {
        let a = AbsPath::new("/foo/bar").unwrap();
        let b = AbsPath::new("/foob/ar").unwrap();
        assert!(a < b);
        // '!' sorts below '/' byte-wise, so raw string comparison would give
        // the opposite answer here.
        let c = AbsPath::new("/a!b").unwrap();
        let d = AbsPath::new("/a/c").unwrap();
        assert!(d < c);
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = HashMap::new();
        for raw in ["/foo", "/foo/bar", "/foo/bar/byte"] {
            map.insert(AbsPath::new(raw).unwrap(), raw);
        }
        for raw in ["/foo", "/foo/bar", "/foo/bar/byte"] {
            assert_eq!(map[&AbsPath::new(raw).unwrap()], raw);
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        for raw in ["/", "/a", "/a/b.c", "//x//y//"] {
            let first = AbsPath::new(raw).unwrap();
            let second = AbsPath::new(first.as_str()).unwrap();
            assert_eq!(first, second);
        }
    }
}
