//! The capability contract shared by both backends.
//!
//! [`FileOps`] is the full operation set a bound path supports. Calling code
//! is written against this trait and never inspects which backend it holds;
//! the two implementors ([`LocalPath`](crate::local::LocalPath) and
//! [`RemotePath`](crate::remote::RemotePath)) must produce identical
//! observable behavior for every operation, including error kinds.

use crate::abspath::AbsPath;
use crate::errors::{ErrorKind, PathError, Result};
use crate::metadata::FileMetadata;

/// Permission bits applied to files written without an explicit `mode`.
///
/// Both backends apply this explicitly so observable permissions converge
/// regardless of the local umask or the remote protocol's defaults.
pub const DEFAULT_WRITE_MODE: u32 = 0o644;

/// Permission bits applied to directories created without an explicit `mode`.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Options for `write_bytes`/`write_text`.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Permission bits to set; [`DEFAULT_WRITE_MODE`] when unset.
    pub mode: Option<u32>,
    /// Owner to set. On its own this also sets the group to the user's
    /// primary group.
    pub user: Option<String>,
    /// Owning group to set.
    pub group: Option<String>,
    /// Create missing ancestor directories before writing.
    pub make_parents: bool,
}

/// Options for `mkdir`.
#[derive(Debug, Clone, Default)]
pub struct MkdirOptions {
    /// Create missing ancestors (with [`DEFAULT_DIR_MODE`]); `mode` and
    /// ownership apply to the final target only.
    pub parents: bool,
    /// Suppress [`ErrorKind::AlreadyExists`] when the target is already a
    /// directory. A target existing as anything else still fails with
    /// [`ErrorKind::NotADirectory`].
    pub exist_ok: bool,
    /// Permission bits for the target; [`DEFAULT_DIR_MODE`] when unset.
    pub mode: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
}

/// Options for the generic `remove`.
#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    /// Remove a directory's contents depth-first before the directory itself.
    pub recursive: bool,
    /// Treat a missing target as a silent no-op.
    pub missing_ok: bool,
}

/// The operation set every bound path supports, regardless of backend.
///
/// All operations are blocking: they return once the underlying OS call or
/// remote round-trip completes. The core adds no retries, no caching, and no
/// timeouts of its own.
pub trait FileOps: Sized {
    type ReadDir: Iterator<Item = Result<Self>>;
    type Glob: Iterator<Item = Result<Self>>;

    /// The structural path this value is bound to.
    fn path(&self) -> &AbsPath;

    /// A child of this path, bound to the same backend.
    fn child(&self, segment: &str) -> Result<Self>;

    /// Whether anything exists at the path. Returns `Ok(false)` for a
    /// missing target; errors only signal a broken backend or a failure
    /// that cannot be read as "does not exist".
    fn exists(&self) -> Result<bool>;

    /// Whether the path denotes a regular file.
    fn is_file(&self) -> Result<bool>;

    /// Whether the path denotes a directory.
    fn is_dir(&self) -> Result<bool>;

    /// Full content of a regular file.
    ///
    /// Fails [`ErrorKind::NotFound`] if absent, [`ErrorKind::IsADirectory`]
    /// if the path denotes a directory.
    fn read_bytes(&self) -> Result<Vec<u8>>;

    /// [`FileOps::read_bytes`] decoded as UTF-8; non-UTF-8 content fails
    /// [`ErrorKind::InvalidData`].
    fn read_text(&self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|err| {
            PathError::new(ErrorKind::InvalidData, err.to_string()).with_path(self.path())
        })
    }

    /// Write `data`, replacing any existing content unconditionally.
    ///
    /// Permissions and ownership from `opts` are applied with the write.
    /// No partial-write visibility guarantee is promised across backends.
    fn write_bytes(&self, data: &[u8], opts: &WriteOptions) -> Result<()>;

    /// [`FileOps::write_bytes`] for text content.
    fn write_text(&self, text: &str, opts: &WriteOptions) -> Result<()> {
        self.write_bytes(text.as_bytes(), opts)
    }

    /// Create a directory at the path.
    fn mkdir(&self, opts: &MkdirOptions) -> Result<()>;

    /// Remove a regular file. Fails [`ErrorKind::IsADirectory`] on a
    /// directory; `missing_ok` suppresses only [`ErrorKind::NotFound`].
    fn unlink(&self, missing_ok: bool) -> Result<()>;

    /// Remove an empty directory. Fails [`ErrorKind::NotADirectory`] on a
    /// non-directory and [`ErrorKind::DirectoryNotEmpty`] on a populated one.
    fn rmdir(&self) -> Result<()>;

    /// Remove a file or directory tree according to `opts`.
    ///
    /// On the remote backend a recursive removal may be emulated depth-first;
    /// a failure partway leaves the entries already removed gone. No rollback.
    fn remove(&self, opts: &RemoveOptions) -> Result<()>;

    /// Relocate the entry to `dest` on the same backend, replacing any
    /// existing target so the destination reflects the source afterwards
    /// ("last write wins" on every backend).
    ///
    /// The local backend renames atomically where the OS allows; the remote
    /// backend emulates with copy-then-delete and is NOT atomic: a failure
    /// partway can leave both paths present, or a partially copied
    /// destination. Callers must not rely on atomicity here.
    fn rename(&self, dest: &AbsPath) -> Result<Self>;

    /// Fresh metadata for the path. Fails [`ErrorKind::NotFound`] if absent.
    fn stat(&self) -> Result<FileMetadata>;

    /// The immediate children of a directory, in backend-defined order.
    ///
    /// Each call re-lists; the returned iterator is plain and forward-only.
    fn iterdir(&self) -> Result<Self::ReadDir>;

    /// Children whose path relative to this one matches a shell-style glob
    /// pattern (`*`, `?`, `[...]`, and `**` as a whole segment for recursive
    /// descent). Matching is case-sensitive; the pattern must be relative.
    ///
    /// Globbing a non-directory yields an empty sequence; a malformed
    /// pattern fails [`ErrorKind::InvalidArgument`] up front.
    fn glob(&self, pattern: &str) -> Result<Self::Glob>;
}
