//! The narrow interface the core needs from the workload-management
//! protocol.
//!
//! The protocol client itself (transport, authentication, wire format) is
//! created and owned outside this crate; the core only calls through this
//! trait. Implementations translate their native failures into
//! [`RemoteError`] so the remote backend can map them onto the shared
//! taxonomy without guessing.

use std::fmt;

use crate::abspath::AbsPath;
use crate::metadata::{EntryKind, FileMetadata};

/// Options for a single push of file content.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Permission bits to set with the write.
    pub mode: Option<u32>,
    /// Owner to set; the protocol resolves a bare user to its primary group.
    pub user: Option<String>,
    /// Owning group to set.
    pub group: Option<String>,
    /// Create missing ancestor directories before writing.
    pub make_dirs: bool,
    /// Append to the existing content instead of truncating. Used by the
    /// backend to split writes that exceed [`RemoteClient::max_payload`].
    pub append: bool,
}

/// Options for creating a single directory.
#[derive(Debug, Clone, Default)]
pub struct MakeDirOptions {
    pub mode: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
}

/// One entry from a non-recursive directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Structured error signaling from the protocol.
///
/// Each variant carries the protocol-native message verbatim. Anything the
/// protocol cannot classify must be reported as [`RemoteError::Protocol`]
/// (or [`RemoteError::Disconnected`] for connection-level failures), never
/// shoehorned into a more specific variant.
#[derive(Debug, Clone)]
pub enum RemoteError {
    NotFound(String),
    AlreadyExists(String),
    PermissionDenied(String),
    IsADirectory(String),
    NotADirectory(String),
    DirectoryNotEmpty(String),
    /// The protocol does not implement the requested primitive (e.g. a
    /// recursive remove flag); the backend emulates instead.
    Unsupported(String),
    /// The workload is unreachable or the connection dropped mid-operation.
    Disconnected(String),
    /// Any other protocol-level failure.
    Protocol(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, message) = match self {
            RemoteError::NotFound(m) => ("not found", m),
            RemoteError::AlreadyExists(m) => ("already exists", m),
            RemoteError::PermissionDenied(m) => ("permission denied", m),
            RemoteError::IsADirectory(m) => ("is a directory", m),
            RemoteError::NotADirectory(m) => ("not a directory", m),
            RemoteError::DirectoryNotEmpty(m) => ("directory not empty", m),
            RemoteError::Unsupported(m) => ("unsupported", m),
            RemoteError::Disconnected(m) => ("disconnected", m),
            RemoteError::Protocol(m) => ("protocol failure", m),
        };
        write!(f, "{label}: {message}")
    }
}

impl std::error::Error for RemoteError {}

/// File-management primitives of the remote workload protocol.
///
/// The primitives are deliberately coarse: one path per call, non-recursive
/// listing, no rename, no glob. The remote backend composes everything else
/// out of these. Implementations declare their own thread-safety through the
/// `Send + Sync` bound; the core never serializes access on their behalf.
pub trait RemoteClient: Send + Sync {
    /// Write `data` to a file, creating or truncating it (or appending when
    /// [`PushOptions::append`] is set).
    fn push(&self, path: &AbsPath, data: &[u8], opts: &PushOptions) -> Result<(), RemoteError>;

    /// Read a file's full content.
    fn pull(&self, path: &AbsPath) -> Result<Vec<u8>, RemoteError>;

    /// Create a single directory. The parent must already exist.
    fn make_dir(&self, path: &AbsPath, opts: &MakeDirOptions) -> Result<(), RemoteError>;

    /// List the immediate entries of a directory.
    fn list_dir(&self, path: &AbsPath) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Remove a file or an empty directory; with `recursive`, a whole tree
    /// if the protocol supports it (otherwise [`RemoteError::Unsupported`]).
    fn remove_path(&self, path: &AbsPath, recursive: bool) -> Result<(), RemoteError>;

    /// Fresh metadata for a single path.
    fn stat_path(&self, path: &AbsPath) -> Result<FileMetadata, RemoteError>;

    /// Largest payload one push message may carry, if the protocol imposes
    /// a cap. The backend chunks larger writes transparently.
    fn max_payload(&self) -> Option<usize> {
        None
    }
}
