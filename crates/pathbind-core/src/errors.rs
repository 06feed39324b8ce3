//! Shared error taxonomy for path operations.
//!
//! Both backends translate their native failures (OS errors for the local
//! backend, protocol errors for the remote one) into the same set of kinds,
//! so calling code can branch on [`ErrorKind`] without knowing which backend
//! produced the error.

use std::fmt;
use std::io;

use crate::abspath::AbsPath;
use crate::remote::client::RemoteError;

/// Logical failure condition, independent of the backend that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The target path does not exist and the operation requires it to.
    NotFound,
    /// The target exists and the operation forbids that.
    AlreadyExists,
    /// The operation expects a file but the path is a directory.
    IsADirectory,
    /// The operation expects a directory but the path is not one.
    NotADirectory,
    /// Non-recursive removal attempted on a populated directory.
    DirectoryNotEmpty,
    /// The OS or the remote workload denied the operation.
    PermissionDenied,
    /// Malformed path, bad glob pattern, or invalid option combination.
    InvalidArgument,
    /// Content could not be decoded as requested (e.g. non-UTF-8 text).
    InvalidData,
    /// The remote connection is unreachable or dropped mid-operation.
    BackendUnavailable,
    /// Any failure that cannot be confidently mapped to another kind.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::IsADirectory => "is a directory",
            ErrorKind::NotADirectory => "not a directory",
            ErrorKind::DirectoryNotEmpty => "directory not empty",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidData => "invalid data",
            ErrorKind::BackendUnavailable => "backend unavailable",
            ErrorKind::Unknown => "unknown failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed path operation: the kind, the offending path, and the
/// backend-native message.
#[derive(Debug)]
pub struct PathError {
    kind: ErrorKind,
    path: Option<AbsPath>,
    message: String,
}

impl PathError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            message: message.into(),
        }
    }

    /// Attach the offending path, for diagnostics and for callers that
    /// branch on which path failed.
    pub fn with_path(mut self, path: &AbsPath) -> Self {
        self.path = Some(path.clone());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> Option<&AbsPath> {
        self.path.as_ref()
    }

    /// The backend-native message, preserved verbatim for diagnostics.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Translate a local OS error for `path` into the shared taxonomy.
    pub(crate) fn from_io(err: io::Error, path: &AbsPath) -> Self {
        Self::new(categorize_io_error(&err), err.to_string()).with_path(path)
    }

    /// Translate a remote protocol error for `path` into the shared taxonomy.
    ///
    /// Connection-level failures become [`ErrorKind::BackendUnavailable`];
    /// anything the protocol cannot name precisely stays [`ErrorKind::Unknown`]
    /// rather than being miscategorized.
    pub(crate) fn from_remote(err: RemoteError, path: &AbsPath) -> Self {
        let (kind, message) = match err {
            RemoteError::NotFound(m) => (ErrorKind::NotFound, m),
            RemoteError::AlreadyExists(m) => (ErrorKind::AlreadyExists, m),
            RemoteError::PermissionDenied(m) => (ErrorKind::PermissionDenied, m),
            RemoteError::IsADirectory(m) => (ErrorKind::IsADirectory, m),
            RemoteError::NotADirectory(m) => (ErrorKind::NotADirectory, m),
            RemoteError::DirectoryNotEmpty(m) => (ErrorKind::DirectoryNotEmpty, m),
            RemoteError::Disconnected(m) => (ErrorKind::BackendUnavailable, m),
            RemoteError::Unsupported(m) | RemoteError::Protocol(m) => (ErrorKind::Unknown, m),
        };
        Self::new(kind, message).with_path(path)
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {} ({})", path, self.message, self.kind),
            None => write!(f, "{} ({})", self.message, self.kind),
        }
    }
}

impl std::error::Error for PathError {}

/// Map an OS error onto the shared taxonomy.
pub(crate) fn categorize_io_error(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::IsADirectory => ErrorKind::IsADirectory,
        io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
        io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
        io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        io::ErrorKind::InvalidInput => ErrorKind::InvalidArgument,
        io::ErrorKind::InvalidData => ErrorKind::InvalidData,
        _ => ErrorKind::Unknown,
    }
}

/// Result type for path operations.
pub type Result<T, E = PathError> = std::result::Result<T, E>;
