//! File metadata as reported by stat-style queries.

use chrono::{DateTime, Utc};

/// Kind of filesystem entry.
///
/// Entries that are neither regular files nor directories (sockets, devices,
/// fifos, symlinks) are reported as [`EntryKind::Other`]; the contract has no
/// operations for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Point-in-time metadata for one path.
///
/// Produced fresh on every query; nothing is cached by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub kind: EntryKind,
    /// Content size in bytes. `None` for directories and other non-files.
    pub size: Option<u64>,
    pub mtime: DateTime<Utc>,
    /// Permission bits (the low 12 mode bits).
    pub mode: u32,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
