//! Remote workload backend: translates the capability contract into calls
//! against the workload-management protocol's coarse primitives.
//!
//! Operations the protocol lacks (recursive removal without a native flag,
//! directory-tree creation, glob, rename) are emulated as explicit multi-step
//! sequences. None of them are atomic: a failure partway leaves whatever
//! state the completed steps produced, and the core never rolls back.

pub mod client;

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::abspath::AbsPath;
use crate::errors::{PathError, Result};
use crate::fileops::{
    FileOps, MkdirOptions, RemoveOptions, WriteOptions, DEFAULT_DIR_MODE, DEFAULT_WRITE_MODE,
};
use crate::glob::Pattern;
use crate::metadata::{EntryKind, FileMetadata};
use client::{MakeDirOptions as RemoteMakeDirOptions, PushOptions, RemoteClient, RemoteError};

/// A path bound to one remote workload connection.
///
/// The connection handle is shared, not owned: many `RemotePath` values built
/// from the same `Arc` act against the same workload, and all of them fail
/// with [`crate::ErrorKind::BackendUnavailable`] once the connection drops.
#[derive(Clone)]
pub struct RemotePath {
    path: AbsPath,
    client: Arc<dyn RemoteClient>,
}

impl std::fmt::Debug for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemotePath")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// Equal only when bound to the same connection; paths on different workloads
// are never interchangeable.
impl PartialEq for RemotePath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.client, &other.client)
    }
}

impl Eq for RemotePath {}

impl Hash for RemotePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl RemotePath {
    pub fn new(client: Arc<dyn RemoteClient>, path: AbsPath) -> Self {
        Self { path, client }
    }

    pub fn parse(client: Arc<dyn RemoteClient>, path: &str) -> Result<Self> {
        Ok(Self::new(client, AbsPath::new(path)?))
    }

    /// The parent path, bound to the same connection.
    pub fn parent(&self) -> Self {
        Self {
            path: self.path.parent(),
            client: Arc::clone(&self.client),
        }
    }

    fn remote_err(&self, err: RemoteError) -> PathError {
        PathError::from_remote(err, &self.path)
    }

    fn probe(&self, check: impl Fn(&FileMetadata) -> bool) -> Result<bool> {
        match self.client.stat_path(&self.path) {
            Ok(st) => Ok(check(&st)),
            Err(RemoteError::NotFound(_)) | Err(RemoteError::NotADirectory(_)) => Ok(false),
            Err(err) => Err(self.remote_err(err)),
        }
    }

    /// Push `data`, splitting into append chunks when it exceeds the
    /// protocol's payload cap. Invisible to callers.
    fn push_all(&self, data: &[u8], opts: &PushOptions) -> Result<()> {
        match self.client.max_payload() {
            Some(max) if max > 0 && data.len() > max => {
                log::debug!(
                    "chunking {} byte write to {} ({} byte payload cap)",
                    data.len(),
                    self.path,
                    max
                );
                let mut first = true;
                for chunk in data.chunks(max) {
                    let chunk_opts = PushOptions {
                        append: !first,
                        ..opts.clone()
                    };
                    self.client
                        .push(&self.path, chunk, &chunk_opts)
                        .map_err(|err| self.remote_err(err))?;
                    first = false;
                }
                Ok(())
            }
            _ => self
                .client
                .push(&self.path, data, opts)
                .map_err(|err| self.remote_err(err)),
        }
    }

    /// Depth-first removal of a directory tree, for protocols without a
    /// native recursive remove. Entries already removed stay removed if a
    /// later step fails.
    fn remove_tree(&self) -> Result<()> {
        let entries = self
            .client
            .list_dir(&self.path)
            .map_err(|err| self.remote_err(err))?;
        for entry in entries {
            let child = self.child(&entry.name)?;
            if entry.kind == EntryKind::Directory {
                child.remove_tree()?;
            } else {
                self.client
                    .remove_path(&child.path, false)
                    .map_err(|err| child.remote_err(err))?;
            }
        }
        self.client
            .remove_path(&self.path, false)
            .map_err(|err| self.remote_err(err))
    }

    /// Recreate this entry at `dest`, preserving mode and ownership from
    /// stat. Files are pulled and pushed; directories recurse. Entries that
    /// are neither are skipped; the protocol cannot represent them.
    fn copy_entry_to(&self, dest: &RemotePath) -> Result<()> {
        let st = self.stat()?;
        match st.kind {
            EntryKind::File => {
                let data = self
                    .client
                    .pull(&self.path)
                    .map_err(|err| self.remote_err(err))?;
                let opts = PushOptions {
                    mode: Some(st.mode),
                    user: st.user.clone(),
                    group: st.group.clone(),
                    make_dirs: false,
                    append: false,
                };
                dest.push_all(&data, &opts)
            }
            EntryKind::Directory => {
                dest.client
                    .make_dir(
                        &dest.path,
                        &RemoteMakeDirOptions {
                            mode: Some(st.mode),
                            user: st.user.clone(),
                            group: st.group.clone(),
                        },
                    )
                    .map_err(|err| dest.remote_err(err))?;
                let entries = self
                    .client
                    .list_dir(&self.path)
                    .map_err(|err| self.remote_err(err))?;
                for entry in entries {
                    let src_child = self.child(&entry.name)?;
                    let dest_child = dest.child(&entry.name)?;
                    src_child.copy_entry_to(&dest_child)?;
                }
                Ok(())
            }
            EntryKind::Other => {
                log::warn!("move: skipping unsupported entry {}", self.path);
                Ok(())
            }
        }
    }
}

impl FileOps for RemotePath {
    type ReadDir = RemoteReadDir;
    type Glob = RemoteGlob;

    fn path(&self) -> &AbsPath {
        &self.path
    }

    fn child(&self, segment: &str) -> Result<Self> {
        Ok(Self {
            path: self.path.join(segment)?,
            client: Arc::clone(&self.client),
        })
    }

    fn exists(&self) -> Result<bool> {
        self.probe(|_| true)
    }

    fn is_file(&self) -> Result<bool> {
        self.probe(FileMetadata::is_file)
    }

    fn is_dir(&self) -> Result<bool> {
        self.probe(FileMetadata::is_dir)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        self.client
            .pull(&self.path)
            .map_err(|err| self.remote_err(err))
    }

    fn write_bytes(&self, data: &[u8], opts: &WriteOptions) -> Result<()> {
        let push_opts = PushOptions {
            mode: Some(opts.mode.unwrap_or(DEFAULT_WRITE_MODE)),
            user: opts.user.clone(),
            group: opts.group.clone(),
            make_dirs: opts.make_parents,
            append: false,
        };
        self.push_all(data, &push_opts)
    }

    fn mkdir(&self, opts: &MkdirOptions) -> Result<()> {
        if opts.parents {
            // Ancestors are created top-down with default options; an
            // ancestor that already exists is fine either way, and one that
            // exists as a file makes the final make_dir fail NotADirectory.
            for ancestor in self.path.ancestors() {
                match self
                    .client
                    .make_dir(&ancestor, &RemoteMakeDirOptions::default())
                {
                    Ok(()) | Err(RemoteError::AlreadyExists(_)) => {}
                    Err(err) => return Err(PathError::from_remote(err, &ancestor)),
                }
            }
        }
        let make_opts = RemoteMakeDirOptions {
            mode: Some(opts.mode.unwrap_or(DEFAULT_DIR_MODE)),
            user: opts.user.clone(),
            group: opts.group.clone(),
        };
        match self.client.make_dir(&self.path, &make_opts) {
            Ok(()) => Ok(()),
            Err(RemoteError::AlreadyExists(message)) => {
                if !opts.exist_ok {
                    return Err(self.remote_err(RemoteError::AlreadyExists(message)));
                }
                // exist_ok suppresses only the exists check, not a kind mismatch.
                let st = self
                    .client
                    .stat_path(&self.path)
                    .map_err(|err| self.remote_err(err))?;
                if st.kind == EntryKind::Directory {
                    Ok(())
                } else {
                    Err(self.remote_err(RemoteError::NotADirectory(
                        "target exists and is not a directory".into(),
                    )))
                }
            }
            Err(err) => Err(self.remote_err(err)),
        }
    }

    fn unlink(&self, missing_ok: bool) -> Result<()> {
        // remove_path deletes files and empty directories alike, so the kind
        // check has to happen here for local/remote behavior to line up.
        let st = match self.client.stat_path(&self.path) {
            Ok(st) => st,
            Err(RemoteError::NotFound(_)) if missing_ok => return Ok(()),
            Err(err) => return Err(self.remote_err(err)),
        };
        if st.kind == EntryKind::Directory {
            return Err(self.remote_err(RemoteError::IsADirectory(
                "cannot unlink a directory".into(),
            )));
        }
        self.client
            .remove_path(&self.path, false)
            .map_err(|err| self.remote_err(err))
    }

    fn rmdir(&self) -> Result<()> {
        let st = self
            .client
            .stat_path(&self.path)
            .map_err(|err| self.remote_err(err))?;
        if st.kind != EntryKind::Directory {
            return Err(self.remote_err(RemoteError::NotADirectory(
                "cannot rmdir a non-directory".into(),
            )));
        }
        self.client
            .remove_path(&self.path, false)
            .map_err(|err| self.remote_err(err))
    }

    fn remove(&self, opts: &RemoveOptions) -> Result<()> {
        let st = match self.client.stat_path(&self.path) {
            Ok(st) => st,
            Err(RemoteError::NotFound(_)) if opts.missing_ok => return Ok(()),
            Err(err) => return Err(self.remote_err(err)),
        };
        if st.kind != EntryKind::Directory || !opts.recursive {
            return self
                .client
                .remove_path(&self.path, false)
                .map_err(|err| self.remote_err(err));
        }
        match self.client.remove_path(&self.path, true) {
            Ok(()) => Ok(()),
            Err(RemoteError::Unsupported(_)) => {
                log::debug!(
                    "remove: no recursive primitive, emulating depth-first for {}",
                    self.path
                );
                self.remove_tree()
            }
            Err(err) => Err(self.remote_err(err)),
        }
    }

    fn rename(&self, dest: &AbsPath) -> Result<Self> {
        let dest = Self {
            path: dest.clone(),
            client: Arc::clone(&self.client),
        };
        // Surface a missing source before touching the destination.
        self.stat()?;
        match self.client.stat_path(&dest.path) {
            Ok(_) => {
                log::debug!("move: clearing existing target {}", dest.path);
                dest.remove(&RemoveOptions {
                    recursive: true,
                    missing_ok: true,
                })?;
            }
            Err(RemoteError::NotFound(_)) => {}
            Err(err) => return Err(PathError::from_remote(err, &dest.path)),
        }
        self.copy_entry_to(&dest)?;
        self.remove(&RemoveOptions {
            recursive: true,
            missing_ok: false,
        })?;
        Ok(dest)
    }

    fn stat(&self) -> Result<FileMetadata> {
        self.client
            .stat_path(&self.path)
            .map_err(|err| self.remote_err(err))
    }

    fn iterdir(&self) -> Result<RemoteReadDir> {
        let entries = self
            .client
            .list_dir(&self.path)
            .map_err(|err| self.remote_err(err))?;
        Ok(RemoteReadDir {
            base: self.clone(),
            entries: entries.into_iter(),
        })
    }

    fn glob(&self, pattern: &str) -> Result<RemoteGlob> {
        let pattern = Pattern::parse(pattern)?;
        let mut pending = VecDeque::new();
        pending.push_back((self.path.clone(), String::new(), 0usize));
        Ok(RemoteGlob {
            base: self.clone(),
            pattern,
            pending,
            ready: VecDeque::new(),
            done: false,
        })
    }
}

/// Immediate children of a remote directory.
///
/// The listing round-trip happens in [`FileOps::iterdir`]; iteration itself
/// is purely local.
#[derive(Debug)]
pub struct RemoteReadDir {
    base: RemotePath,
    entries: std::vec::IntoIter<client::RemoteEntry>,
}

impl Iterator for RemoteReadDir {
    type Item = Result<RemotePath>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(self.base.child(&entry.name))
    }
}

/// Lazy glob results over a remote directory tree.
///
/// Directories are listed level by level as iteration proceeds; the pattern
/// is matched locally against the names the listing returns.
pub struct RemoteGlob {
    base: RemotePath,
    pattern: Pattern,
    /// Directories still to list: path, rel-prefix from the base, depth.
    pending: VecDeque<(AbsPath, String, usize)>,
    ready: VecDeque<Result<RemotePath>>,
    done: bool,
}

impl Iterator for RemoteGlob {
    type Item = Result<RemotePath>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            if self.done {
                return None;
            }
            let (dir, prefix, depth) = self.pending.pop_front()?;
            let entries = match self.base.client.list_dir(&dir) {
                Ok(entries) => entries,
                // Globbing a non-directory yields nothing, like the local side.
                Err(RemoteError::NotADirectory(_)) if depth == 0 => {
                    self.done = true;
                    return None;
                }
                // A subdirectory removed mid-walk is skipped, not an error.
                Err(RemoteError::NotFound(_)) if depth > 0 => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(PathError::from_remote(err, &dir)));
                }
            };
            for entry in entries {
                let rel = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{prefix}/{}", entry.name)
                };
                let child_depth = depth + 1;
                let child_path = match dir.join(&entry.name) {
                    Ok(path) => path,
                    Err(err) => {
                        self.ready.push_back(Err(err));
                        continue;
                    }
                };
                if entry.kind == EntryKind::Directory
                    && self.pattern.descends_into(&rel, child_depth)
                {
                    self.pending
                        .push_back((child_path.clone(), rel.clone(), child_depth));
                }
                if self.pattern.matches(&rel) {
                    self.ready.push_back(Ok(RemotePath {
                        path: child_path,
                        client: Arc::clone(&self.base.client),
                    }));
                }
            }
        }
    }
}
