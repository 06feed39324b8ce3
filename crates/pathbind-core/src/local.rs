//! Local filesystem backend: a thin adapter from the capability contract
//! onto the host OS, with errors translated 1:1 into the shared taxonomy.

use std::fs;
use std::io;
use std::path::Path;

use crate::abspath::AbsPath;
use crate::errors::{ErrorKind, PathError, Result};
use crate::fileops::{
    FileOps, MkdirOptions, RemoveOptions, WriteOptions, DEFAULT_DIR_MODE, DEFAULT_WRITE_MODE,
};
use crate::glob::Pattern;
use crate::metadata::{EntryKind, FileMetadata};
#[cfg(unix)]
use crate::owner;

/// A path bound to this machine's filesystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalPath {
    path: AbsPath,
}

impl LocalPath {
    pub fn new(path: AbsPath) -> Self {
        Self { path }
    }

    pub fn parse(path: &str) -> Result<Self> {
        Ok(Self::new(AbsPath::new(path)?))
    }

    /// The parent path, bound to the same backend.
    pub fn parent(&self) -> Self {
        Self::new(self.path.parent())
    }

    fn as_std(&self) -> &Path {
        Path::new(self.path.as_str())
    }

    fn io_err(&self, err: io::Error) -> PathError {
        PathError::from_io(err, &self.path)
    }

    fn probe(&self, check: impl Fn(&fs::Metadata) -> bool) -> Result<bool> {
        match fs::metadata(self.as_std()) {
            Ok(md) => Ok(check(&md)),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(err) => Err(self.io_err(err)),
        }
    }

    fn apply_mode(&self, mode: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(self.as_std(), fs::Permissions::from_mode(mode))
                .map_err(|err| self.io_err(err))
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
            Ok(())
        }
    }

    fn apply_ownership(&self, user: Option<&str>, group: Option<&str>) -> Result<()> {
        if user.is_none() && group.is_none() {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let invalid = |message: String| {
                PathError::new(ErrorKind::InvalidArgument, message).with_path(&self.path)
            };
            let (uid, primary_gid) = match user {
                Some(name) => match owner::lookup_user(name).map_err(|err| self.io_err(err))? {
                    Some(record) => (Some(record.uid), Some(record.gid)),
                    None => return Err(invalid(format!("unknown user {name:?}"))),
                },
                None => (None, None),
            };
            let gid = match group {
                Some(name) => match owner::lookup_group(name).map_err(|err| self.io_err(err))? {
                    Some(gid) => Some(gid),
                    None => return Err(invalid(format!("unknown group {name:?}"))),
                },
                // A bare `user` also sets the group to that user's primary group.
                None => primary_gid,
            };
            owner::chown(self.as_std(), uid, gid).map_err(|err| self.io_err(err))
        }
        #[cfg(not(unix))]
        {
            Err(
                PathError::new(
                    ErrorKind::InvalidArgument,
                    "ownership options are not supported on this platform",
                )
                .with_path(&self.path),
            )
        }
    }
}

impl FileOps for LocalPath {
    type ReadDir = LocalReadDir;
    type Glob = LocalGlob;

    fn path(&self) -> &AbsPath {
        &self.path
    }

    fn child(&self, segment: &str) -> Result<Self> {
        Ok(Self::new(self.path.join(segment)?))
    }

    fn exists(&self) -> Result<bool> {
        self.probe(|_| true)
    }

    fn is_file(&self) -> Result<bool> {
        self.probe(fs::Metadata::is_file)
    }

    fn is_dir(&self) -> Result<bool> {
        self.probe(fs::Metadata::is_dir)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(self.as_std()).map_err(|err| self.io_err(err))
    }

    fn write_bytes(&self, data: &[u8], opts: &WriteOptions) -> Result<()> {
        if opts.make_parents {
            if let Some(parent) = self.as_std().parent() {
                fs::create_dir_all(parent).map_err(|err| self.io_err(err))?;
            }
        }
        fs::write(self.as_std(), data).map_err(|err| self.io_err(err))?;
        self.apply_mode(opts.mode.unwrap_or(DEFAULT_WRITE_MODE))?;
        self.apply_ownership(opts.user.as_deref(), opts.group.as_deref())
    }

    fn mkdir(&self, opts: &MkdirOptions) -> Result<()> {
        if opts.parents {
            if let Some(parent) = self.as_std().parent() {
                fs::create_dir_all(parent).map_err(|err| self.io_err(err))?;
            }
        }
        match fs::create_dir(self.as_std()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                if !opts.exist_ok {
                    return Err(self.io_err(err));
                }
                // exist_ok suppresses only the exists check, not a kind mismatch.
                let md = fs::metadata(self.as_std()).map_err(|e| self.io_err(e))?;
                if !md.is_dir() {
                    return Err(PathError::new(
                        ErrorKind::NotADirectory,
                        "target exists and is not a directory",
                    )
                    .with_path(&self.path));
                }
                return Ok(());
            }
            Err(err) => return Err(self.io_err(err)),
        }
        self.apply_mode(opts.mode.unwrap_or(DEFAULT_DIR_MODE))?;
        self.apply_ownership(opts.user.as_deref(), opts.group.as_deref())
    }

    fn unlink(&self, missing_ok: bool) -> Result<()> {
        match fs::remove_file(self.as_std()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound && missing_ok => Ok(()),
            Err(err) => Err(self.io_err(err)),
        }
    }

    fn rmdir(&self) -> Result<()> {
        fs::remove_dir(self.as_std()).map_err(|err| self.io_err(err))
    }

    fn remove(&self, opts: &RemoveOptions) -> Result<()> {
        let md = match fs::metadata(self.as_std()) {
            Ok(md) => md,
            Err(err) if err.kind() == io::ErrorKind::NotFound && opts.missing_ok => return Ok(()),
            Err(err) => return Err(self.io_err(err)),
        };
        let result = if md.is_dir() {
            if opts.recursive {
                fs::remove_dir_all(self.as_std())
            } else {
                fs::remove_dir(self.as_std())
            }
        } else {
            fs::remove_file(self.as_std())
        };
        result.map_err(|err| self.io_err(err))
    }

    fn rename(&self, dest: &AbsPath) -> Result<Self> {
        let target = Self::new(dest.clone());
        match fs::rename(self.as_std(), target.as_std()) {
            Ok(()) => Ok(target),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists
                        | io::ErrorKind::DirectoryNotEmpty
                        | io::ErrorKind::IsADirectory
                        | io::ErrorKind::NotADirectory
                ) =>
            {
                // Last write wins: clear the obstruction and retry once.
                target.remove(&RemoveOptions {
                    recursive: true,
                    missing_ok: true,
                })?;
                fs::rename(self.as_std(), target.as_std()).map_err(|e| self.io_err(e))?;
                Ok(target)
            }
            Err(err) => Err(self.io_err(err)),
        }
    }

    fn stat(&self) -> Result<FileMetadata> {
        let md = fs::metadata(self.as_std()).map_err(|err| self.io_err(err))?;
        let kind = if md.is_file() {
            EntryKind::File
        } else if md.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        let mtime = md
            .modified()
            .map(chrono::DateTime::from)
            .unwrap_or_else(|_| chrono::Utc::now());
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let uid = md.uid();
            let gid = md.gid();
            Ok(FileMetadata {
                kind,
                size: (kind == EntryKind::File).then(|| md.len()),
                mtime,
                mode: md.mode() & 0o7777,
                uid: Some(uid),
                gid: Some(gid),
                user: owner::user_name(uid),
                group: owner::group_name(gid),
            })
        }
        #[cfg(not(unix))]
        {
            Ok(FileMetadata {
                kind,
                size: (kind == EntryKind::File).then(|| md.len()),
                mtime,
                mode: if md.permissions().readonly() { 0o444 } else { 0o666 },
                uid: None,
                gid: None,
                user: None,
                group: None,
            })
        }
    }

    fn iterdir(&self) -> Result<LocalReadDir> {
        let inner = fs::read_dir(self.as_std()).map_err(|err| self.io_err(err))?;
        Ok(LocalReadDir {
            base: self.path.clone(),
            inner,
        })
    }

    fn glob(&self, pattern: &str) -> Result<LocalGlob> {
        let pattern = Pattern::parse(pattern)?;
        let mut walker = walkdir::WalkDir::new(self.as_std()).min_depth(1);
        if let Some(depth) = pattern.depth() {
            walker = walker.max_depth(depth);
        }
        Ok(LocalGlob {
            base: self.path.clone(),
            it: walker.into_iter(),
            pattern,
        })
    }
}

/// Immediate children of a local directory. Plain forward-only iterator;
/// a fresh [`FileOps::iterdir`] call re-lists.
#[derive(Debug)]
pub struct LocalReadDir {
    base: AbsPath,
    inner: fs::ReadDir,
}

impl Iterator for LocalReadDir {
    type Item = Result<LocalPath>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => return Some(Err(PathError::from_io(err, &self.base))),
        };
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            return Some(Err(PathError::new(
                ErrorKind::InvalidData,
                format!("directory entry name is not valid UTF-8: {name:?}"),
            )
            .with_path(&self.base)));
        };
        Some(self.base.join(name).map(LocalPath::new))
    }
}

/// Lazy glob results over the local filesystem.
#[derive(Debug)]
pub struct LocalGlob {
    base: AbsPath,
    it: walkdir::IntoIter,
    pattern: Pattern,
}

impl Iterator for LocalGlob {
    type Item = Result<LocalPath>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.it.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let message = err.to_string();
                    let kind = err
                        .io_error()
                        .map(crate::errors::categorize_io_error)
                        .unwrap_or(ErrorKind::Unknown);
                    return Some(Err(PathError::new(kind, message).with_path(&self.base)));
                }
            };
            let rel = entry
                .path()
                .strip_prefix(Path::new(self.base.as_str()))
                .unwrap_or(entry.path());
            let Some(rel) = rel.to_str() else {
                continue;
            };
            let rel = rel.to_string();
            if entry.file_type().is_dir() && !self.pattern.descends_into(&rel, entry.depth()) {
                self.it.skip_current_dir();
            }
            if self.pattern.matches(&rel) {
                return Some(self.base.join(&rel).map(LocalPath::new));
            }
        }
    }
}
