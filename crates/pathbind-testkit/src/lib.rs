//! In-memory implementation of the workload-management collaborator.
//!
//! [`InMemoryWorkload`] behaves like a remote workload's file API without any
//! transport: a tree of files and directories behind a mutex, with the same
//! structured error signaling a real protocol client would produce. It backs
//! the remote-backend test suites and is useful to downstream consumers for
//! testing their own automation logic without a live workload.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pathbind_core::{
    AbsPath, EntryKind, FileMetadata, MakeDirOptions, PushOptions, RemoteClient, RemoteEntry,
    RemoteError, DEFAULT_DIR_MODE, DEFAULT_WRITE_MODE,
};

struct FileNode {
    data: Vec<u8>,
    mode: u32,
    user: Option<String>,
    group: Option<String>,
    mtime: DateTime<Utc>,
}

struct DirNode {
    children: BTreeMap<String, Node>,
    mode: u32,
    user: Option<String>,
    group: Option<String>,
    mtime: DateTime<Utc>,
}

impl DirNode {
    fn new(mode: u32, user: Option<String>, group: Option<String>) -> Self {
        Self {
            children: BTreeMap::new(),
            mode,
            user,
            group,
            mtime: Utc::now(),
        }
    }
}

enum Node {
    File(FileNode),
    Dir(DirNode),
}

/// An in-memory workload file tree implementing [`RemoteClient`].
pub struct InMemoryWorkload {
    root: Mutex<Node>,
    connected: AtomicBool,
    max_payload: Option<usize>,
    recursive_remove: bool,
    pushes: AtomicUsize,
}

impl Default for InMemoryWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorkload {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Node::Dir(DirNode::new(0o755, None, None))),
            connected: AtomicBool::new(true),
            max_payload: None,
            recursive_remove: true,
            pushes: AtomicUsize::new(0),
        }
    }

    /// Impose a per-message payload cap, like a protocol with a bounded
    /// message size. Pushes above the cap are rejected.
    pub fn with_max_payload(mut self, max: usize) -> Self {
        self.max_payload = Some(max);
        self
    }

    /// Reject the recursive remove flag with [`RemoteError::Unsupported`],
    /// forcing callers onto their depth-first emulation.
    pub fn without_recursive_remove(mut self) -> Self {
        self.recursive_remove = false;
        self
    }

    /// Simulate the workload becoming unreachable: every subsequent call
    /// fails with [`RemoteError::Disconnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Number of push calls served so far. Lets tests assert that an
    /// operation performed no redundant writes.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    fn check_connected(&self) -> Result<(), RemoteError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Disconnected(
                "workload connection closed".into(),
            ))
        }
    }
}

fn not_found() -> RemoteError {
    RemoteError::NotFound("no such file or directory".into())
}

fn not_a_directory() -> RemoteError {
    RemoteError::NotADirectory("not a directory".into())
}

fn lookup<'a>(root: &'a Node, path: &AbsPath) -> Result<&'a Node, RemoteError> {
    let mut cur = root;
    for segment in path.segments() {
        let dir = match cur {
            Node::Dir(dir) => dir,
            Node::File(_) => return Err(not_a_directory()),
        };
        cur = dir.children.get(segment).ok_or_else(not_found)?;
    }
    Ok(cur)
}

/// The mutable parent directory of `path`. Fails on the root itself, on a
/// missing intermediate, or on an intermediate that is a file.
fn parent_dir_mut<'a>(root: &'a mut Node, path: &AbsPath) -> Result<&'a mut DirNode, RemoteError> {
    let mut segments: Vec<&str> = path.segments().collect();
    segments.pop();
    let mut cur = root;
    for segment in segments {
        let dir = match cur {
            Node::Dir(dir) => dir,
            Node::File(_) => return Err(not_a_directory()),
        };
        cur = dir.children.get_mut(segment).ok_or_else(not_found)?;
    }
    match cur {
        Node::Dir(dir) => Ok(dir),
        Node::File(_) => Err(not_a_directory()),
    }
}

/// Like [`parent_dir_mut`], but creates missing intermediate directories.
fn ensure_parent_dirs<'a>(
    root: &'a mut Node,
    path: &AbsPath,
) -> Result<&'a mut DirNode, RemoteError> {
    let mut segments: Vec<&str> = path.segments().collect();
    segments.pop();
    let mut cur = root;
    for segment in segments {
        let dir = match cur {
            Node::Dir(dir) => dir,
            Node::File(_) => return Err(not_a_directory()),
        };
        cur = dir
            .children
            .entry(segment.to_string())
            .or_insert_with(|| Node::Dir(DirNode::new(DEFAULT_DIR_MODE, None, None)));
    }
    match cur {
        Node::Dir(dir) => Ok(dir),
        Node::File(_) => Err(not_a_directory()),
    }
}

impl RemoteClient for InMemoryWorkload {
    fn push(&self, path: &AbsPath, data: &[u8], opts: &PushOptions) -> Result<(), RemoteError> {
        self.check_connected()?;
        self.pushes.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_payload {
            if data.len() > max {
                return Err(RemoteError::Protocol(format!(
                    "payload of {} bytes exceeds the {} byte message limit",
                    data.len(),
                    max
                )));
            }
        }
        if path.is_root() {
            return Err(RemoteError::IsADirectory("/ is a directory".into()));
        }
        let name = path.name().to_string();
        let mut guard = self.root.lock();
        let parent = if opts.make_dirs {
            ensure_parent_dirs(&mut guard, path)?
        } else {
            parent_dir_mut(&mut guard, path)?
        };
        match parent.children.entry(name) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Node::Dir(_) => Err(RemoteError::IsADirectory("target is a directory".into())),
                Node::File(file) => {
                    if opts.append {
                        file.data.extend_from_slice(data);
                    } else {
                        file.data = data.to_vec();
                    }
                    if let Some(mode) = opts.mode {
                        file.mode = mode;
                    }
                    if opts.user.is_some() {
                        file.user = opts.user.clone();
                    }
                    if opts.group.is_some() {
                        file.group = opts.group.clone();
                    }
                    file.mtime = Utc::now();
                    Ok(())
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Node::File(FileNode {
                    data: data.to_vec(),
                    mode: opts.mode.unwrap_or(DEFAULT_WRITE_MODE),
                    user: opts.user.clone(),
                    group: opts.group.clone(),
                    mtime: Utc::now(),
                }));
                Ok(())
            }
        }
    }

    fn pull(&self, path: &AbsPath) -> Result<Vec<u8>, RemoteError> {
        self.check_connected()?;
        let guard = self.root.lock();
        match lookup(&guard, path)? {
            Node::File(file) => Ok(file.data.clone()),
            Node::Dir(_) => Err(RemoteError::IsADirectory("target is a directory".into())),
        }
    }

    fn make_dir(&self, path: &AbsPath, opts: &MakeDirOptions) -> Result<(), RemoteError> {
        self.check_connected()?;
        if path.is_root() {
            return Err(RemoteError::AlreadyExists("/ already exists".into()));
        }
        let name = path.name().to_string();
        let mut guard = self.root.lock();
        let parent = parent_dir_mut(&mut guard, path)?;
        if parent.children.contains_key(&name) {
            return Err(RemoteError::AlreadyExists(format!(
                "{path} already exists"
            )));
        }
        parent.children.insert(
            name,
            Node::Dir(DirNode::new(
                opts.mode.unwrap_or(DEFAULT_DIR_MODE),
                opts.user.clone(),
                opts.group.clone(),
            )),
        );
        Ok(())
    }

    fn list_dir(&self, path: &AbsPath) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.check_connected()?;
        let guard = self.root.lock();
        match lookup(&guard, path)? {
            Node::File(_) => Err(not_a_directory()),
            Node::Dir(dir) => Ok(dir
                .children
                .iter()
                .map(|(name, node)| RemoteEntry {
                    name: name.clone(),
                    kind: match node {
                        Node::File(_) => EntryKind::File,
                        Node::Dir(_) => EntryKind::Directory,
                    },
                })
                .collect()),
        }
    }

    fn remove_path(&self, path: &AbsPath, recursive: bool) -> Result<(), RemoteError> {
        self.check_connected()?;
        if recursive && !self.recursive_remove {
            return Err(RemoteError::Unsupported(
                "remove: recursive flag not supported by this workload".into(),
            ));
        }
        if path.is_root() {
            return Err(RemoteError::Protocol(
                "refusing to remove the workload root".into(),
            ));
        }
        let name = path.name().to_string();
        let mut guard = self.root.lock();
        let parent = parent_dir_mut(&mut guard, path)?;
        let node = parent.children.get(&name).ok_or_else(not_found)?;
        if let Node::Dir(dir) = node {
            if !dir.children.is_empty() && !recursive {
                return Err(RemoteError::DirectoryNotEmpty(format!(
                    "{path} is not empty"
                )));
            }
        }
        parent.children.remove(&name);
        Ok(())
    }

    fn stat_path(&self, path: &AbsPath) -> Result<FileMetadata, RemoteError> {
        self.check_connected()?;
        let guard = self.root.lock();
        Ok(match lookup(&guard, path)? {
            Node::File(file) => FileMetadata {
                kind: EntryKind::File,
                size: Some(file.data.len() as u64),
                mtime: file.mtime,
                mode: file.mode,
                uid: None,
                gid: None,
                user: file.user.clone(),
                group: file.group.clone(),
            },
            Node::Dir(dir) => FileMetadata {
                kind: EntryKind::Directory,
                size: None,
                mtime: dir.mtime,
                mode: dir.mode,
                uid: None,
                gid: None,
                user: dir.user.clone(),
                group: dir.group.clone(),
            },
        })
    }

    fn max_payload(&self) -> Option<usize> {
        self.max_payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(raw: &str) -> AbsPath {
        AbsPath::new(raw).unwrap()
    }

    #[test]
    fn push_pull_round_trip() {
        let workload = InMemoryWorkload::new();
        workload
            .push(&abs("/app.conf"), b"contents", &PushOptions::default())
            .unwrap();
        assert_eq!(workload.pull(&abs("/app.conf")).unwrap(), b"contents");
        assert_eq!(workload.push_count(), 1);
    }

    #[test]
    fn push_requires_parent_unless_make_dirs() {
        let workload = InMemoryWorkload::new();
        let err = workload
            .push(&abs("/a/b/c"), b"x", &PushOptions::default())
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
        workload
            .push(
                &abs("/a/b/c"),
                b"x",
                &PushOptions {
                    make_dirs: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(workload.pull(&abs("/a/b/c")).unwrap(), b"x");
    }

    #[test]
    fn append_accumulates() {
        let workload = InMemoryWorkload::new();
        let opts = PushOptions::default();
        workload.push(&abs("/f"), b"one", &opts).unwrap();
        workload
            .push(
                &abs("/f"),
                b"two",
                &PushOptions {
                    append: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(workload.pull(&abs("/f")).unwrap(), b"onetwo");
    }

    #[test]
    fn payload_cap_is_enforced() {
        let workload = InMemoryWorkload::new().with_max_payload(4);
        let err = workload
            .push(&abs("/f"), b"too large", &PushOptions::default())
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[test]
    fn make_dir_signals_parent_problems() {
        let workload = InMemoryWorkload::new();
        let err = workload
            .make_dir(&abs("/missing/dir"), &MakeDirOptions::default())
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));

        workload
            .push(&abs("/file"), b"", &PushOptions::default())
            .unwrap();
        let err = workload
            .make_dir(&abs("/file/dir"), &MakeDirOptions::default())
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotADirectory(_)));
    }

    #[test]
    fn remove_populated_dir_needs_recursive() {
        let workload = InMemoryWorkload::new();
        workload.make_dir(&abs("/d"), &MakeDirOptions::default()).unwrap();
        workload
            .push(&abs("/d/f"), b"x", &PushOptions::default())
            .unwrap();
        let err = workload.remove_path(&abs("/d"), false).unwrap_err();
        assert!(matches!(err, RemoteError::DirectoryNotEmpty(_)));
        workload.remove_path(&abs("/d"), true).unwrap();
        assert!(matches!(
            workload.stat_path(&abs("/d")).unwrap_err(),
            RemoteError::NotFound(_)
        ));
    }

    #[test]
    fn recursive_flag_can_be_unsupported() {
        let workload = InMemoryWorkload::new().without_recursive_remove();
        workload.make_dir(&abs("/d"), &MakeDirOptions::default()).unwrap();
        let err = workload.remove_path(&abs("/d"), true).unwrap_err();
        assert!(matches!(err, RemoteError::Unsupported(_)));
        // Single-path removal still works.
        workload.remove_path(&abs("/d"), false).unwrap();
    }

    #[test]
    fn disconnect_fails_everything() {
        let workload = InMemoryWorkload::new();
        workload.disconnect();
        assert!(matches!(
            workload.pull(&abs("/x")).unwrap_err(),
            RemoteError::Disconnected(_)
        ));
        workload.reconnect();
        assert!(matches!(
            workload.pull(&abs("/x")).unwrap_err(),
            RemoteError::NotFound(_)
        ));
    }
}
