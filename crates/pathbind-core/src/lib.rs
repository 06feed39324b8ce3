//! Uniform path manipulation and file I/O over two backends: the local
//! filesystem, or a remote workload reached through a container-management
//! protocol.
//!
//! Automation code writes against the [`FileOps`] contract and behaves
//! identically whichever backend the path is bound to: the same semantics for
//! composite options like `make_parents`/`exist_ok`/`missing_ok`, and the
//! same [`ErrorKind`] taxonomy for every failure condition.
//!
//! ```no_run
//! use pathbind_core::{ensure_contents, LocalPath, WriteOptions};
//!
//! fn main() -> pathbind_core::Result<()> {
//!     let config = LocalPath::parse("/etc/app/app.conf")?;
//!     let opts = WriteOptions {
//!         mode: Some(0o600),
//!         make_parents: true,
//!         ..Default::default()
//!     };
//!     if ensure_contents(&config, b"listen 8080\n", &opts)? {
//!         // content changed; tell the service to reload
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The same function works against a remote workload by binding the path to
//! a [`RemoteClient`] connection with [`RemotePath::new`].

pub mod abspath;
pub mod ensure;
pub mod errors;
pub mod fileops;
mod glob;
pub mod local;
pub mod metadata;
#[cfg(unix)]
mod owner;
pub mod remote;

pub use abspath::AbsPath;
pub use ensure::{ensure_contents, ensure_contents_text};
pub use errors::{ErrorKind, PathError, Result};
pub use fileops::{
    FileOps, MkdirOptions, RemoveOptions, WriteOptions, DEFAULT_DIR_MODE, DEFAULT_WRITE_MODE,
};
pub use local::LocalPath;
pub use metadata::{EntryKind, FileMetadata};
pub use remote::client::{MakeDirOptions, PushOptions, RemoteClient, RemoteEntry, RemoteError};
pub use remote::RemotePath;
