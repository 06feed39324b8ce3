//! Content reconciliation built purely on the capability contract.

use crate::errors::{ErrorKind, Result};
use crate::fileops::{FileOps, WriteOptions};

/// Make the file at `path` hold exactly `desired`, writing only on mismatch.
///
/// The current content is read and compared byte-for-byte (a missing target
/// counts as a mismatch). When `opts` requests a mode, user, or group, those
/// stat fields are compared too, so a content match with drifted metadata
/// still triggers a rewrite. Returns whether a write occurred; at most one
/// `write_bytes` call goes through the contract, and none when everything
/// already matches, sparing remote round-trips and downstream change
/// notifications.
pub fn ensure_contents<P: FileOps>(path: &P, desired: &[u8], opts: &WriteOptions) -> Result<bool> {
    if contents_match(path, desired, opts)? {
        return Ok(false);
    }
    path.write_bytes(desired, opts)?;
    Ok(true)
}

/// [`ensure_contents`] for text content.
pub fn ensure_contents_text<P: FileOps>(
    path: &P,
    desired: &str,
    opts: &WriteOptions,
) -> Result<bool> {
    ensure_contents(path, desired.as_bytes(), opts)
}

fn contents_match<P: FileOps>(path: &P, desired: &[u8], opts: &WriteOptions) -> Result<bool> {
    let current = match path.read_bytes() {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if current != desired {
        return Ok(false);
    }
    if opts.mode.is_some() || opts.user.is_some() || opts.group.is_some() {
        let st = path.stat()?;
        if let Some(mode) = opts.mode {
            if st.mode != mode {
                return Ok(false);
            }
        }
        if let Some(user) = &opts.user {
            if st.user.as_deref() != Some(user.as_str()) {
                return Ok(false);
            }
        }
        if let Some(group) = &opts.group {
            if st.group.as_deref() != Some(group.as_str()) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
