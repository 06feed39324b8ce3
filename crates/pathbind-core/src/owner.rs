//! Unix user/group resolution and ownership changes for the local backend.

#![cfg(unix)]

use std::ffi::{CStr, CString};
use std::io;
use std::mem::MaybeUninit;
use std::path::Path;
use std::ptr;

/// A resolved user account: its uid and primary gid.
pub(crate) struct UserRecord {
    pub uid: u32,
    pub gid: u32,
}

const INITIAL_BUF: usize = 1024;

pub(crate) fn lookup_user(name: &str) -> io::Result<Option<UserRecord>> {
    let cname = cstring(name)?;
    let mut buf = vec![0u8; INITIAL_BUF];
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut found: *mut libc::passwd = ptr::null_mut();
        let rc = unsafe {
            libc::getpwnam_r(
                cname.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut found,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        if found.is_null() {
            return Ok(None);
        }
        let pwd = unsafe { pwd.assume_init() };
        return Ok(Some(UserRecord {
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
        }));
    }
}

pub(crate) fn lookup_group(name: &str) -> io::Result<Option<u32>> {
    let cname = cstring(name)?;
    let mut buf = vec![0u8; INITIAL_BUF];
    loop {
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut found: *mut libc::group = ptr::null_mut();
        let rc = unsafe {
            libc::getgrnam_r(
                cname.as_ptr(),
                grp.as_mut_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut found,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        if found.is_null() {
            return Ok(None);
        }
        let grp = unsafe { grp.assume_init() };
        return Ok(Some(grp.gr_gid));
    }
}

pub(crate) fn user_name(uid: u32) -> Option<String> {
    let mut buf = vec![0u8; INITIAL_BUF];
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut found: *mut libc::passwd = ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                pwd.as_mut_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut found,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || found.is_null() {
            return None;
        }
        let pwd = unsafe { pwd.assume_init() };
        return name_from_ptr(pwd.pw_name);
    }
}

pub(crate) fn group_name(gid: u32) -> Option<String> {
    let mut buf = vec![0u8; INITIAL_BUF];
    loop {
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut found: *mut libc::group = ptr::null_mut();
        let rc = unsafe {
            libc::getgrgid_r(
                gid as libc::gid_t,
                grp.as_mut_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut found,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || found.is_null() {
            return None;
        }
        let grp = unsafe { grp.assume_init() };
        return name_from_ptr(grp.gr_name);
    }
}

/// Change ownership of `path`. `None` leaves the corresponding id unchanged.
pub(crate) fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    let cpath = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;
    // (uid_t)-1 / (gid_t)-1 mean "keep".
    let uid = uid.map(|v| v as libc::uid_t).unwrap_or(libc::uid_t::MAX);
    let gid = gid.map(|v| v as libc::gid_t).unwrap_or(libc::gid_t::MAX);
    let rc = unsafe { libc::chown(cpath.as_ptr(), uid, gid) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn cstring(name: &str) -> io::Result<CString> {
    CString::new(name)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains a NUL byte"))
}

fn name_from_ptr(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let cstr = unsafe { CStr::from_ptr(ptr) };
    Some(cstr.to_string_lossy().into_owned())
}
