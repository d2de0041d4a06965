//! `FsRuntime` calls with C-style returns turned into `Result`s.

use std::ffi::CString;
use std::os::raw::c_int;

use fs_runtime::{errno, FsRuntime, OpenFlags};

use crate::error::{Error, Result};

fn last_error<R: FsRuntime>(runtime: &R) -> Error {
    Error::from_errno(runtime.get_errno())
}

pub(crate) fn open<R: FsRuntime>(
    runtime: &R,
    path: &str,
    flags: OpenFlags,
    perm: u32,
) -> Result<c_int> {
    let c_path = CString::new(path).map_err(|_| Error::InvalidArgument("path contains NUL"))?;
    let fd = runtime.open(&c_path, flags, perm);
    if fd < 0 {
        return Err(last_error(runtime));
    }
    Ok(fd)
}

/// One `read(2)`; `Ok(0)` is end of file.
pub(crate) fn read<R: FsRuntime>(runtime: &R, fd: c_int, buffer: &mut [u8]) -> Result<usize> {
    let n = runtime.read(fd, buffer);
    if n < 0 {
        return Err(last_error(runtime));
    }
    #[allow(clippy::cast_sign_loss)]
    Ok(n as usize)
}

/// One `write(2)`; returns the count accepted, at least one byte.
/// A zero count is reported as `EIO`.
pub(crate) fn write<R: FsRuntime>(runtime: &R, fd: c_int, buffer: &[u8]) -> Result<usize> {
    let n = runtime.write(fd, buffer);
    if n < 0 {
        return Err(last_error(runtime));
    }
    if n == 0 {
        return Err(Error::from_errno(errno::EIO));
    }
    #[allow(clippy::cast_sign_loss)]
    Ok((n as usize).min(buffer.len()))
}

pub(crate) fn close<R: FsRuntime>(runtime: &R, fd: c_int) -> Result<()> {
    if runtime.close(fd) < 0 {
        return Err(last_error(runtime));
    }
    Ok(())
}
