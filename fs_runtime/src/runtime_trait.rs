use std::ffi::CStr;
use std::os::raw::c_int;
use std::sync::Arc;

use crate::flags::OpenFlags;

/// Trait for the file-system primitives the buffered engine is built on.
/// Provides an abstraction layer over `open(2)`, `read(2)`, `write(2)` and `close(2)`.
/// This allows for both the libc-based implementation and in-memory implementations (testing).
///
/// Return values follow the C convention: a negative value signals failure,
/// and `get_errno` returns the code of the last failure on the calling thread.
pub trait FsRuntime {
    /// Get the last error number
    fn get_errno(&self) -> c_int;

    /// Open a file, returning a descriptor
    fn open(&self, path: &CStr, flags: OpenFlags, perm: u32) -> c_int;

    /// Read up to `buffer.len()` bytes; 0 means end of file
    fn read(&self, fd: c_int, buffer: &mut [u8]) -> isize;

    /// Write up to `buffer.len()` bytes
    fn write(&self, fd: c_int, buffer: &[u8]) -> isize;

    /// Close a file descriptor
    fn close(&self, fd: c_int) -> c_int;
}

impl<T: FsRuntime + ?Sized> FsRuntime for &T {
    fn get_errno(&self) -> c_int {
        (**self).get_errno()
    }

    fn open(&self, path: &CStr, flags: OpenFlags, perm: u32) -> c_int {
        (**self).open(path, flags, perm)
    }

    fn read(&self, fd: c_int, buffer: &mut [u8]) -> isize {
        (**self).read(fd, buffer)
    }

    fn write(&self, fd: c_int, buffer: &[u8]) -> isize {
        (**self).write(fd, buffer)
    }

    fn close(&self, fd: c_int) -> c_int {
        (**self).close(fd)
    }
}

impl<T: FsRuntime + ?Sized> FsRuntime for Arc<T> {
    fn get_errno(&self) -> c_int {
        (**self).get_errno()
    }

    fn open(&self, path: &CStr, flags: OpenFlags, perm: u32) -> c_int {
        (**self).open(path, flags, perm)
    }

    fn read(&self, fd: c_int, buffer: &mut [u8]) -> isize {
        (**self).read(fd, buffer)
    }

    fn write(&self, fd: c_int, buffer: &[u8]) -> isize {
        (**self).write(fd, buffer)
    }

    fn close(&self, fd: c_int) -> c_int {
        (**self).close(fd)
    }
}
