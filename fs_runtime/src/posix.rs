use crate::flags::OpenFlags;
use crate::runtime_trait::FsRuntime;
use std::ffi::CStr;
use std::os::raw::{c_int, c_uint};

/// libc-based implementation of `FsRuntime`.
/// Each method issues exactly one system call.
#[derive(Debug, Clone, Copy)]
pub struct PosixRuntime;

impl PosixRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PosixRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FsRuntime for PosixRuntime {
    fn get_errno(&self) -> c_int {
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    fn open(&self, path: &CStr, flags: OpenFlags, perm: u32) -> c_int {
        unsafe { libc::open(path.as_ptr(), flags.to_raw(), perm as c_uint) }
    }

    fn read(&self, fd: c_int, buffer: &mut [u8]) -> isize {
        unsafe { libc::read(fd, buffer.as_mut_ptr().cast::<libc::c_void>(), buffer.len()) }
    }

    fn write(&self, fd: c_int, buffer: &[u8]) -> isize {
        unsafe { libc::write(fd, buffer.as_ptr().cast::<libc::c_void>(), buffer.len()) }
    }

    fn close(&self, fd: c_int) -> c_int {
        unsafe { libc::close(fd) }
    }
}
