//! Errno values used by the runtimes.
//!
//! These are the Linux numbers; on unix they are checked against `libc` below.

use std::os::raw::c_int;

pub const ENOENT: c_int = 2;
pub const EIO: c_int = 5;
pub const EBADF: c_int = 9;
pub const ENOMEM: c_int = 12;
pub const EEXIST: c_int = 17;
pub const EINVAL: c_int = 22;
pub const ENOSPC: c_int = 28;

#[cfg(all(test, target_os = "linux"))]
mod tests {
    #[test]
    fn matches_libc() {
        assert_eq!(super::ENOENT, libc::ENOENT);
        assert_eq!(super::EIO, libc::EIO);
        assert_eq!(super::EBADF, libc::EBADF);
        assert_eq!(super::ENOMEM, libc::ENOMEM);
        assert_eq!(super::EEXIST, libc::EEXIST);
        assert_eq!(super::EINVAL, libc::EINVAL);
        assert_eq!(super::ENOSPC, libc::ENOSPC);
    }
}
