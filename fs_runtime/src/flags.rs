//! Open flags, decoupled from the platform `O_*` constants.

use std::os::raw::c_int;

/// Permission bits for files created by `open`: `rw-r--r--`.
pub const DEFAULT_PERM: u32 = 0o644;

/// Access direction of a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    ReadOnly,
    WriteOnly,
}

/// Flags passed to [`FsRuntime::open`](crate::FsRuntime::open).
///
/// `append`, `create`, `exclusive`, `truncate`, `sync` and `dsync` map one to one
/// to `O_APPEND`, `O_CREAT`, `O_EXCL`, `O_TRUNC`, `O_SYNC` and `O_DSYNC`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct OpenFlags {
    pub access: Access,
    pub append: bool,
    pub create: bool,
    pub exclusive: bool,
    pub truncate: bool,
    pub sync: bool,
    pub dsync: bool,
}

impl OpenFlags {
    #[must_use]
    pub fn read_only() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn write_only() -> Self {
        Self {
            access: Access::WriteOnly,
            ..Self::default()
        }
    }

    /// Convert to the platform flag word for `open(2)`.
    #[cfg(unix)]
    #[must_use]
    pub fn to_raw(self) -> c_int {
        let mut raw = match self.access {
            Access::ReadOnly => libc::O_RDONLY,
            Access::WriteOnly => libc::O_WRONLY,
        };
        for (set, bit) in [
            (self.append, libc::O_APPEND),
            (self.create, libc::O_CREAT),
            (self.exclusive, libc::O_EXCL),
            (self.truncate, libc::O_TRUNC),
            (self.sync, libc::O_SYNC),
            (self.dsync, libc::O_DSYNC),
        ] {
            if set {
                raw |= bit;
            }
        }
        raw | libc::O_CLOEXEC
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn read_only_is_plain_rdonly() {
        assert_eq!(OpenFlags::read_only().to_raw(), libc::O_RDONLY | libc::O_CLOEXEC);
    }

    #[test]
    fn write_flags_are_combined() {
        let flags = OpenFlags {
            create: true,
            truncate: true,
            ..OpenFlags::write_only()
        };
        let raw = flags.to_raw();
        assert_eq!(raw & libc::O_ACCMODE, libc::O_WRONLY);
        assert_ne!(raw & libc::O_CREAT, 0);
        assert_ne!(raw & libc::O_TRUNC, 0);
        assert_eq!(raw & libc::O_APPEND, 0);
        assert_eq!(raw & libc::O_EXCL, 0);
    }
}
