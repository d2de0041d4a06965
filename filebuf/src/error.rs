//! Error type of the engine and mapping utilities.
//!
//! Three families of failures exist:
//! - usage errors (`WrongMode`, `AlreadyClosed`, `InvalidArgument`), detected before
//!   any system call is issued;
//! - `OutOfMemory`, when a buffer cannot be allocated or grown;
//! - `Os`, a failed system call with its errno and OS message.
//!
//! None of them is retried by the engine.

use core::ffi::c_int;
use std::fmt;

/// Symbolic codes reported at the boundary for non-syscall failures.
pub mod symbols {
    pub const OUT_OF_MEMORY: &str = "enomem";
    pub const INVALID_ARGUMENT: &str = "badarg";
    pub const WRONG_MODE: &str = "wrong_mode";
    pub const ALREADY_CLOSED: &str = "closed";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A system call failed.
    Os { errno: c_int, message: String },
    /// Buffer allocation failed.
    OutOfMemory,
    /// Malformed argument: capacity, option list, path.
    InvalidArgument(&'static str),
    /// Read on a write handle or write/flush on a read handle.
    WrongMode,
    /// Operation on a closed handle.
    AlreadyClosed,
}

/// Boundary form of an [`Error`]: an `(errno, message)` pair or a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Os(c_int, String),
    Symbol(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Build an `Os` error, taking the message from the OS.
    #[must_use]
    pub fn from_errno(errno: c_int) -> Self {
        let message = std::io::Error::from_raw_os_error(errno).to_string();
        Error::Os { errno, message }
    }

    #[must_use]
    pub fn errno(&self) -> Option<c_int> {
        match self {
            Error::Os { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// True for failures detected before any system call.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::WrongMode | Error::AlreadyClosed
        )
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Os { errno, message } => ErrorCode::Os(*errno, message.clone()),
            Error::OutOfMemory => ErrorCode::Symbol(symbols::OUT_OF_MEMORY),
            Error::InvalidArgument(_) => ErrorCode::Symbol(symbols::INVALID_ARGUMENT),
            Error::WrongMode => ErrorCode::Symbol(symbols::WRONG_MODE),
            Error::AlreadyClosed => ErrorCode::Symbol(symbols::ALREADY_CLOSED),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Os { message, .. } => f.write_str(message),
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Error::WrongMode => write!(f, "operation not permitted in this file mode"),
            Error::AlreadyClosed => write!(f, "handle is already closed"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::Os { errno, .. } => errno_to_error_kind(*errno),
            Error::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            Error::InvalidArgument(_) => embedded_io::ErrorKind::InvalidInput,
            Error::WrongMode | Error::AlreadyClosed => embedded_io::ErrorKind::Unsupported,
        }
    }
}

/// Convert errno to `embedded_io::ErrorKind`
#[must_use]
#[allow(clippy::match_same_arms)] // We explicitly list common errno values for documentation
pub fn errno_to_error_kind(errno: c_int) -> embedded_io::ErrorKind {
    match errno {
        1 | 13 => embedded_io::ErrorKind::PermissionDenied, // EPERM, EACCES
        2 => embedded_io::ErrorKind::NotFound,              // ENOENT
        4 => embedded_io::ErrorKind::Interrupted,           // EINTR
        9 | 22 => embedded_io::ErrorKind::InvalidInput,     // EBADF, EINVAL
        12 | 28 => embedded_io::ErrorKind::OutOfMemory,     // ENOMEM, ENOSPC (no space left)
        17 => embedded_io::ErrorKind::AlreadyExists,        // EEXIST
        24 => embedded_io::ErrorKind::Unsupported,          // EMFILE (too many open files)
        32 => embedded_io::ErrorKind::BrokenPipe,           // EPIPE
        5 | 11 => embedded_io::ErrorKind::Other,            // EIO, EAGAIN/EWOULDBLOCK
        _ => embedded_io::ErrorKind::Other,
    }
}

/// Convert error kind to a static string description
#[must_use]
pub fn error_kind_to_str(kind: embedded_io::ErrorKind) -> &'static str {
    match kind {
        embedded_io::ErrorKind::NotFound => "not found",
        embedded_io::ErrorKind::PermissionDenied => "permission denied",
        embedded_io::ErrorKind::BrokenPipe => "broken pipe",
        embedded_io::ErrorKind::AlreadyExists => "already exists",
        embedded_io::ErrorKind::InvalidInput => "invalid input",
        embedded_io::ErrorKind::InvalidData => "invalid data",
        embedded_io::ErrorKind::Interrupted => "interrupted",
        embedded_io::ErrorKind::Unsupported => "unsupported",
        embedded_io::ErrorKind::OutOfMemory => "out of memory",
        embedded_io::ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn os_error_carries_errno_and_message() {
        let err = Error::from_errno(2);
        assert_eq!(err.errno(), Some(2));
        match err.code() {
            ErrorCode::Os(errno, message) => {
                assert_eq!(errno, 2);
                assert!(!message.is_empty());
            }
            ErrorCode::Symbol(s) => panic!("unexpected symbol {s}"),
        }
        assert!(err.to_string().contains("os error 2"));
        assert!(!err.is_usage());
    }

    #[test]
    fn symbolic_codes() {
        assert_eq!(Error::OutOfMemory.code(), ErrorCode::Symbol("enomem"));
        assert_eq!(
            Error::InvalidArgument("capacity").code(),
            ErrorCode::Symbol("badarg")
        );
        assert_eq!(Error::WrongMode.code(), ErrorCode::Symbol("wrong_mode"));
        assert_eq!(Error::AlreadyClosed.code(), ErrorCode::Symbol("closed"));
        assert!(Error::AlreadyClosed.is_usage());
        assert!(!Error::OutOfMemory.is_usage());
    }

    #[test]
    fn kinds() {
        assert_eq!(Error::from_errno(2).kind(), embedded_io::ErrorKind::NotFound);
        assert_eq!(Error::from_errno(28).kind(), embedded_io::ErrorKind::OutOfMemory);
        assert_eq!(Error::WrongMode.kind(), embedded_io::ErrorKind::Unsupported);
        assert_eq!(error_kind_to_str(embedded_io::ErrorKind::NotFound), "not found");
    }
}
