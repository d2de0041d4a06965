//! File-system primitives for the `filebuf` engine.
//!
//! The engine never talks to the OS directly: it goes through [`FsRuntime`],
//! which has a libc implementation ([`PosixRuntime`]) and an in-memory one
//! in the `fs_runtime_mocked` crate.

pub mod errno;
mod flags;
#[cfg(unix)]
mod posix;
mod runtime_trait;

pub use flags::{Access, OpenFlags, DEFAULT_PERM};
#[cfg(unix)]
pub use posix::PosixRuntime;
pub use runtime_trait::FsRuntime;

/// Standard descriptors that can be adopted by a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdHandle {
    Stdin = 0,
    Stdout = 1,
    Stderr = 2,
}
