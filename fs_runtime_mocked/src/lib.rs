pub mod vfs;

pub use vfs::{MockFs, Syscall, SyscallCounts, WANT_ERROR};
