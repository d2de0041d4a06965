//! Buffered file I/O over an [`FsRuntime`](fs_runtime::FsRuntime).
//!
//! - [`Handle`]: one descriptor, one buffer, read or write mode.
//! - [`LockedHandle`]: the same behind a mutex, shareable between threads.
//! - [`open`]: decode an [`OpenOption`] list and pick one of the two.

mod buffer;
mod embedded;
mod error;
mod handle;
mod locked;
mod options;
mod reader;
mod sys;
mod writer;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use error::{errno_to_error_kind, error_kind_to_str, symbols, Error, ErrorCode, Result};
pub use handle::Handle;
pub use locked::{open, AnyHandle, LockedHandle};
pub use options::{Mode, OpenOption, OpenOptions, OPTION_NAMES};
