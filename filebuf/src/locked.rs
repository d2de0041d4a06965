//! Handle shared between threads.
//!
//! Every operation holds the mutex for its whole duration, so the system
//! calls of a `write` and a `flush` issued from different threads never
//! interleave. The guard is released on every return path, errors included.

use std::os::raw::c_int;

use fs_runtime::FsRuntime;
use parking_lot::Mutex;

use crate::error::Result;
use crate::handle::Handle;
use crate::options::{Mode, OpenOption, OpenOptions};

/// A [`Handle`] behind a `parking_lot::Mutex`. All methods take `&self`.
///
/// `Send + Sync` when the runtime is `Send`.
pub struct LockedHandle<R: FsRuntime> {
    inner: Mutex<Handle<R>>,
}

impl<R: FsRuntime> LockedHandle<R> {
    /// Open `path` as [`Handle::open`] does, locked regardless of `options.lock`.
    ///
    /// # Errors
    /// As [`Handle::open`].
    pub fn open(runtime: R, path: &str, capacity: usize, options: &OpenOptions) -> Result<Self> {
        Handle::open(runtime, path, capacity, options).map(Self::from)
    }

    /// # Errors
    /// As [`Handle::read`].
    pub fn read(&self, n: usize) -> Result<Option<Vec<u8>>> {
        self.inner.lock().read(n)
    }

    /// # Errors
    /// As [`Handle::read_line`].
    pub fn read_line(&self) -> Result<Option<Vec<u8>>> {
        self.inner.lock().read_line()
    }

    /// # Errors
    /// As [`Handle::write`].
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.inner.lock().write(bytes)
    }

    /// # Errors
    /// As [`Handle::flush`].
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    /// # Errors
    /// As [`Handle::close`].
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.inner.lock().mode()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.lock().pending()
    }

    #[must_use]
    pub fn as_raw_fd(&self) -> c_int {
        self.inner.lock().as_raw_fd()
    }

    /// Run `f` with the lock held, e.g. to write a record in several pieces
    /// without other writers cutting in.
    pub fn with<T>(&self, f: impl FnOnce(&mut Handle<R>) -> T) -> T {
        f(&mut *self.inner.lock())
    }

    #[must_use]
    pub fn into_inner(self) -> Handle<R> {
        self.inner.into_inner()
    }
}

impl<R: FsRuntime> From<Handle<R>> for LockedHandle<R> {
    fn from(handle: Handle<R>) -> Self {
        Self {
            inner: Mutex::new(handle),
        }
    }
}

impl<R: FsRuntime> std::fmt::Debug for LockedHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedHandle")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

/// Handle returned by [`open`]: locked if the option list asked for it.
pub enum AnyHandle<R: FsRuntime> {
    Unlocked(Handle<R>),
    Locked(LockedHandle<R>),
}

impl<R: FsRuntime> std::fmt::Debug for AnyHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyHandle::Unlocked(h) => f.debug_tuple("Unlocked").field(h).finish(),
            AnyHandle::Locked(h) => f.debug_tuple("Locked").field(h).finish(),
        }
    }
}

/// Open a handle from an option list.
///
/// # Errors
/// - `InvalidArgument` for a bad option list, a zero capacity or a path with NUL
/// - `OutOfMemory` if the buffer cannot be allocated
/// - `Os` if `open(2)` fails
pub fn open<R: FsRuntime>(
    runtime: R,
    path: &str,
    capacity: usize,
    options: &[OpenOption],
) -> Result<AnyHandle<R>> {
    let options = OpenOptions::from_list(options)?;
    if options.lock {
        LockedHandle::open(runtime, path, capacity, &options).map(AnyHandle::Locked)
    } else {
        Handle::open(runtime, path, capacity, &options).map(AnyHandle::Unlocked)
    }
}

impl<R: FsRuntime> AnyHandle<R> {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, AnyHandle::Locked(_))
    }

    /// # Errors
    /// As [`Handle::read`].
    pub fn read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        match self {
            AnyHandle::Unlocked(h) => h.read(n),
            AnyHandle::Locked(h) => h.read(n),
        }
    }

    /// # Errors
    /// As [`Handle::read_line`].
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            AnyHandle::Unlocked(h) => h.read_line(),
            AnyHandle::Locked(h) => h.read_line(),
        }
    }

    /// # Errors
    /// As [`Handle::write`].
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            AnyHandle::Unlocked(h) => h.write(bytes),
            AnyHandle::Locked(h) => h.write(bytes),
        }
    }

    /// # Errors
    /// As [`Handle::flush`].
    pub fn flush(&mut self) -> Result<()> {
        match self {
            AnyHandle::Unlocked(h) => h.flush(),
            AnyHandle::Locked(h) => h.flush(),
        }
    }

    /// # Errors
    /// As [`Handle::close`].
    pub fn close(&mut self) -> Result<()> {
        match self {
            AnyHandle::Unlocked(h) => h.close(),
            AnyHandle::Locked(h) => h.close(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            AnyHandle::Unlocked(h) => h.mode(),
            AnyHandle::Locked(h) => h.mode(),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            AnyHandle::Unlocked(h) => h.is_closed(),
            AnyHandle::Locked(h) => h.is_closed(),
        }
    }
}
