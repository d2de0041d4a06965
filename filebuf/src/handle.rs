//! Buffered file handle.
//!
//! A [`Handle`] owns one descriptor and one buffer. Its mode is fixed at open
//! time: a read handle has a lookahead buffer, a write handle a pending-output
//! buffer. Usage errors (`WrongMode`, `AlreadyClosed`) are reported before any
//! system call is issued.
//!
//! # Example
//! ```no_run
//! use filebuf::{Handle, OpenOptions};
//! use fs_runtime::PosixRuntime;
//!
//! let options = OpenOptions::write().create(true).truncate(true);
//! let mut out = Handle::open(PosixRuntime::new(), "out.txt", 4096, &options).unwrap();
//! out.write(b"Hello, world!\n").unwrap();
//! out.close().unwrap();
//! ```

use std::fmt;
use std::os::raw::c_int;

use fs_runtime::{FsRuntime, StdHandle, DEFAULT_PERM};
use tracing::{debug, warn};

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::{Error, Result};
use crate::locked::LockedHandle;
use crate::options::{Mode, OpenOptions};
use crate::{reader, sys, writer};

enum Buffer {
    Read(ReadBuffer),
    Write(WriteBuffer),
}

impl Buffer {
    fn new(mode: Mode, capacity: usize) -> Result<Self> {
        Ok(match mode {
            Mode::Read => Buffer::Read(ReadBuffer::with_capacity(capacity)?),
            Mode::Write => Buffer::Write(WriteBuffer::with_capacity(capacity)?),
        })
    }
}

pub struct Handle<R: FsRuntime> {
    runtime: R,
    fd: c_int,
    buffer: Buffer,
    closed: bool,
}

impl<R: FsRuntime> Handle<R> {
    /// Open `path` with a buffer of `capacity` bytes.
    ///
    /// The buffer is allocated before the file is opened, so a failed
    /// allocation leaves nothing to clean up. `options.lock` is not looked at
    /// here; see [`LockedHandle::open`] and [`crate::open`].
    ///
    /// # Errors
    /// - `InvalidArgument` for a zero capacity or a path containing NUL
    /// - `OutOfMemory` if the buffer cannot be allocated
    /// - `Os` if `open(2)` fails
    pub fn open(runtime: R, path: &str, capacity: usize, options: &OpenOptions) -> Result<Self> {
        let buffer = Buffer::new(options.mode, capacity)?;
        let fd = sys::open(&runtime, path, options.flags, DEFAULT_PERM)?;
        debug!(path, fd, capacity, mode = ?options.mode, "opened");
        Ok(Self {
            runtime,
            fd,
            buffer,
            closed: false,
        })
    }

    /// Adopt an already open descriptor. The handle closes it at teardown.
    ///
    /// # Errors
    /// `InvalidArgument` for a negative descriptor or a zero capacity,
    /// `OutOfMemory` if the buffer cannot be allocated.
    pub fn from_raw_fd(runtime: R, fd: c_int, mode: Mode, capacity: usize) -> Result<Self> {
        if fd < 0 {
            return Err(Error::InvalidArgument("negative file descriptor"));
        }
        let buffer = Buffer::new(mode, capacity)?;
        debug!(fd, capacity, ?mode, "adopted descriptor");
        Ok(Self {
            runtime,
            fd,
            buffer,
            closed: false,
        })
    }

    /// Wrap a standard stream.
    ///
    /// # Errors
    /// As [`Handle::from_raw_fd`].
    pub fn from_std(runtime: R, handle: StdHandle, capacity: usize) -> Result<Self> {
        let mode = match handle {
            StdHandle::Stdin => Mode::Read,
            StdHandle::Stdout | StdHandle::Stderr => Mode::Write,
        };
        Self::from_raw_fd(runtime, handle as c_int, mode, capacity)
    }

    pub(crate) fn read_parts(&mut self) -> Result<(&mut ReadBuffer, &R, c_int)> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        match &mut self.buffer {
            Buffer::Read(buffer) => Ok((buffer, &self.runtime, self.fd)),
            Buffer::Write(_) => Err(Error::WrongMode),
        }
    }

    fn write_parts(&mut self) -> Result<(&mut WriteBuffer, &R, c_int)> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        match &mut self.buffer {
            Buffer::Write(buffer) => Ok((buffer, &self.runtime, self.fd)),
            Buffer::Read(_) => Err(Error::WrongMode),
        }
    }

    /// Read exactly `n` bytes, fewer at end of file, `None` at end of file
    /// when nothing is left. A zero-length read returns an empty chunk
    /// without touching the file.
    ///
    /// # Errors
    /// `AlreadyClosed`, `WrongMode`, `OutOfMemory` or the failed `read(2)`.
    pub fn read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        let (buffer, runtime, fd) = self.read_parts()?;
        reader::read(buffer, runtime, fd, n)
    }

    /// Read the next line without its newline, `None` at end of file.
    ///
    /// # Errors
    /// `AlreadyClosed`, `WrongMode`, `OutOfMemory` or the failed `read(2)`.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let (buffer, runtime, fd) = self.read_parts()?;
        reader::read_line(buffer, runtime, fd)
    }

    /// Buffer `bytes`, writing out full-capacity chunks as needed.
    ///
    /// # Errors
    /// `AlreadyClosed`, `WrongMode` or the failed `write(2)`.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let (buffer, runtime, fd) = self.write_parts()?;
        writer::write(buffer, runtime, fd, bytes)
    }

    /// Write out pending bytes.
    ///
    /// # Errors
    /// `AlreadyClosed`, `WrongMode` or the failed `write(2)`.
    pub fn flush(&mut self) -> Result<()> {
        let (buffer, runtime, fd) = self.write_parts()?;
        writer::flush(buffer, runtime, fd)
    }

    /// Flush pending output and mark the handle closed. The descriptor itself
    /// is released at teardown. Closing twice is a no-op.
    ///
    /// A failed flush is returned, but the handle is closed anyway and the
    /// unwritten bytes are discarded.
    ///
    /// # Errors
    /// The failed `write(2)` of the final flush.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = match &mut self.buffer {
            Buffer::Write(buffer) => writer::flush(buffer, &self.runtime, self.fd),
            Buffer::Read(_) => Ok(()),
        };
        match &result {
            Ok(()) => debug!(fd = self.fd, "closed"),
            Err(err) => debug!(fd = self.fd, %err, "closed, final flush failed"),
        }
        result
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        match self.buffer {
            Buffer::Read(_) => Mode::Read,
            Buffer::Write(_) => Mode::Write,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.buffer {
            Buffer::Read(buffer) => buffer.capacity(),
            Buffer::Write(buffer) => buffer.capacity(),
        }
    }

    /// Lookahead bytes of a read handle, unflushed bytes of a write handle.
    #[must_use]
    pub fn pending(&self) -> usize {
        match &self.buffer {
            Buffer::Read(buffer) => buffer.remaining(),
            Buffer::Write(buffer) => buffer.pending().len(),
        }
    }

    #[must_use]
    pub fn as_raw_fd(&self) -> c_int {
        self.fd
    }

    #[must_use]
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Put the handle behind a lock so it can be shared between threads.
    #[must_use]
    pub fn into_locked(self) -> LockedHandle<R> {
        LockedHandle::from(self)
    }
}

impl<R: FsRuntime> Drop for Handle<R> {
    fn drop(&mut self) {
        if !self.closed {
            if let Buffer::Write(buffer) = &mut self.buffer {
                if let Err(err) = writer::flush(buffer, &self.runtime, self.fd) {
                    warn!(fd = self.fd, %err, "teardown: pending output lost");
                }
            }
        }
        if let Err(err) = sys::close(&self.runtime, self.fd) {
            warn!(fd = self.fd, %err, "teardown: close failed");
        }
        debug!(fd = self.fd, "released");
    }
}

impl<R: FsRuntime> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("fd", &self.fd)
            .field("mode", &self.mode())
            .field("capacity", &self.capacity())
            .field("pending", &self.pending())
            .field("closed", &self.closed)
            .finish()
    }
}
