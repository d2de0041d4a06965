//! Fixed-capacity buffers owned by a handle.
//!
//! A read buffer holds lookahead: `data[offset..filled]` are bytes returned by
//! the last `read(2)` and not consumed yet. A write buffer holds pending
//! output: `data[..offset]` has not reached the descriptor yet.
//!
//! Invariants: `offset <= filled <= capacity` (read), `offset <= capacity` (write).

use std::os::raw::c_int;

use fs_runtime::FsRuntime;

use crate::error::{Error, Result};
use crate::sys;

fn allocate(capacity: usize) -> Result<Vec<u8>> {
    if capacity == 0 {
        return Err(Error::InvalidArgument("buffer capacity must be positive"));
    }
    let mut data = Vec::new();
    data.try_reserve_exact(capacity)?;
    data.resize(capacity, 0);
    Ok(data)
}

#[derive(Debug)]
pub struct ReadBuffer {
    data: Vec<u8>,
    filled: usize,
    offset: usize,
}

impl ReadBuffer {
    /// # Errors
    /// `InvalidArgument` for a zero capacity, `OutOfMemory` if allocation fails.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            data: allocate(capacity)?,
            filled: 0,
            offset: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Buffered bytes not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.filled - self.offset
    }

    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.offset..self.filled]
    }

    /// Take up to `n` unread bytes.
    pub fn take(&mut self, n: usize) -> &[u8] {
        let n = n.min(self.remaining());
        let start = self.offset;
        self.offset += n;
        &self.data[start..start + n]
    }

    /// Mark `n` unread bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.offset += n.min(self.remaining());
    }

    /// Issue one `read(2)` of up to `capacity` bytes, replacing the content.
    /// Returns the count read; 0 is end of file.
    ///
    /// On error the buffer stays empty.
    ///
    /// # Errors
    /// The failed system call.
    pub fn refill<R: FsRuntime>(&mut self, runtime: &R, fd: c_int) -> Result<usize> {
        debug_assert_eq!(self.remaining(), 0, "refill would drop lookahead");
        self.offset = 0;
        self.filled = 0;
        let n = sys::read(runtime, fd, &mut self.data)?;
        self.filled = n.min(self.data.len());
        Ok(self.filled)
    }
}

#[derive(Debug)]
pub struct WriteBuffer {
    data: Vec<u8>,
    offset: usize,
}

impl WriteBuffer {
    /// # Errors
    /// `InvalidArgument` for a zero capacity, `OutOfMemory` if allocation fails.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            data: allocate(capacity)?,
            offset: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Free slots.
    #[must_use]
    pub fn room(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Bytes waiting for a flush.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.data[..self.offset]
    }

    /// Copy as much of `bytes` as fits; returns the count copied.
    pub fn fill(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.room());
        self.data[self.offset..self.offset + n].copy_from_slice(&bytes[..n]);
        self.offset += n;
        n
    }

    /// Drop the first `n` pending bytes, which reached the descriptor.
    pub fn consume_front(&mut self, n: usize) {
        let n = n.min(self.offset);
        self.data.copy_within(n..self.offset, 0);
        self.offset -= n;
    }

    /// Forget pending bytes after they reached the descriptor.
    pub fn clear(&mut self) {
        self.offset = 0;
    }
}
