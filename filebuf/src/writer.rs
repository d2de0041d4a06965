//! Write engine: coalesce small writes, stream large ones.
//!
//! Bytes are copied into the [`WriteBuffer`] while they fit with at least one
//! slot to spare. Otherwise the buffer is topped up, written out as one
//! full-capacity chunk, and the rest of the input follows in full-capacity
//! chunks; a tail shorter than the capacity stays pending.
//!
//! Bytes leave the buffer as soon as `write(2)` accepts them. On a failure
//! the part not yet accepted stays pending, so a later `flush` or `write`
//! retries only that. Input past the failing chunk is not buffered.

use std::os::raw::c_int;

use fs_runtime::FsRuntime;
use tracing::trace;

use crate::buffer::WriteBuffer;
use crate::error::Result;
use crate::sys;

pub(crate) fn write<R: FsRuntime>(
    buffer: &mut WriteBuffer,
    runtime: &R,
    fd: c_int,
    bytes: &[u8],
) -> Result<()> {
    if buffer.room() > bytes.len() {
        buffer.fill(bytes);
        trace!(fd, len = bytes.len(), pending = buffer.pending().len(), "write: buffered");
        return Ok(());
    }

    let mut input = bytes;
    while !input.is_empty() {
        let n = buffer.fill(input);
        input = &input[n..];
        drain(buffer, runtime, fd)?;
        trace!(fd, len = buffer.capacity(), "write: chunk out");

        if input.len() < buffer.capacity() {
            buffer.fill(input);
            trace!(fd, tail = input.len(), "write: tail buffered");
            input = &[];
        }
    }
    Ok(())
}

/// Write pending bytes until none are left, continuing short writes.
fn drain<R: FsRuntime>(buffer: &mut WriteBuffer, runtime: &R, fd: c_int) -> Result<()> {
    while !buffer.pending().is_empty() {
        let n = sys::write(runtime, fd, buffer.pending())?;
        buffer.consume_front(n);
    }
    Ok(())
}

/// Write out pending bytes. Nothing pending means no system call.
pub(crate) fn flush<R: FsRuntime>(buffer: &mut WriteBuffer, runtime: &R, fd: c_int) -> Result<()> {
    let len = buffer.pending().len();
    if len == 0 {
        return Ok(());
    }
    drain(buffer, runtime, fd)?;
    trace!(fd, len, "flush");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_runtime::{errno, OpenFlags, DEFAULT_PERM};
    use fs_runtime_mocked::{MockFs, Syscall};

    fn setup(capacity: usize) -> (MockFs, c_int, WriteBuffer) {
        let fs = MockFs::new();
        let fd = fs.open(
            c"out",
            OpenFlags {
                create: true,
                ..OpenFlags::write_only()
            },
            DEFAULT_PERM,
        );
        fs.reset_counts();
        (fs, fd, WriteBuffer::with_capacity(capacity).unwrap())
    }

    #[test]
    fn exact_fit_goes_out() {
        let (fs, fd, mut buf) = setup(4);
        write(&mut buf, &fs, fd, b"ab").unwrap();
        write(&mut buf, &fs, fd, b"cd").unwrap();
        assert_eq!(fs.counts().writes, 1);
        assert_eq!(fs.get_file("out").unwrap(), b"abcd");
        assert_eq!(buf.pending(), b"");
    }

    #[test]
    fn large_input_streams_in_capacity_chunks() {
        let (fs, fd, mut buf) = setup(4);
        write(&mut buf, &fs, fd, b"x").unwrap();
        write(&mut buf, &fs, fd, b"0123456789").unwrap();
        assert_eq!(fs.counts().writes, 2);
        assert_eq!(fs.get_file("out").unwrap(), b"x0123456");
        assert_eq!(buf.pending(), b"789");
    }

    #[test]
    fn failed_chunk_stays_pending() {
        let (fs, fd, mut buf) = setup(4);
        write(&mut buf, &fs, fd, b"ab").unwrap();
        fs.fail_next(Syscall::Write, errno::ENOSPC);
        let err = write(&mut buf, &fs, fd, b"cdef").unwrap_err();
        assert_eq!(err.errno(), Some(errno::ENOSPC));
        assert_eq!(buf.pending(), b"abcd");

        flush(&mut buf, &fs, fd).unwrap();
        assert_eq!(fs.get_file("out").unwrap(), b"abcd");
    }

    #[test]
    fn short_writes_are_continued() {
        let (fs, fd, mut buf) = setup(8);
        fs.set_max_transfer(Some(3));
        write(&mut buf, &fs, fd, b"01234567").unwrap();
        assert_eq!(fs.get_file("out").unwrap(), b"01234567");
        assert_eq!(fs.counts().writes, 3);
    }

    #[test]
    fn flush_retry_after_short_write_sends_only_the_rest() {
        let (fs, fd, mut buf) = setup(16);
        fs.set_max_transfer(Some(3));
        fs.fail_nth(Syscall::Write, 1, errno::ENOSPC);

        write(&mut buf, &fs, fd, b"abcdef").unwrap();
        let err = flush(&mut buf, &fs, fd).unwrap_err();
        assert_eq!(err.errno(), Some(errno::ENOSPC));
        assert_eq!(buf.pending(), b"def");

        flush(&mut buf, &fs, fd).unwrap();
        assert_eq!(fs.get_file("out").unwrap(), b"abcdef");
        assert_eq!(buf.pending(), b"");
    }

    #[test]
    fn chunk_retry_after_short_write_sends_only_the_rest() {
        let (fs, fd, mut buf) = setup(4);
        fs.set_max_transfer(Some(3));
        fs.fail_nth(Syscall::Write, 1, errno::EIO);

        write(&mut buf, &fs, fd, b"abcd").unwrap_err();
        assert_eq!(buf.pending(), b"d");
        flush(&mut buf, &fs, fd).unwrap();
        assert_eq!(fs.get_file("out").unwrap(), b"abcd");
    }

    #[test]
    fn flush_without_pending_is_free() {
        let (fs, fd, mut buf) = setup(4);
        flush(&mut buf, &fs, fd).unwrap();
        assert_eq!(fs.counts().writes, 0);
    }
}
