//! Read engine: fixed-length and line reads over a [`ReadBuffer`].
//!
//! Both reads first serve from the lookahead left by earlier calls and only
//! then issue `read(2)`, one buffer-capacity at a time. Whatever a refill
//! returns beyond the current request stays in the buffer for the next call,
//! so fixed-length reads and line reads can be mixed on one handle.
//!
//! `Ok(None)` is end of file with nothing to return; `Ok(Some(vec![]))` is an
//! empty chunk or an empty line.

use std::os::raw::c_int;

use fs_runtime::FsRuntime;
use tracing::trace;

use crate::buffer::ReadBuffer;
use crate::error::Result;

const NEWLINE: u8 = b'\n';

fn find_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == NEWLINE)
}

/// Move up to `want` buffered bytes to the end of `out`.
fn take_into(buffer: &mut ReadBuffer, out: &mut Vec<u8>, want: usize) -> Result<()> {
    let n = want.min(buffer.remaining());
    out.try_reserve(n)?;
    out.extend_from_slice(buffer.take(n));
    Ok(())
}

/// Read `requested` bytes, or fewer at end of file.
pub(crate) fn read<R: FsRuntime>(
    buffer: &mut ReadBuffer,
    runtime: &R,
    fd: c_int,
    requested: usize,
) -> Result<Option<Vec<u8>>> {
    if requested == 0 {
        return Ok(Some(Vec::new()));
    }

    let mut out = Vec::new();
    out.try_reserve_exact(requested.min(buffer.remaining() + buffer.capacity()))?;

    if buffer.remaining() > 0 {
        take_into(buffer, &mut out, requested)?;
        if out.len() == requested {
            trace!(fd, requested, "read: served from buffer");
            return Ok(Some(out));
        }
        trace!(fd, have = out.len(), requested, "read: buffer drained");
    }

    loop {
        let n = buffer.refill(runtime, fd)?;
        if n == 0 {
            if out.is_empty() {
                trace!(fd, "read: eof");
                return Ok(None);
            }
            trace!(fd, have = out.len(), requested, "read: short chunk at eof");
            return Ok(Some(out));
        }

        let want = requested - out.len();
        take_into(buffer, &mut out, want)?;
        if out.len() == requested {
            trace!(fd, requested, left = buffer.remaining(), "read: satisfied after refill");
            return Ok(Some(out));
        }
    }
}

/// Read one line without its trailing newline. The last line of a file may
/// lack the newline.
pub(crate) fn read_line<R: FsRuntime>(
    buffer: &mut ReadBuffer,
    runtime: &R,
    fd: c_int,
) -> Result<Option<Vec<u8>>> {
    // Accumulates a line that spans refills; handed to the caller as is.
    let mut fragment = Vec::new();

    if buffer.remaining() > 0 {
        let unread = buffer.unread();
        if let Some(pos) = find_newline(unread) {
            let mut line = Vec::new();
            line.try_reserve_exact(pos)?;
            line.extend_from_slice(&unread[..pos]);
            buffer.consume(pos + 1);
            trace!(fd, len = pos, "read_line: served from buffer");
            return Ok(Some(line));
        }
        let n = unread.len();
        fragment.try_reserve_exact(n)?;
        fragment.extend_from_slice(unread);
        buffer.consume(n);
        trace!(fd, carried = n, "read_line: no newline in buffer");
    }

    loop {
        let n = buffer.refill(runtime, fd)?;
        if n == 0 {
            if fragment.is_empty() {
                trace!(fd, "read_line: eof");
                return Ok(None);
            }
            trace!(fd, len = fragment.len(), "read_line: unterminated last line");
            return Ok(Some(fragment));
        }

        let unread = buffer.unread();
        if let Some(pos) = find_newline(unread) {
            fragment.try_reserve_exact(pos)?;
            fragment.extend_from_slice(&unread[..pos]);
            buffer.consume(pos + 1);
            trace!(fd, len = fragment.len(), left = buffer.remaining(), "read_line: newline after refill");
            return Ok(Some(fragment));
        }

        fragment.try_reserve(n)?;
        fragment.extend_from_slice(unread);
        buffer.consume(n);
    }
}

/// Copy buffered bytes into `dst`, refilling once if the buffer is empty.
/// Returns 0 only at end of file or for an empty `dst`.
pub(crate) fn read_into<R: FsRuntime>(
    buffer: &mut ReadBuffer,
    runtime: &R,
    fd: c_int,
    dst: &mut [u8],
) -> Result<usize> {
    if dst.is_empty() {
        return Ok(0);
    }
    if buffer.remaining() == 0 && buffer.refill(runtime, fd)? == 0 {
        return Ok(0);
    }
    let chunk = buffer.take(dst.len());
    dst[..chunk.len()].copy_from_slice(chunk);
    Ok(chunk.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_runtime::{OpenFlags, DEFAULT_PERM};
    use fs_runtime_mocked::MockFs;

    fn setup(content: &[u8], capacity: usize) -> (MockFs, c_int, ReadBuffer) {
        let fs = MockFs::new();
        fs.add_file("f", content.to_vec());
        let fd = fs.open(c"f", OpenFlags::read_only(), DEFAULT_PERM);
        fs.reset_counts();
        (fs, fd, ReadBuffer::with_capacity(capacity).unwrap())
    }

    #[test]
    fn find_newline_positions() {
        assert_eq!(find_newline(b"abc\n"), Some(3));
        assert_eq!(find_newline(b"\n"), Some(0));
        assert_eq!(find_newline(b"abc"), None);
        assert_eq!(find_newline(b""), None);
    }

    #[test]
    fn zero_length_read_touches_nothing() {
        let (fs, fd, mut buf) = setup(b"abc", 4);
        assert_eq!(read(&mut buf, &fs, fd, 0).unwrap(), Some(Vec::new()));
        assert_eq!(fs.counts().reads, 0);
    }

    #[test]
    fn read_larger_than_capacity() {
        let (fs, fd, mut buf) = setup(b"0123456789", 3);
        assert_eq!(read(&mut buf, &fs, fd, 8).unwrap().unwrap(), b"01234567");
        assert_eq!(fs.counts().reads, 3);
        assert_eq!(buf.unread(), b"8");
    }

    #[test]
    fn empty_line_is_not_eof() {
        let (fs, fd, mut buf) = setup(b"a\n\nb", 16);
        assert_eq!(read_line(&mut buf, &fs, fd).unwrap().unwrap(), b"a");
        assert_eq!(read_line(&mut buf, &fs, fd).unwrap().unwrap(), b"");
        assert_eq!(read_line(&mut buf, &fs, fd).unwrap().unwrap(), b"b");
        assert_eq!(read_line(&mut buf, &fs, fd).unwrap(), None);
    }

    #[test]
    fn read_into_uses_lookahead_first() {
        let (fs, fd, mut buf) = setup(b"abcdef", 4);
        let mut dst = [0u8; 3];
        assert_eq!(read_into(&mut buf, &fs, fd, &mut dst).unwrap(), 3);
        assert_eq!(&dst, b"abc");
        assert_eq!(read_into(&mut buf, &fs, fd, &mut dst).unwrap(), 1);
        assert_eq!(&dst[..1], b"d");
        assert_eq!(read_into(&mut buf, &fs, fd, &mut dst).unwrap(), 2);
        assert_eq!(read_into(&mut buf, &fs, fd, &mut dst).unwrap(), 0);
        assert_eq!(fs.counts().reads, 3);
    }
}
