//! `embedded_io` adapters.
//!
//! `Read::read` returns what is buffered, refilling at most once; `Write::write`
//! buffers the whole slice. The inherent `read(n)` of [`Handle`] shadows the
//! trait method, so call the trait form explicitly:
//! `embedded_io::Read::read(&mut handle, &mut buf)`.

use fs_runtime::FsRuntime;

use crate::error::Error;
use crate::handle::Handle;
use crate::locked::LockedHandle;
use crate::reader;

impl<R: FsRuntime> embedded_io::ErrorType for Handle<R> {
    type Error = Error;
}

impl<R: FsRuntime> embedded_io::Read for Handle<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let (buffer, runtime, fd) = self.read_parts()?;
        reader::read_into(buffer, runtime, fd, buf)
    }
}

impl<R: FsRuntime> embedded_io::Write for Handle<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Handle::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Handle::flush(self)
    }
}

impl<R: FsRuntime> embedded_io::ErrorType for LockedHandle<R> {
    type Error = Error;
}

impl<R: FsRuntime> embedded_io::Read for LockedHandle<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.with(|handle| embedded_io::Read::read(handle, buf))
    }
}

impl<R: FsRuntime> embedded_io::Write for LockedHandle<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        LockedHandle::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        LockedHandle::flush(self)
    }
}
