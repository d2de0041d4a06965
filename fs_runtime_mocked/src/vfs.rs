/// Mocked file-system runtime backed by in-memory files.
///
/// - `add_file` adds a file to the virtual file system.
/// - `get_file` gets the content of a file from the virtual file system.
/// - `WANT_ERROR` is a character that can be used to simulate an error.
/// - `counts` reports how many primitives of each kind were issued.
///
/// `open(name, flags)`:
/// - returns an error if `name` contains `WANT_ERROR`.
/// - honors create, exclusive, truncate and append.
///
/// `read`, `write`:
/// - `read` stops before a `WANT_ERROR` byte and fails if it is the first one.
/// - `write` fails if the data contains `WANT_ERROR`.
/// - both are capped by `set_max_transfer`, if set.
///
/// `get_errno` is per thread, as `errno` is.
use fs_runtime::{errno, Access, FsRuntime, OpenFlags};
use std::ffi::CStr;
use std::os::raw::c_int;
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const WANT_ERROR: char = '\u{0001}';

thread_local! {
    static IO_ERRNO: Cell<c_int> = const { Cell::new(0) };
}

/// Kind of primitive, for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Open,
    Read,
    Write,
    Close,
}

/// Number of primitives issued since creation or the last `reset_counts`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyscallCounts {
    pub opens: usize,
    pub reads: usize,
    pub writes: usize,
    pub closes: usize,
}

struct VfsFile {
    name: String,
    buffer: Vec<u8>,
}

struct FileHandle {
    vfs_index: usize,
    pos: usize,
    access: Access,
    append: bool,
    open: bool,
}

#[derive(Default)]
struct State {
    files: Vec<VfsFile>,
    handles: Vec<FileHandle>,
    /// `(call, calls to let through first, errno)`
    pending_failures: Vec<(Syscall, usize, c_int)>,
    max_transfer: Option<usize>,
}

impl State {
    fn take_failure(&mut self, call: Syscall) -> Option<c_int> {
        let pos = self.pending_failures.iter().position(|(c, ..)| *c == call)?;
        let entry = &mut self.pending_failures[pos];
        if entry.1 > 0 {
            entry.1 -= 1;
            return None;
        }
        Some(self.pending_failures.remove(pos).2)
    }

    fn cap(&self, count: usize) -> usize {
        self.max_transfer.map_or(count, |max| count.min(max))
    }
}

pub struct MockFs {
    state: Mutex<State>,
    opens: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    closes: AtomicUsize,
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            opens: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn add_file(&self, name: &str, buffer: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        if let Some(file) = state.files.iter_mut().find(|f| f.name == name) {
            file.buffer = buffer;
        } else {
            state.files.push(VfsFile {
                name: name.to_string(),
                buffer,
            });
        }
    }

    /// Content of a file.
    /// # Errors
    /// - File not found
    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn get_file(&self, name: &str) -> Result<Vec<u8>, String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.buffer.clone())
            .ok_or_else(|| format!("File not found: {name}"))
    }

    /// Make the next call of the given kind fail with `errno`.
    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn fail_next(&self, call: Syscall, errno: c_int) {
        self.fail_nth(call, 0, errno);
    }

    /// Let `skip` calls of the given kind succeed, then fail one with `errno`.
    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn fail_nth(&self, call: Syscall, skip: usize, errno: c_int) {
        self.state
            .lock()
            .unwrap()
            .pending_failures
            .push((call, skip, errno));
    }

    /// Limit the number of bytes a single read or write transfers.
    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn set_max_transfer(&self, max: Option<usize>) {
        self.state.lock().unwrap().max_transfer = max;
    }

    #[must_use]
    pub fn counts(&self) -> SyscallCounts {
        SyscallCounts {
            opens: self.opens.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
        }
    }

    pub fn reset_counts(&self) {
        for counter in [&self.opens, &self.reads, &self.writes, &self.closes] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Number of descriptors opened and not yet closed.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    #[allow(clippy::unwrap_used)]
    pub fn open_descriptors(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.handles.iter().filter(|h| h.open).count()
    }

    fn fail(&self, errno: c_int) -> c_int {
        IO_ERRNO.with(|cell| cell.set(errno));
        -1
    }

    fn handle_index(state: &State, fd: c_int) -> Option<usize> {
        let index = usize::try_from(fd).ok()?;
        state.handles.get(index).filter(|h| h.open).map(|_| index)
    }
}

impl FsRuntime for MockFs {
    fn get_errno(&self) -> c_int {
        IO_ERRNO.with(Cell::get)
    }

    #[allow(clippy::unwrap_used)]
    fn open(&self, path: &CStr, flags: OpenFlags, _perm: u32) -> c_int {
        self.opens.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap();
        if let Some(errno) = state.take_failure(Syscall::Open) {
            return self.fail(errno);
        }

        let name = path.to_string_lossy().to_string();
        if name.contains(WANT_ERROR) {
            return self.fail(errno::EINVAL);
        }

        let vfs_index = match state.files.iter().position(|f| f.name == name) {
            Some(_) if flags.create && flags.exclusive => return self.fail(errno::EEXIST),
            Some(index) => {
                if flags.truncate && flags.access == Access::WriteOnly {
                    state.files[index].buffer.clear();
                }
                index
            }
            None if flags.create => {
                state.files.push(VfsFile {
                    name,
                    buffer: Vec::new(),
                });
                state.files.len() - 1
            }
            None => return self.fail(errno::ENOENT),
        };

        state.handles.push(FileHandle {
            vfs_index,
            pos: 0,
            access: flags.access,
            append: flags.append,
            open: true,
        });
        c_int::try_from(state.handles.len() - 1).unwrap_or_else(|_| self.fail(errno::EINVAL))
    }

    #[allow(clippy::unwrap_used)]
    fn read(&self, fd: c_int, buffer: &mut [u8]) -> isize {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap();
        if let Some(errno) = state.take_failure(Syscall::Read) {
            return self.fail(errno) as isize;
        }
        let Some(index) = Self::handle_index(&state, fd) else {
            return self.fail(errno::EBADF) as isize;
        };
        if state.handles[index].access != Access::ReadOnly {
            return self.fail(errno::EBADF) as isize;
        }

        let to_copy = state.cap(buffer.len());
        let State { files, handles, .. } = &mut *state;
        let handle = &mut handles[index];
        let file = &files[handle.vfs_index];
        let available = file.buffer.get(handle.pos..).unwrap_or_default();
        let mut chunk = &available[..to_copy.min(available.len())];
        if let Some(bad) = chunk.iter().position(|&b| b == WANT_ERROR as u8) {
            if bad == 0 {
                return self.fail(errno::EIO) as isize;
            }
            chunk = &chunk[..bad];
        }

        buffer[..chunk.len()].copy_from_slice(chunk);
        handle.pos += chunk.len();
        chunk.len().try_into().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn write(&self, fd: c_int, buffer: &[u8]) -> isize {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap();
        if let Some(errno) = state.take_failure(Syscall::Write) {
            return self.fail(errno) as isize;
        }
        let Some(index) = Self::handle_index(&state, fd) else {
            return self.fail(errno::EBADF) as isize;
        };
        if state.handles[index].access != Access::WriteOnly {
            return self.fail(errno::EBADF) as isize;
        }
        if buffer.contains(&(WANT_ERROR as u8)) {
            return self.fail(errno::EIO) as isize;
        }

        let count = state.cap(buffer.len());
        let State { files, handles, .. } = &mut *state;
        let handle = &mut handles[index];
        let file = &mut files[handle.vfs_index];
        if handle.append {
            handle.pos = file.buffer.len();
        }
        let end = handle.pos + count;
        if file.buffer.len() < end {
            file.buffer.resize(end, 0);
        }
        file.buffer[handle.pos..end].copy_from_slice(&buffer[..count]);
        handle.pos = end;
        count.try_into().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn close(&self, fd: c_int) -> c_int {
        self.closes.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap();
        let Some(index) = Self::handle_index(&state, fd) else {
            return self.fail(errno::EBADF);
        };
        // The descriptor is released even when the close reports an error.
        state.handles[index].open = false;
        if let Some(errno) = state.take_failure(Syscall::Close) {
            return self.fail(errno);
        }
        0
    }
}
