use std::sync::Arc;

use filebuf::{Handle, LockedHandle, OpenOptions};
use fs_runtime::FsRuntime;
use tracing::{debug, info};

/// Copy the files in `paths` to `out`, reading `capacity` bytes at a time.
/// Returns the number of bytes copied.
///
/// # Errors
/// The first failing open, read or write, prefixed with its path.
pub fn cat<R: FsRuntime, W: FsRuntime>(
    runtime: &R,
    paths: &[String],
    capacity: usize,
    out: &mut Handle<W>,
) -> Result<usize, String> {
    let mut total = 0;
    for path in paths {
        let mut input = Handle::open(runtime, path, capacity, &OpenOptions::read())
            .map_err(|e| format!("{path}: {e}"))?;
        while let Some(chunk) = input.read(capacity).map_err(|e| format!("{path}: {e}"))? {
            out.write(&chunk).map_err(|e| format!("output: {e}"))?;
            total += chunk.len();
        }
        debug!(path = path.as_str(), total, "cat done");
    }
    out.flush().map_err(|e| format!("output: {e}"))?;
    Ok(total)
}

fn write_numbered<W: FsRuntime>(
    out: &mut Handle<W>,
    number: usize,
    line: &[u8],
) -> filebuf::Result<()> {
    out.write(format!("{number:6}\t").as_bytes())?;
    out.write(line)?;
    out.write(b"\n")
}

/// Write the lines of `path` to `out`, numbered from 1. Returns the line count.
///
/// # Errors
/// Failing open, read or write.
pub fn lines<R: FsRuntime, W: FsRuntime>(
    runtime: &R,
    path: &str,
    capacity: usize,
    out: &mut Handle<W>,
) -> Result<usize, String> {
    let mut input = Handle::open(runtime, path, capacity, &OpenOptions::read())
        .map_err(|e| format!("{path}: {e}"))?;
    let mut count = 0;
    while let Some(line) = input.read_line().map_err(|e| format!("{path}: {e}"))? {
        count += 1;
        write_numbered(out, count, &line).map_err(|e| format!("output: {e}"))?;
    }
    out.flush().map_err(|e| format!("output: {e}"))?;
    Ok(count)
}

/// Copy `from` to `to`. Returns the number of bytes copied.
///
/// # Errors
/// Failing open, read, write or the final close.
pub fn copy<R: FsRuntime>(
    runtime: &R,
    from: &str,
    to: &str,
    capacity: usize,
    output: &OpenOptions,
) -> Result<usize, String> {
    let mut input = Handle::open(runtime, from, capacity, &OpenOptions::read())
        .map_err(|e| format!("{from}: {e}"))?;
    let mut out = Handle::open(runtime, to, capacity, output).map_err(|e| format!("{to}: {e}"))?;

    let mut total = 0;
    while let Some(chunk) = input.read(capacity).map_err(|e| format!("{from}: {e}"))? {
        out.write(&chunk).map_err(|e| format!("{to}: {e}"))?;
        total += chunk.len();
    }
    out.close().map_err(|e| format!("{to}: {e}"))?;
    info!(from, to, total, "copied");
    Ok(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    pub writers: usize,
    pub records: usize,
    pub bytes: usize,
}

fn record(writer: usize, index: usize) -> String {
    format!("writer {writer:04} record {index:08}\n")
}

fn parse_record(line: &[u8]) -> Option<(usize, usize)> {
    let line = std::str::from_utf8(line).ok()?;
    let rest = line.strip_prefix("writer ")?;
    let (writer, index) = rest.split_once(" record ")?;
    if writer.len() != 4 || index.len() != 8 {
        return None;
    }
    Some((writer.parse().ok()?, index.parse().ok()?))
}

/// Let `writers` blocking tasks append `records` lines each to one locked
/// handle, then read the file back and check that no line was torn and each
/// writer's lines kept their order.
///
/// # Errors
/// Any I/O failure, a failed task, or a corrupted file.
pub async fn stress<R>(
    runtime: Arc<R>,
    path: &str,
    capacity: usize,
    writers: usize,
    records: usize,
) -> Result<StressReport, String>
where
    R: FsRuntime + Send + Sync + 'static,
{
    let options = OpenOptions::write().create(true).truncate(true).lock(true);
    let handle = Arc::new(
        LockedHandle::open(Arc::clone(&runtime), path, capacity, &options)
            .map_err(|e| format!("{path}: {e}"))?,
    );

    let tasks: Vec<_> = (0..writers)
        .map(|writer| {
            let handle = Arc::clone(&handle);
            tokio::task::spawn_blocking(move || -> Result<(), filebuf::Error> {
                for index in 0..records {
                    handle.write(record(writer, index).as_bytes())?;
                }
                Ok(())
            })
        })
        .collect();
    for task in tasks {
        task.await
            .map_err(|e| format!("writer task failed: {e}"))?
            .map_err(|e| format!("{path}: {e}"))?;
    }
    handle.close().map_err(|e| format!("{path}: {e}"))?;
    drop(handle);

    let mut input = Handle::open(runtime, path, capacity, &OpenOptions::read())
        .map_err(|e| format!("{path}: {e}"))?;
    let mut next = vec![0usize; writers];
    let mut bytes = 0;
    while let Some(line) = input.read_line().map_err(|e| format!("{path}: {e}"))? {
        bytes += line.len() + 1;
        let Some((writer, index)) = parse_record(&line) else {
            return Err(format!(
                "{path}: torn record {:?}",
                String::from_utf8_lossy(&line)
            ));
        };
        match next.get_mut(writer) {
            Some(expected) if *expected == index => *expected += 1,
            _ => return Err(format!("{path}: writer {writer} record {index} out of order")),
        }
    }
    if let Some(writer) = next.iter().position(|&n| n != records) {
        return Err(format!(
            "{path}: writer {writer} has {} records, expected {records}",
            next[writer]
        ));
    }

    info!(path, writers, records, bytes, "stress passed");
    Ok(StressReport {
        writers,
        records,
        bytes,
    })
}
