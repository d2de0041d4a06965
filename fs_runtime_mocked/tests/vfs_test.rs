use std::sync::Barrier;

use fs_runtime::{errno, FsRuntime, OpenFlags, DEFAULT_PERM};
use fs_runtime_mocked::{MockFs, Syscall, SyscallCounts, WANT_ERROR};

fn create_flags() -> OpenFlags {
    OpenFlags {
        create: true,
        ..OpenFlags::write_only()
    }
}

#[test]
fn open_read_returns_minus_one_if_file_not_found() {
    let fs = MockFs::new();
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);
    assert_eq!(fd, -1);
    assert_eq!(fs.get_errno(), errno::ENOENT);
}

#[test]
fn open_read_returns_non_negative_if_file_exists() {
    let fs = MockFs::new();
    fs.add_file("test", Vec::new());

    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);

    assert!(fd >= 0);
}

#[test]
fn open_returns_minus_one_on_want_error_name() {
    let fs = MockFs::new();

    let fd = fs.open(c"test\u{1}", create_flags(), DEFAULT_PERM);

    assert_eq!(fd, -1);
    assert_eq!(fs.get_errno(), errno::EINVAL);
}

#[test]
fn open_write_with_create_creates_file() {
    let fs = MockFs::new();
    assert!(fs.get_file("test").is_err());

    let fd = fs.open(c"test", create_flags(), DEFAULT_PERM);

    assert!(fd >= 0);
    assert_eq!(fs.get_file("test").unwrap(), b"");
}

#[test]
fn open_write_without_create_needs_existing_file() {
    let fs = MockFs::new();

    let fd = fs.open(c"test", OpenFlags::write_only(), DEFAULT_PERM);

    assert_eq!(fd, -1);
    assert_eq!(fs.get_errno(), errno::ENOENT);
}

#[test]
fn exclusive_create_rejects_existing_file() {
    let fs = MockFs::new();
    fs.add_file("test", b"x".to_vec());
    let flags = OpenFlags {
        exclusive: true,
        ..create_flags()
    };

    assert_eq!(fs.open(c"test", flags, DEFAULT_PERM), -1);
    assert_eq!(fs.get_errno(), errno::EEXIST);
}

#[test]
fn truncate_and_append() {
    let fs = MockFs::new();
    fs.add_file("test", b"old content".to_vec());

    let truncating = OpenFlags {
        truncate: true,
        ..OpenFlags::write_only()
    };
    let fd = fs.open(c"test", truncating, DEFAULT_PERM);
    assert_eq!(fs.get_file("test").unwrap(), b"");
    assert_eq!(fs.write(fd, b"one"), 3);

    let appending = OpenFlags {
        append: true,
        ..OpenFlags::write_only()
    };
    let fd2 = fs.open(c"test", appending, DEFAULT_PERM);
    assert_eq!(fs.write(fd2, b"two"), 3);

    assert_eq!(fs.get_file("test").unwrap(), b"onetwo");
}

#[test]
fn read_returns_content_then_zero() {
    let fs = MockFs::new();
    fs.add_file("test", b"hello".to_vec());
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);

    let mut buf = [0u8; 3];
    assert_eq!(fs.read(fd, &mut buf), 3);
    assert_eq!(&buf, b"hel");
    assert_eq!(fs.read(fd, &mut buf), 2);
    assert_eq!(&buf[..2], b"lo");
    assert_eq!(fs.read(fd, &mut buf), 0);
}

#[test]
fn read_stops_before_want_error_and_then_fails() {
    let fs = MockFs::new();
    fs.add_file("test", vec![b'a', b'b', WANT_ERROR as u8, b'c']);
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);

    let mut buf = [0u8; 10];
    assert_eq!(fs.read(fd, &mut buf), 2);
    assert_eq!(fs.read(fd, &mut buf), -1);
    assert_eq!(fs.get_errno(), errno::EIO);
}

#[test]
fn write_with_want_error_fails() {
    let fs = MockFs::new();
    let fd = fs.open(c"test", create_flags(), DEFAULT_PERM);

    assert_eq!(fs.write(fd, &[b'x', WANT_ERROR as u8]), -1);
    assert_eq!(fs.get_errno(), errno::EIO);
    assert_eq!(fs.get_file("test").unwrap(), b"");
}

#[test]
fn access_mode_is_enforced() {
    let fs = MockFs::new();
    fs.add_file("test", b"abc".to_vec());
    let rd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);
    let wr = fs.open(c"test", OpenFlags::write_only(), DEFAULT_PERM);

    assert_eq!(fs.write(rd, b"x"), -1);
    assert_eq!(fs.get_errno(), errno::EBADF);
    let mut buf = [0u8; 4];
    assert_eq!(fs.read(wr, &mut buf), -1);
    assert_eq!(fs.get_errno(), errno::EBADF);
}

#[test]
fn max_transfer_caps_reads_and_writes() {
    let fs = MockFs::new();
    fs.add_file("in", b"abcdef".to_vec());
    fs.set_max_transfer(Some(2));

    let rd = fs.open(c"in", OpenFlags::read_only(), DEFAULT_PERM);
    let mut buf = [0u8; 6];
    assert_eq!(fs.read(rd, &mut buf), 2);

    let wr = fs.open(c"out", create_flags(), DEFAULT_PERM);
    assert_eq!(fs.write(wr, b"xyz"), 2);
    assert_eq!(fs.get_file("out").unwrap(), b"xy");
}

#[test]
fn fail_next_is_one_shot() {
    let fs = MockFs::new();
    let fd = fs.open(c"test", create_flags(), DEFAULT_PERM);
    fs.fail_next(Syscall::Write, errno::ENOSPC);

    assert_eq!(fs.write(fd, b"a"), -1);
    assert_eq!(fs.get_errno(), errno::ENOSPC);
    assert_eq!(fs.write(fd, b"a"), 1);
}

#[test]
fn fail_nth_lets_earlier_calls_through() {
    let fs = MockFs::new();
    let fd = fs.open(c"test", create_flags(), DEFAULT_PERM);
    fs.fail_nth(Syscall::Write, 2, errno::EIO);

    assert_eq!(fs.write(fd, b"a"), 1);
    assert_eq!(fs.write(fd, b"b"), 1);
    assert_eq!(fs.write(fd, b"c"), -1);
    assert_eq!(fs.get_errno(), errno::EIO);
    assert_eq!(fs.write(fd, b"c"), 1);
    assert_eq!(fs.get_file("test").unwrap(), b"abc");
}

#[test]
fn errno_is_per_thread() {
    let fs = MockFs::new();
    let barrier = Barrier::new(2);

    std::thread::scope(|s| {
        s.spawn(|| {
            assert_eq!(fs.open(c"missing", OpenFlags::read_only(), DEFAULT_PERM), -1);
            barrier.wait();
            barrier.wait();
            assert_eq!(fs.get_errno(), errno::ENOENT);
        });
        s.spawn(|| {
            barrier.wait();
            assert_eq!(fs.close(1000), -1);
            assert_eq!(fs.get_errno(), errno::EBADF);
            barrier.wait();
        });
    });
}

#[test]
fn close_returns_minus_one_for_invalid_handle() {
    let fs = MockFs::new();

    assert_eq!(fs.close(999), -1);
    assert_eq!(fs.get_errno(), errno::EBADF);
}

#[test]
fn close_twice_fails_and_descriptor_is_released() {
    let fs = MockFs::new();
    fs.add_file("test", Vec::new());
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);
    assert_eq!(fs.open_descriptors(), 1);

    assert_eq!(fs.close(fd), 0);
    assert_eq!(fs.open_descriptors(), 0);
    assert_eq!(fs.close(fd), -1);

    let mut buf = [0u8; 1];
    assert_eq!(fs.read(fd, &mut buf), -1);
}

#[test]
fn failed_close_still_releases_descriptor() {
    let fs = MockFs::new();
    fs.add_file("test", Vec::new());
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);
    fs.fail_next(Syscall::Close, errno::EIO);

    assert_eq!(fs.close(fd), -1);
    assert_eq!(fs.open_descriptors(), 0);
}

#[test]
fn counts_every_call() {
    let fs = MockFs::new();
    fs.add_file("test", b"ab".to_vec());
    let fd = fs.open(c"test", OpenFlags::read_only(), DEFAULT_PERM);
    let mut buf = [0u8; 1];
    fs.read(fd, &mut buf);
    fs.read(fd, &mut buf);
    fs.close(fd);

    assert_eq!(
        fs.counts(),
        SyscallCounts {
            opens: 1,
            reads: 2,
            writes: 0,
            closes: 1,
        }
    );

    fs.reset_counts();
    assert_eq!(fs.counts(), SyscallCounts::default());
}
