//! EINTR-safe wrappers around the file primitives the container engine uses.
//!
//! Every wrapper retries transparently when the underlying call is
//! interrupted by a signal; [`write_all`] additionally loops until the whole
//! count is drained. The space-reservation and hole-punching helpers go
//! through `libc` because std exposes neither `fallocate(2)` nor `SEEK_DATA`
//! nor `fstatvfs(3)`. Linux only.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::Path;

/// Reads into `buf` from the file's current offset. `Ok(0)` means end of
/// file.
pub fn read(mut file: &File, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match file.read(buf) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Writes all of `buf` at the file's current offset. std's `write_all`
/// already retries interrupted writes and loops until drained.
pub fn write_all(mut file: &File, buf: &[u8]) -> io::Result<()> {
    file.write_all(buf)
}

/// Forces file data out to the storage device.
pub fn fsync(file: &File) -> io::Result<()> {
    loop {
        match file.sync_all() {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Closes the file, reporting the error `File`'s destructor would swallow.
pub fn close(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    loop {
        let rc = unsafe { libc::close(fd) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Removes the file at `path`.
pub fn unlink(path: &Path) -> io::Result<()> {
    loop {
        match std::fs::remove_file(path) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

fn lseek(file: &File, offset: i64, whence: libc::c_int) -> io::Result<u64> {
    loop {
        let rc = unsafe { libc::lseek(file.as_raw_fd(), offset, whence) };
        if rc >= 0 {
            return Ok(rc as u64);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Returns the current file offset.
pub fn position(file: &File) -> io::Result<u64> {
    lseek(file, 0, libc::SEEK_CUR)
}

/// Moves the file offset to the absolute position `offset`.
pub fn seek_set(file: &File, offset: u64) -> io::Result<u64> {
    lseek(file, offset as i64, libc::SEEK_SET)
}

/// Moves the file offset by the signed amount `delta`.
pub fn seek_cur(file: &File, delta: i64) -> io::Result<u64> {
    lseek(file, delta, libc::SEEK_CUR)
}

/// Moves the file offset to the first data byte at or after `offset`,
/// skipping over any hole. Fails with `ENXIO` when the file holds no data
/// past `offset`.
pub fn seek_data(file: &File, offset: u64) -> io::Result<u64> {
    lseek(file, offset as i64, libc::SEEK_DATA)
}

fn fallocate(file: &File, mode: libc::c_int, offset: u64, len: u64) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::fallocate(file.as_raw_fd(), mode, offset as i64, len as i64) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Reserves `len` bytes of storage starting at the current file offset.
/// The reservation does not extend the logical file length.
pub fn fallocate_next(file: &File, len: u64) -> io::Result<()> {
    let cur = position(file)?;
    fallocate(file, libc::FALLOC_FL_KEEP_SIZE, cur, len)
}

/// Releases the storage backing `[0, end)` while keeping the logical file
/// length unchanged.
pub fn punch_hole(file: &File, end: u64) -> io::Result<()> {
    fallocate(
        file,
        libc::FALLOC_FL_PUNCH_HOLE | libc::FALLOC_FL_KEEP_SIZE,
        0,
        end,
    )
}

/// Returns the filesystem's preferred I/O block size for `file`.
pub fn filesystem_block_size(file: &File) -> io::Result<u64> {
    loop {
        let mut st = std::mem::MaybeUninit::<libc::statvfs>::uninit();
        let rc = unsafe { libc::fstatvfs(file.as_raw_fd(), st.as_mut_ptr()) };
        if rc == 0 {
            let st = unsafe { st.assume_init() };
            return Ok(st.f_bsize as u64);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::tempdir;

    #[test]
    fn reservation_keeps_logical_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reserve");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        fallocate_next(&file, 4096).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 0);

        write_all(&file, b"abc").unwrap();
        assert_eq!(file.metadata().unwrap().len(), 3);
    }

    #[test]
    fn punched_prefix_reads_as_zeros() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("punch");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        write_all(&file, &vec![0xAB; 8192]).unwrap();
        punch_hole(&file, 4096).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 8192);
        assert!(data[..4096].iter().all(|&b| b == 0));
        assert!(data[4096..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn seek_data_skips_a_hole() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sparse");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        write_all(&file, &vec![1u8; 8192]).unwrap();
        punch_hole(&file, 4096).unwrap();
        let start = seek_data(&file, 0).unwrap();
        assert_eq!(start, 4096);
    }

    #[test]
    fn seek_data_on_empty_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        assert!(seek_data(&file, 0).is_err());
    }
}
