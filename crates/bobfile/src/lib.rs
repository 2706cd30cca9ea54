//! # BobFile — block-aligned container file engine
//!
//! The on-disk engine behind a BOB ("binary object") container: one opaque
//! blob of bytes, persisted as a log of rewrite records so that frequent
//! small updates append instead of rewriting the file. The physical layout
//! is aligned to the filesystem block size to be gentle on flash storage,
//! and old segments are reclaimed by punching a sparse hole over them.
//!
//! ## On-Disk Layout
//!
//! ```text
//! file    := segment+                   all but the last are dead at rest
//! segment := header record* padding     starts at a cue-aligned offset
//! header  := magic? fields END          magic "BOB\0" only at offset zero
//! fields  := (varint id, varint value)* ids: 1 = blocksize, 2 = cuesize
//! record  := varint block-id payload    REWRITE(1): varint len, len bytes
//! ```
//!
//! Padding is whatever pre-allocated space remains up to the next cue
//! boundary; the parser detects the end of a segment by end of file, not by
//! a terminator. Replaying the records of the live segment reconstructs the
//! current object: each REWRITE replaces it wholesale.
//!
//! ## The Dual-Purpose Buffer
//!
//! A single block-sized buffer serves as the read buffer while a file is
//! parsed and as the write buffer afterwards. Two cursors describe it in
//! both roles:
//!
//! ```text
//! Reading: pos <= written   [pos, written) is prefetched, unconsumed input
//! Writing: written <= pos   [written, pos) is dirty, not yet written out
//! ```
//!
//! The transition happens exactly once, at the end of [`BobFile::parse`],
//! which pins both cursors to `blocksize` so the first subsequent write
//! takes the buffer-full path and realigns itself.
//!
//! ## Reclamation
//!
//! When a record no longer fits in the current cue block,
//! [`BobFile::new_cue`] seeks to the next cue-aligned offset and starts a
//! fresh, self-describing segment. Everything before that offset
//! is then dead and [`BobFile::zap`] releases its storage with
//! `FALLOC_FL_PUNCH_HOLE`. On the next open, `SEEK_DATA` skips the hole and
//! parsing starts at the surviving segment's header.
//!
//! Callers must guarantee that a file is attached to at most one `BobFile`
//! at a time; no locking is attempted.

mod cue;
pub mod format;
mod read;
pub(crate) mod sys;
mod write;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use thiserror::Error;
use varint::VarintError;

use crate::format::{
    CUE_SIZE_MULTIPLIER, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MAX_CUE_SIZE, MIN_BLOCK_SIZE,
};

/// Errors that can occur while operating on a container file.
#[derive(Debug, Error)]
pub enum BobFileError {
    /// An underlying I/O error, unchanged from the OS.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream violates the container format.
    #[error("corrupt container: {0}")]
    Corrupt(&'static str),
}

impl From<VarintError> for BobFileError {
    fn from(e: VarintError) -> Self {
        match e {
            VarintError::Overflow => BobFileError::Corrupt("varint overflows 64 bits"),
            VarintError::Overlong => BobFileError::Corrupt("overlong varint encoding"),
        }
    }
}

/// Which role the scratch buffer currently plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Parsing an existing file; the buffer is a prefetch window.
    Reading,
    /// Appending records; the buffer collects dirty output.
    Writing,
}

/// An open container file: descriptor, resolved sizes, and the block-sized
/// scratch buffer with its two cursors.
///
/// Obtained from [`BobFile::create`] or [`BobFile::open`]. A file obtained
/// from `open` *must* be [`parse`](BobFile::parse)d before anything is
/// written to it; writing earlier would clobber the prefetch state.
pub struct BobFile {
    file: File,
    /// Block size in effect, also the buffer size once resolved.
    blocksize: usize,
    /// Cue size in effect; a multiple of `blocksize`.
    cuesize: u64,
    buf: Vec<u8>,
    pos: usize,
    written: usize,
    mode: Mode,
}

impl std::fmt::Debug for BobFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BobFile")
            .field("blocksize", &self.blocksize)
            .field("cuesize", &self.cuesize)
            .field("pos", &self.pos)
            .field("written", &self.written)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Picks the block size to use for file operations.
///
/// An in-range configured value wins; otherwise the filesystem is probed,
/// and if the probe fails or reports something unusable the default is
/// assumed.
fn real_blocksize(file: &File, configured: u64) -> u64 {
    if (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&configured) {
        return configured;
    }
    match sys::filesystem_block_size(file) {
        Ok(bs) if (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&bs) => bs,
        _ => DEFAULT_BLOCK_SIZE,
    }
}

/// Picks the cue size to use for file operations: at least the block size,
/// at most [`MAX_CUE_SIZE`], and always a multiple of the block size
/// (rounded down).
fn real_cuesize(blocksize: u64, configured: u64) -> u64 {
    if configured < blocksize {
        return blocksize * CUE_SIZE_MULTIPLIER;
    }
    let capped = configured.min(MAX_CUE_SIZE);
    capped - capped % blocksize
}

impl BobFile {
    /// Creates a new container file at `path`.
    ///
    /// Fails with `AlreadyExists` if the path is occupied. The configured
    /// sizes may each be zero to auto-select; the resolved values are
    /// serialized into the header, which is left in the write buffer (the
    /// first commit or record write pushes it to disk).
    ///
    /// On any failure after the file has been created, the file is removed
    /// again so no truncated container is left behind.
    pub fn create<P: AsRef<Path>>(
        path: P,
        conf_blocksize: u64,
        conf_cuesize: u64,
    ) -> Result<Self, BobFileError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        match Self::init_created(file, conf_blocksize, conf_cuesize) {
            Ok(this) => Ok(this),
            Err(e) => {
                let _ = sys::unlink(path);
                Err(e)
            }
        }
    }

    fn init_created(
        file: File,
        conf_blocksize: u64,
        conf_cuesize: u64,
    ) -> Result<Self, BobFileError> {
        let blocksize = real_blocksize(&file, conf_blocksize);
        let cuesize = real_cuesize(blocksize, conf_cuesize);
        sys::fallocate_next(&file, blocksize)?;
        let mut this = BobFile {
            file,
            blocksize: blocksize as usize,
            cuesize,
            buf: vec![0; blocksize as usize],
            pos: 0,
            written: 0,
            mode: Mode::Writing,
        };
        this.write_header(true)?;
        Ok(this)
    }

    /// Opens an existing container file and reads its segment header.
    ///
    /// The true block size is unknown until the header has been read, so
    /// parsing starts with a provisional buffer of [`DEFAULT_BLOCK_SIZE`]
    /// bytes that the header reader adjusts afterwards. If the file's dead
    /// prefix has been punched out, `SEEK_DATA` lands on the surviving
    /// segment; the magic is only expected when the data starts at offset
    /// zero.
    ///
    /// A successful `open` must be followed by [`parse`](BobFile::parse).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BobFileError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut this = BobFile {
            file,
            blocksize: DEFAULT_BLOCK_SIZE as usize,
            cuesize: 0,
            buf: vec![0; DEFAULT_BLOCK_SIZE as usize],
            pos: 0,
            written: 0,
            mode: Mode::Reading,
        };
        let data_start = sys::seek_data(&this.file, 0)?;
        this.read_header(data_start == 0)?;
        Ok(this)
    }

    /// Commits the write buffer and forces the data to stable storage.
    ///
    /// Both steps are attempted even if the first fails; the first error is
    /// the one reported.
    pub fn flush(&mut self) -> Result<(), BobFileError> {
        let mut first_err: Option<BobFileError> = None;
        if self.mode == Mode::Writing {
            if let Err(e) = self.commit() {
                first_err = Some(e);
            }
        }
        if let Err(e) = sys::fsync(&self.file) {
            first_err.get_or_insert(e.into());
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Closes the container: commit, fsync, close.
    ///
    /// Each step is attempted regardless of earlier failures so the
    /// descriptor is always released; the first error is the one reported.
    ///
    /// Dropping a `BobFile` without calling `close` releases the descriptor
    /// but skips the final commit and fsync — committed records are already
    /// in the page cache, so at most the header of a freshly created,
    /// never-written container is lost.
    pub fn close(mut self) -> Result<(), BobFileError> {
        let mut first_err: Option<BobFileError> = None;
        if self.mode == Mode::Writing {
            if let Err(e) = self.commit() {
                first_err = Some(e);
            }
        }
        if let Err(e) = sys::fsync(&self.file) {
            first_err.get_or_insert(e.into());
        }
        if let Err(e) = sys::close(self.file) {
            first_err.get_or_insert(e.into());
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Returns the block size in effect.
    #[must_use]
    pub fn blocksize(&self) -> u64 {
        self.blocksize as u64
    }

    /// Returns the cue size in effect.
    #[must_use]
    pub fn cuesize(&self) -> u64 {
        self.cuesize
    }
}

#[cfg(test)]
mod tests;
