//! # Bob — append-friendly single-object container
//!
//! A BOB ("binary object") file stores one contiguous blob of opaque bytes
//! and persists successive versions of it as appended rewrite records, so
//! that frequent small updates are gentle on flash storage. This crate is
//! the public handle over the [`bobfile`] engine.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌──────────────────────────────────────────────┐
//! │                    BOB                       │
//! │                                              │
//! │ set(bytes) → encode REWRITE record           │
//! │                |                             │
//! │                |  (fits in current cue?)     │
//! │                |           no                │
//! │                v                             │
//! │           new_cue() → fresh segment header   │
//! │                |                             │
//! │                v                             │
//! │           write + commit                     │
//! │                |                             │
//! │                v                             │
//! │           zap() → punch hole over dead       │
//! │                   segments (if rotated)      │
//! │                                              │
//! │ current() → borrow of the last record's      │
//! │             payload (no copy)                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Durability
//!
//! Every `set` commits its record to the file before returning; `flush`
//! additionally forces the data to stable storage with fsync, and `close`
//! does both on the way out. A `set` that fails leaves the previously
//! visible bytes intact — at worst the file ends in a torn record, which
//! the next open reports as corruption.
//!
//! ## Exclusivity
//!
//! One file, one handle. The caller ensures nobody else has the file open;
//! no locking is attempted. Distinct handles on distinct files are fine,
//! from distinct threads too.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bob::{Bob, Config};
//!
//! let mut bob = Bob::create(&Config::new(), "state.bob")?;
//! bob.set(b"first version")?;
//! bob.set(b"second version")?;
//! assert_eq!(bob.current(), b"second version");
//! bob.close()?;
//!
//! let bob = Bob::open("state.bob")?;
//! assert_eq!(bob.current(), b"second version");
//! # anyhow::Ok(())
//! ```

mod config;

pub use config::Config;

use std::path::Path;

use anyhow::{Context, Result};
use bobfile::BobFile;

/// A handle on one BOB container file.
///
/// Holds the open engine plus an in-memory copy of the current object.
/// After a `set`, `data` is the whole encoded REWRITE record and `offset`
/// marks where the payload begins inside it, so [`current`](Bob::current)
/// can borrow the payload without a second copy. After an `open`, `data`
/// is the replayed object itself and `offset` is zero.
pub struct Bob {
    file: BobFile,
    data: Vec<u8>,
    offset: usize,
}

impl std::fmt::Debug for Bob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bob")
            .field("len", &self.current().len())
            .field("blocksize", &self.file.blocksize())
            .field("cuesize", &self.file.cuesize())
            .finish()
    }
}

impl Bob {
    /// Creates a new, empty container at `path`.
    ///
    /// Fails if the path is occupied (the existing file is left alone).
    /// The configuration's zero defaults auto-select both sizes; see
    /// [`Config`].
    pub fn create<P: AsRef<Path>>(cfg: &Config, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = BobFile::create(path, cfg.blocksize(), cfg.cuesize())
            .with_context(|| format!("failed to create bob file {}", path.display()))?;
        Ok(Bob {
            file,
            data: Vec::new(),
            offset: 0,
        })
    }

    /// Opens an existing container and replays its records.
    ///
    /// The handle comes back positioned for appending, with
    /// [`current`](Bob::current) returning the last version written. A
    /// container that was created but never written to yields the empty
    /// object.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BobFile::open(path)
            .with_context(|| format!("failed to open bob file {}", path.display()))?;
        let data = file
            .parse()
            .with_context(|| format!("failed to replay bob file {}", path.display()))?;
        Ok(Bob {
            file,
            data,
            offset: 0,
        })
    }

    /// Replaces the object with `bytes`.
    ///
    /// The payload is encoded as one REWRITE record and appended to the
    /// current segment; when it no longer fits in the cue block, a fresh
    /// segment is opened at the next cue boundary first, and after the
    /// record is committed the dead segments before that boundary are
    /// punched out.
    ///
    /// On failure the in-memory object is untouched and keeps serving the
    /// previous bytes.
    pub fn set(&mut self, bytes: &[u8]) -> Result<()> {
        let mut vbuf = [0u8; varint::MAX_ENCODED_LEN];
        let vlen = varint::encode(bytes.len() as u64, &mut vbuf);
        let mut record = Vec::with_capacity(1 + vlen + bytes.len());
        record.push(bobfile::format::BLOCK_REWRITE as u8);
        record.extend_from_slice(&vbuf[..vlen]);
        record.extend_from_slice(bytes);

        let remaining = self.file.cue_remaining()?;
        let mut new_segment = 0u64;
        if remaining < record.len() as u64 {
            new_segment = self.file.new_cue()?;
        }
        self.file.write(&record)?;
        self.file.commit()?;

        // The record is in the file; adopt its buffer as the current view
        // before reclaiming anything.
        self.offset = 1 + vlen;
        self.data = record;
        if new_segment > 0 {
            self.file.zap(new_segment)?;
        }
        Ok(())
    }

    /// Returns the current object.
    ///
    /// The borrow is valid until the next [`set`](Bob::set); an empty or
    /// never-written container yields the empty slice.
    #[must_use]
    pub fn current(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    /// Forces the latest object to stable storage.
    ///
    /// `set` already writes its record to the file; this additionally
    /// pushes any cached file data down to the disk.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush().context("failed to flush bob file")
    }

    /// Closes the container, flushing data to disk.
    ///
    /// The file is closed even when flushing fails; the first error is the
    /// one reported.
    pub fn close(self) -> Result<()> {
        self.file.close().context("failed to close bob file")
    }

    /// Returns the block size the container runs on.
    #[must_use]
    pub fn blocksize(&self) -> u64 {
        self.file.blocksize()
    }

    /// Returns the cue size the container runs on.
    #[must_use]
    pub fn cuesize(&self) -> u64 {
        self.file.cuesize()
    }
}
