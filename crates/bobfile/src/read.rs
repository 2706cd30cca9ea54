//! The parse path: buffered reads, header validation, and record replay.

use log::debug;

use crate::format::{
    BLOCK_REWRITE, CONFIG_BLOCK_SIZE, CONFIG_CUE_SIZE, CONFIG_END, FILE_MAGIC, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE,
};
use crate::{sys, BobFile, BobFileError, Mode};

impl BobFile {
    /// Reads more bytes behind the prefetch window, resetting the cursors
    /// first when the window has swept through the whole buffer. Returns
    /// the number of bytes obtained; zero means end of file.
    fn refill(&mut self) -> Result<usize, BobFileError> {
        if self.written == self.blocksize {
            self.pos = 0;
            self.written = 0;
        }
        let n = sys::read(&self.file, &mut self.buf[self.written..])?;
        self.written += n;
        Ok(n)
    }

    /// Fills `out` from the prefetch window, refilling from the file as
    /// needed. Hitting end of file with the read outstanding means a
    /// record was cut short, which is corruption, not a clean end.
    fn read_exact(&mut self, out: &mut [u8]) -> Result<(), BobFileError> {
        debug_assert_eq!(self.mode, Mode::Reading);
        let mut out = &mut out[..];
        loop {
            let avail = self.written - self.pos;
            if out.len() <= avail {
                out.copy_from_slice(&self.buf[self.pos..self.pos + out.len()]);
                self.pos += out.len();
                return Ok(());
            }
            let (head, rest) = out.split_at_mut(avail);
            head.copy_from_slice(&self.buf[self.pos..self.written]);
            out = rest;
            self.pos = self.written;
            if self.refill()? == 0 {
                return Err(BobFileError::Corrupt("unexpected end of file"));
            }
        }
    }

    /// Probes for end of file. When the prefetch window is empty, one
    /// refill is attempted; only a zero-byte refill counts as the end.
    fn is_eof(&mut self) -> Result<bool, BobFileError> {
        if self.pos != self.written {
            return Ok(false);
        }
        Ok(self.refill()? == 0)
    }

    /// Decodes one varint from the stream, byte by byte.
    fn read_varint(&mut self) -> Result<u64, BobFileError> {
        let mut decoder = varint::Decoder::new();
        loop {
            let mut byte = [0u8; 1];
            self.read_exact(&mut byte)?;
            if let varint::Step::Done(value) = decoder.step(byte[0])? {
                return Ok(value);
            }
        }
    }

    /// Reads and validates a segment header at the current position.
    ///
    /// `expect_magic` is true exactly when the segment starts at file
    /// offset zero — only the original first segment carries the magic.
    /// After the fields are validated, the provisional buffer is adjusted
    /// to the true block size; any surplus the prefetch read beyond it is
    /// handed back to the file offset.
    pub(crate) fn read_header(&mut self, expect_magic: bool) -> Result<(), BobFileError> {
        if expect_magic {
            let mut magic = [0u8; 4];
            self.read_exact(&mut magic)?;
            if magic != FILE_MAGIC {
                return Err(BobFileError::Corrupt("bad file magic"));
            }
        }
        let mut blocksize = 0u64;
        let mut cuesize = 0u64;
        loop {
            match self.read_varint()? {
                CONFIG_BLOCK_SIZE => blocksize = self.read_varint()?,
                CONFIG_CUE_SIZE => cuesize = self.read_varint()?,
                CONFIG_END => break,
                _ => return Err(BobFileError::Corrupt("unknown header field")),
            }
        }
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&blocksize)
            || cuesize < blocksize
            || cuesize % blocksize != 0
        {
            return Err(BobFileError::Corrupt("header sizes out of bounds"));
        }
        let blocksize = blocksize as usize;
        if self.written > blocksize {
            sys::seek_cur(&self.file, blocksize as i64 - self.written as i64)?;
            self.written = blocksize;
        }
        if blocksize != self.blocksize {
            self.buf.resize(blocksize, 0);
            self.blocksize = blocksize;
        }
        self.cuesize = cuesize;
        Ok(())
    }

    /// Replays the record log and returns the reconstructed current object.
    ///
    /// Each REWRITE record replaces the object wholesale; the last one
    /// standing at end of file wins. On success the buffer transitions into
    /// write mode with both cursors pinned to the block size, so the next
    /// write realigns itself to a block boundary, and the file offset is at
    /// the end of the last record.
    pub fn parse(&mut self) -> Result<Vec<u8>, BobFileError> {
        debug_assert_eq!(self.mode, Mode::Reading);
        let mut data = Vec::new();
        let mut records = 0u64;
        loop {
            if self.is_eof()? {
                self.pos = self.blocksize;
                self.written = self.blocksize;
                self.mode = Mode::Writing;
                debug!(
                    "replayed {} records, current object is {} bytes",
                    records,
                    data.len()
                );
                return Ok(data);
            }
            match self.read_varint()? {
                BLOCK_REWRITE => {
                    let len = self.read_varint()?;
                    let len = usize::try_from(len)
                        .map_err(|_| BobFileError::Corrupt("record length out of range"))?;
                    data.clear();
                    data.resize(len, 0);
                    self.read_exact(&mut data)?;
                    records += 1;
                }
                _ => return Err(BobFileError::Corrupt("unknown record kind")),
            }
        }
    }
}
