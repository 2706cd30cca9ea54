//! The buffered write path: block-aligned output and header serialization.

use crate::format::{CONFIG_BLOCK_SIZE, CONFIG_CUE_SIZE, CONFIG_END, FILE_MAGIC};
use crate::{sys, BobFile, BobFileError, Mode};

impl BobFile {
    /// Appends `data` behind everything previously written.
    ///
    /// As long as the bytes fit into the current block they are only
    /// buffered. Once a write spills over the block boundary, the storage
    /// for every block the write touches is reserved up front, the dirty
    /// part of the buffer is flushed, whole blocks are written straight
    /// from `data`, and the tail below a block is buffered again.
    pub fn write(&mut self, data: &[u8]) -> Result<(), BobFileError> {
        debug_assert_eq!(self.mode, Mode::Writing);
        let bs = self.blocksize;
        if self.pos + data.len() <= bs {
            self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
            self.pos += data.len();
            return Ok(());
        }

        // Reserve up to the block boundary past the end of this write.
        let bs64 = bs as u64;
        let mut allocate = (self.pos + data.len()) as u64;
        if allocate % bs64 != 0 {
            allocate += bs64 - allocate % bs64;
        }
        sys::fallocate_next(&self.file, allocate - self.pos as u64)?;

        if self.written != self.pos {
            sys::write_all(&self.file, &self.buf[self.written..self.pos])?;
        }

        // Complete the current block, then as many whole blocks as the
        // input covers, directly from the caller's buffer.
        let surplus = bs - self.pos;
        let full_blocks = (data.len() - surplus) / bs;
        let direct = surplus + full_blocks * bs;
        sys::write_all(&self.file, &data[..direct])?;

        let tail = data.len() - direct;
        self.buf[..tail].copy_from_slice(&data[direct..]);
        self.written = 0;
        self.pos = tail;
        Ok(())
    }

    /// Writes the dirty span `[written, pos)` out to the file. A no-op when
    /// the buffer is clean.
    ///
    /// The cursors are left where they are even when `pos` has reached the
    /// block size; the next [`write`](BobFile::write) handles the full
    /// buffer through its overflow branch.
    pub fn commit(&mut self) -> Result<(), BobFileError> {
        debug_assert_eq!(self.mode, Mode::Writing);
        if self.written == self.pos {
            return Ok(());
        }
        sys::write_all(&self.file, &self.buf[self.written..self.pos])?;
        self.written = self.pos;
        Ok(())
    }

    /// Serializes a segment header into the write buffer: the file magic
    /// (only for the segment at offset zero), the resolved block and cue
    /// sizes as `(id, value)` varint pairs, and the END terminator.
    pub(crate) fn write_header(&mut self, with_magic: bool) -> Result<(), BobFileError> {
        if with_magic {
            self.write(&FILE_MAGIC)?;
        }
        let mut vbuf = [0u8; varint::MAX_ENCODED_LEN];
        for (id, value) in [
            (CONFIG_BLOCK_SIZE, self.blocksize as u64),
            (CONFIG_CUE_SIZE, self.cuesize),
        ] {
            let n = varint::encode(id, &mut vbuf);
            self.write(&vbuf[..n])?;
            let n = varint::encode(value, &mut vbuf);
            self.write(&vbuf[..n])?;
        }
        let n = varint::encode(CONFIG_END, &mut vbuf);
        self.write(&vbuf[..n])?;
        Ok(())
    }
}
