//! Cue management: segment rotation and reclamation of dead prefixes.

use log::debug;

use crate::{sys, BobFile, BobFileError, Mode};

impl BobFile {
    /// Returns the space left in the current cue block, and zero when the
    /// file offset sits exactly on a cue boundary.
    ///
    /// Measured from the file offset, so the caller must have committed any
    /// buffered output first.
    pub fn cue_remaining(&self) -> Result<u64, BobFileError> {
        let current = sys::position(&self.file)?;
        if current % self.cuesize == 0 {
            return Ok(0);
        }
        Ok(self.cuesize - current % self.cuesize)
    }

    /// Starts a new segment at the next cue boundary and returns the
    /// boundary offset.
    ///
    /// The file offset moves up to the boundary, the buffer restarts empty
    /// there (anything pending in it is discarded — the previous segment
    /// must already be committed), and a fresh segment header goes into the
    /// buffer. The header carries the magic only when the boundary is
    /// offset zero, i.e. when this opens the original first segment.
    pub fn new_cue(&mut self) -> Result<u64, BobFileError> {
        debug_assert_eq!(self.mode, Mode::Writing);
        let mut current = sys::position(&self.file)?;
        if current % self.cuesize != 0 {
            current += self.cuesize - current % self.cuesize;
            sys::seek_set(&self.file, current)?;
        }
        self.pos = 0;
        self.written = 0;
        self.write_header(current == 0)?;
        debug!("started new segment at offset {}", current);
        Ok(current)
    }

    /// Punches a hole over the dead prefix `[0, start)`, releasing its
    /// storage while keeping the logical file length unchanged. The next
    /// open skips the hole with `SEEK_DATA`.
    pub fn zap(&self, start: u64) -> Result<(), BobFileError> {
        sys::punch_hole(&self.file, start)?;
        debug!("punched out {} dead prefix bytes", start);
        Ok(())
    }
}
