use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use log::trace;

use crate::error::{Error, Result};
use crate::io;
use crate::record::Record;
use crate::DEFAULT_BUFFER_BYTES;

/// Position of the next record to serve, relative to the resident window.
#[derive(Clone, Copy, Debug)]
enum Cursor {
    /// A valid slot within the window.
    Slot(usize),
    /// The window is consumed; the next access must refill first.
    Drained,
}

/// A buffered, seekable reader over a file of fixed-size records.
///
/// The file is consumed window by window: `buf` holds the records at
/// logical indices `[offset, offset + buf.len())` and the cursor marks
/// the next slot to serve. Forward scans, reverse scans, and
/// absolute-index access all go through the same window bookkeeping, so
/// a refill never skips or repeats a record and never reads outside the
/// file.
///
/// ```rust
/// # use recstream::{Result, StreamReader, StreamWriter};
/// # fn try_main() -> Result<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("ranks.bin");
/// let mut writer = StreamWriter::create(&path)?;
/// for x in 0u32..6 {
///     writer.write(x)?;
/// }
/// writer.finish()?;
///
/// let mut reader = StreamReader::<u32>::open(&path)?;
/// let mut total = 0;
/// while !reader.is_empty()? {
///     total += reader.read()?;
/// }
/// assert_eq!(total, 15);
/// # Ok(())
/// # }
/// # try_main().unwrap();
/// ```
pub struct StreamReader<T: Record> {
    file: File,
    buf: Vec<T>,
    scratch: Vec<u8>,
    capacity: usize,
    // logical index of the record in buf[0]
    offset: u64,
    cursor: Cursor,
}

impl<T: Record> StreamReader<T> {
    /// Opens `path` with the default 4 MiB buffer budget.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffer_bytes(path, DEFAULT_BUFFER_BYTES)
    }

    /// Opens `path` with a window of `buf_bytes / T::SIZE` records (at
    /// least one) and loads the first window.
    pub fn with_buffer_bytes(path: impl AsRef<Path>, buf_bytes: usize) -> Result<Self> {
        assert!(T::SIZE > 0, "zero-size records cannot be streamed");
        let file = io::open_for_read(path.as_ref())?;
        let capacity = (buf_bytes / T::SIZE).max(1);
        let mut reader = StreamReader {
            file,
            buf: Vec::with_capacity(capacity),
            scratch: Vec::new(),
            capacity,
            offset: 0,
            cursor: Cursor::Drained,
        };
        reader.fill_forward()?;
        Ok(reader)
    }

    /// Number of records one window can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the record at the cursor without advancing.
    ///
    /// # Panics
    ///
    /// Panics if the stream is exhausted in the current scan direction;
    /// callers check [`Self::is_empty`] or [`Self::is_empty_reverse`]
    /// first.
    pub fn peek(&self) -> T {
        self.buf[self.slot()]
    }

    /// Moves the cursor one record forward, refilling at the window edge.
    pub fn advance(&mut self) -> Result<()> {
        let slot = self.slot();
        self.advance_from(slot)
    }

    /// Returns the record at the cursor and moves forward.
    ///
    /// # Panics
    ///
    /// Panics if the stream is exhausted; see [`Self::peek`].
    pub fn read(&mut self) -> Result<T> {
        let slot = self.slot();
        let record = self.buf[slot];
        self.advance_from(slot)?;
        Ok(record)
    }

    /// Returns the record at the cursor and moves backward.
    ///
    /// With `realign` set, the window that ends at the current file
    /// position is loaded first and the record served is its last one.
    /// Use that once when switching from forward to reverse consumption
    /// mid-stream; [`Self::seek_to_end`] primes the cursor already, so
    /// plain `read_reverse(false)` follows it.
    ///
    /// # Panics
    ///
    /// Panics if the stream is exhausted; see [`Self::peek`].
    pub fn read_reverse(&mut self, realign: bool) -> Result<T> {
        if realign {
            self.realign_reverse()?;
        }
        let slot = self.slot();
        let record = self.buf[slot];
        if slot == 0 {
            self.slide_reverse_window()?;
        } else {
            self.cursor = Cursor::Slot(slot - 1);
        }
        Ok(record)
    }

    /// True once forward consumption has reached the end of the file.
    ///
    /// May attempt one forward refill to decide; once true it stays
    /// true. End-of-file is reported here, never as an error.
    ///
    /// After a reverse scan has run to exhaustion the file position no
    /// longer matches the forward bookkeeping; call
    /// [`Self::seek_to_start`] before consuming forward again.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.buf.is_empty() && self.refill_next()? == 0)
    }

    /// True once reverse consumption has worked its way down to record 0.
    ///
    /// May attempt one reverse refill to decide; once true it stays true.
    pub fn is_empty_reverse(&mut self) -> Result<bool> {
        Ok(self.buf.is_empty() && self.slide_reverse_window()? == 0)
    }

    /// Random access: returns the record at logical index `index`.
    ///
    /// Indices below the window reseek backward, the index right after
    /// the window triggers an ordinary sequential refill, and anything
    /// farther ahead reseeks forward. Reading past the end of the file
    /// yields [`Error::OutOfBounds`].
    pub fn get(&mut self, index: u64) -> Result<T> {
        let slot = self.locate(index)?;
        Ok(self.buf[slot])
    }

    /// Like [`Self::get`] but hands out a mutable slot, letting callers
    /// patch the resident copy in place. The patch is not written back
    /// to the file and does not survive a refill.
    pub fn get_mut(&mut self, index: u64) -> Result<&mut T> {
        let slot = self.locate(index)?;
        Ok(&mut self.buf[slot])
    }

    /// Rewinds to record 0 and reloads the first window.
    ///
    /// This is the way back into forward consumption after a reverse
    /// scan; it re-establishes the file position the forward refill
    /// relies on.
    pub fn seek_to_start(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.offset = 0;
        self.buf.clear();
        self.fill_forward()?;
        Ok(())
    }

    /// Jumps to the logical end of the stream and primes the cursor on
    /// the last record, ready for [`Self::read_reverse`].
    /// `total_records` is the file's record count, tracked by the caller.
    pub fn seek_to_end(&mut self, total_records: u64) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.offset = total_records;
        self.buf.clear();
        self.realign_reverse()?;
        Ok(())
    }

    /// Buffer-relative cursor slot, `None` once the window is drained.
    pub fn cursor(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Slot(slot) => Some(slot),
            Cursor::Drained => None,
        }
    }

    /// Restores a cursor previously returned by [`Self::cursor`].
    ///
    /// Only meaningful within the window resident at the time of the
    /// save; no refill is triggered and slots outside `[0, filled]` are
    /// a caller error.
    pub fn set_cursor(&mut self, slot: usize) {
        debug_assert!(
            slot <= self.buf.len(),
            "cursor {} outside window of {} records",
            slot,
            self.buf.len()
        );
        self.cursor = Cursor::Slot(slot);
    }

    fn slot(&self) -> usize {
        match self.cursor {
            Cursor::Slot(slot) if slot < self.buf.len() => slot,
            _ => panic!("read past the loaded window; check is_empty()/is_empty_reverse() first"),
        }
    }

    fn advance_from(&mut self, slot: usize) -> Result<()> {
        if slot + 1 == self.buf.len() {
            self.refill_next()?;
        } else {
            self.cursor = Cursor::Slot(slot + 1);
        }
        Ok(())
    }

    /// Moves the window to `index` if it is not already resident, then
    /// returns its slot.
    fn locate(&mut self, index: u64) -> Result<usize> {
        let end = self.offset + self.buf.len() as u64;
        if index < self.offset {
            self.refill_at(index)?;
        } else if index >= end {
            if index < end + self.capacity as u64 {
                // the very next window, no seek needed
                self.refill_next()?;
            } else {
                self.refill_at(index)?;
            }
        }
        if index < self.offset || index >= self.offset + self.buf.len() as u64 {
            return Err(Error::OutOfBounds { index });
        }
        Ok((index - self.offset) as usize)
    }

    /// Advances the window past the resident records, reading from the
    /// current file position.
    fn refill_next(&mut self) -> Result<usize> {
        self.offset += self.buf.len() as u64;
        self.fill_forward()
    }

    /// Jumps the window to start at logical index `target`.
    fn refill_at(&mut self, target: u64) -> Result<usize> {
        trace!("reseek to record {}", target);
        self.file.seek(SeekFrom::Start(target * T::SIZE as u64))?;
        self.offset = target;
        self.fill_forward()
    }

    fn fill_forward(&mut self) -> Result<usize> {
        let n = io::read_records(&mut self.file, self.capacity, &mut self.scratch, &mut self.buf)?;
        self.cursor = match n {
            0 => Cursor::Drained,
            _ => Cursor::Slot(0),
        };
        Ok(n)
    }

    /// Reloads the window that ends at the current file position, for
    /// switching into reverse consumption from a forward-scan state.
    fn realign_reverse(&mut self) -> Result<usize> {
        let end = self.file.stream_position()? / T::SIZE as u64;
        if end == 0 {
            self.drain();
            return Ok(0);
        }
        self.load_window_ending_at(end)
    }

    /// Slides one window toward record 0 after the resident window has
    /// been consumed in reverse. Reports 0 once the region below the
    /// window is exhausted, which is the terminal condition for reverse
    /// scans.
    fn slide_reverse_window(&mut self) -> Result<usize> {
        if self.offset == 0 {
            self.drain();
            return Ok(0);
        }
        trace!("reverse slide to window ending at record {}", self.offset);
        self.load_window_ending_at(self.offset)
    }

    /// Loads the window of up to `capacity` records ending at logical
    /// index `end` and places the cursor on its last record. The final
    /// window near the start of the file is shorter: exactly `end`
    /// records.
    fn load_window_ending_at(&mut self, end: u64) -> Result<usize> {
        let want = (self.capacity as u64).min(end) as usize;
        let start = end - want as u64;
        self.file.seek(SeekFrom::Start(start * T::SIZE as u64))?;
        let n = io::read_records(&mut self.file, want, &mut self.scratch, &mut self.buf)?;
        self.offset = start;
        self.cursor = match n {
            0 => Cursor::Drained,
            n => Cursor::Slot(n - 1),
        };
        Ok(n)
    }

    fn drain(&mut self) {
        self.buf.clear();
        self.cursor = Cursor::Drained;
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::StreamWriter;

    fn fixture(dir: &TempDir, records: u32) -> std::path::PathBuf {
        let path = dir.path().join("fixture.bin");
        let mut writer = StreamWriter::create(&path).unwrap();
        for x in 0..records {
            writer.write(x).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn cursor_rewind_within_window() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, 10);
        let mut reader = StreamReader::<u32>::with_buffer_bytes(path, 8 * 4).unwrap();

        assert_eq!(reader.read().unwrap(), 0);
        assert_eq!(reader.read().unwrap(), 1);
        assert_eq!(reader.read().unwrap(), 2);
        let saved = reader.cursor().unwrap();
        assert_eq!(saved, 3);

        reader.set_cursor(1);
        assert_eq!(reader.peek(), 1);
        reader.set_cursor(saved);
        assert_eq!(reader.read().unwrap(), 3);
    }

    #[test]
    fn peek_does_not_advance() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, 3);
        let mut reader = StreamReader::<u32>::open(path).unwrap();
        assert_eq!(reader.peek(), 0);
        assert_eq!(reader.peek(), 0);
        reader.advance().unwrap();
        assert_eq!(reader.peek(), 1);
    }

    #[test]
    #[should_panic(expected = "read past the loaded window")]
    fn reading_an_exhausted_stream_panics() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, 0);
        let mut reader = StreamReader::<u32>::open(path).unwrap();
        assert!(reader.is_empty().unwrap());
        let _ = reader.read();
    }
}
