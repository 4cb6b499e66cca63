use std::fs::File;
use std::path::Path;

use log::error;

use crate::error::Result;
use crate::io;
use crate::record::Record;
use crate::DEFAULT_BUFFER_BYTES;

/// A buffered, append-only writer of fixed-size records.
///
/// Records accumulate in memory and reach the file one full buffer at a
/// time. The final short batch is flushed when the writer is finished or
/// dropped; call [`StreamWriter::finish`] to observe flush failures
/// instead of leaving them to `Drop`.
pub struct StreamWriter<T: Record> {
    file: File,
    buf: Vec<T>,
    scratch: Vec<u8>,
    capacity: usize,
}

impl<T: Record> StreamWriter<T> {
    /// Creates (or truncates) `path` with the default 4 MiB buffer
    /// budget.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffer_bytes(path, DEFAULT_BUFFER_BYTES)
    }

    /// Creates (or truncates) `path` with a buffer of
    /// `buf_bytes / T::SIZE` records (at least one).
    pub fn with_buffer_bytes(path: impl AsRef<Path>, buf_bytes: usize) -> Result<Self> {
        assert!(T::SIZE > 0, "zero-size records cannot be streamed");
        let file = io::open_for_write(path.as_ref())?;
        let capacity = (buf_bytes / T::SIZE).max(1);
        Ok(StreamWriter {
            file,
            buf: Vec::with_capacity(capacity),
            scratch: Vec::new(),
            capacity,
        })
    }

    /// Number of records one batch can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends one record, flushing the batch once it fills.
    pub fn write(&mut self, record: T) -> Result<()> {
        self.buf.push(record);
        if self.buf.len() == self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Flushes the final short batch and consumes the writer.
    ///
    /// Dropping the writer flushes too, but a failure there can only be
    /// logged; `finish` is the path that reports it.
    pub fn finish(mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        io::write_records(&mut self.file, &self.buf, &mut self.scratch)?;
        self.buf.clear();
        Ok(())
    }
}

impl<T: Record> Drop for StreamWriter<T> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("dropping {} unflushed records: {}", self.buf.len(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::StreamReader;

    #[test]
    fn full_batches_reach_disk_before_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batches.bin");
        let mut writer = StreamWriter::with_buffer_bytes(&path, 4 * 4).unwrap();
        for x in 0u32..8 {
            writer.write(x).unwrap();
        }
        // two full batches flushed by now, none pending
        let mut reader = StreamReader::<u32>::open(&path).unwrap();
        for expect in 0..8 {
            assert!(!reader.is_empty().unwrap());
            assert_eq!(reader.read().unwrap(), expect);
        }
        writer.finish().unwrap();
    }
}
