//! Buffered fixed-record file streams for external-memory algorithms.
//!
//! A stream file is a flat array of fixed-size records with no header,
//! footer, or delimiters. [`StreamReader`] scans such a file forward or
//! backward and serves absolute-index random access; [`StreamWriter`]
//! appends records and flushes full batches. Both amortize one bulk file
//! operation over a whole buffer of records, so a sequential pass costs
//! O(1) file I/O per record.

pub use error::{Error, Result};
pub use reader::StreamReader;
pub use record::Record;
pub use writer::StreamWriter;

pub mod error;
mod io;
pub mod reader;
pub mod record;
pub mod writer;

/// Default buffer byte budget for readers and writers (4 MiB).
pub const DEFAULT_BUFFER_BYTES: usize = 4 << 20;
