//! File-open and bulk record transfer primitives consumed by the streams.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::record::Record;

pub(crate) fn open_for_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn open_for_write(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads up to `max` records from the current position of `source` into
/// `dst`, replacing its contents. Loops on short reads and retries
/// interrupted ones, so the result is smaller than `max` only at
/// end-of-file. A trailing fragment shorter than one record is ignored.
pub(crate) fn read_records<T: Record>(
    source: &mut impl Read,
    max: usize,
    scratch: &mut Vec<u8>,
    dst: &mut Vec<T>,
) -> Result<usize> {
    scratch.resize(max * T::SIZE, 0);
    let mut bytes = 0;
    while bytes < scratch.len() {
        match source.read(&mut scratch[bytes..]) {
            Ok(0) => break,
            Ok(n) => bytes += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    dst.clear();
    dst.extend(scratch[..bytes].chunks_exact(T::SIZE).map(T::decode));
    Ok(dst.len())
}

/// Writes every record in `src` at the current position of `file`.
/// `write_all` turns a short write into an error, so no record is ever
/// silently dropped.
pub(crate) fn write_records<T: Record>(
    file: &mut File,
    src: &[T],
    scratch: &mut Vec<u8>,
) -> Result<()> {
    scratch.resize(src.len() * T::SIZE, 0);
    for (record, out) in src.iter().zip(scratch.chunks_exact_mut(T::SIZE)) {
        record.encode(out);
    }
    file.write_all(scratch)?;
    Ok(())
}
