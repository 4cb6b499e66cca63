use std::mem::size_of;

/// A fixed-size value stored verbatim in a stream file.
///
/// The on-disk format is the flat array of records in file order;
/// [`Record::SIZE`] is the exact width of one record, and seeks are
/// computed as `record_index * SIZE`. Integer and float primitives are
/// stored little-endian; `[u8; N]` records are stored as-is.
pub trait Record: Copy {
    const SIZE: usize;

    /// Decodes one record from exactly [`Record::SIZE`] bytes.
    fn decode(bytes: &[u8]) -> Self;

    /// Encodes this record into exactly [`Record::SIZE`] bytes.
    fn encode(&self, out: &mut [u8]);
}

macro_rules! primitive_record {
    ($($ty:ty),* $(,)?) => {$(
        impl Record for $ty {
            const SIZE: usize = size_of::<$ty>();

            fn decode(bytes: &[u8]) -> Self {
                Self::from_le_bytes(bytes.try_into().expect("record width"))
            }

            fn encode(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

primitive_record!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

impl<const N: usize> Record for [u8; N] {
    const SIZE: usize = N;

    fn decode(bytes: &[u8]) -> Self {
        bytes.try_into().expect("record width")
    }

    fn encode(&self, out: &mut [u8]) {
        out.copy_from_slice(self);
    }
}

#[cfg(test)]
mod tests {
    use super::Record;

    #[test]
    fn integers_round_trip_little_endian() {
        let mut out = [0u8; 4];
        0x0102_0304u32.encode(&mut out);
        assert_eq!(out, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(u32::decode(&out), 0x0102_0304);

        let mut out = [0u8; 8];
        (-7i64).encode(&mut out);
        assert_eq!(i64::decode(&out), -7);
    }

    #[test]
    fn byte_arrays_are_verbatim() {
        let key = *b"0123456789abcdef";
        let mut out = [0u8; 16];
        key.encode(&mut out);
        assert_eq!(out, key);
        assert_eq!(<[u8; 16]>::decode(&out), key);
    }
}
