//! Primitive types.
//!
//! Everything is big-endian. Decoding is budgeted: see [`ReadType`].
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_types>

use std::io::{Read, Write};

use super::traits::{consume, EncodedSize, ReadError, ReadType, WriteError, WriteType};

macro_rules! fixed_width_int {
    ($t:ty, $width:expr) => {
        impl EncodedSize for $t {
            fn encoded_size(&self) -> usize {
                $width
            }
        }

        impl<R: Read> ReadType<R> for $t {
            fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
                let remain = consume(remain, $width)?;
                let mut buf = [0u8; $width];
                reader.read_exact(&mut buf)?;
                Ok((<$t>::from_be_bytes(buf), remain))
            }
        }

        impl<W: Write> WriteType<W> for $t {
            fn write(&self, writer: &mut W) -> Result<(), WriteError> {
                writer.write_all(&self.to_be_bytes())?;
                Ok(())
            }
        }
    };
}

fixed_width_int!(i16, 2);
fixed_width_int!(i32, 4);
fixed_width_int!(i64, 8);

/// Reads `len` bytes of UTF-8, after checking they fit in the budget.
fn read_utf8<R: Read>(reader: &mut R, remain: usize, len: usize) -> Result<(String, usize), ReadError> {
    let remain = consume(remain, len)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    let s = String::from_utf8(buf).map_err(|e| ReadError::Malformed(Box::new(e)))?;
    Ok((s, remain))
}

fn write_str<W: Write>(s: &str, writer: &mut W) -> Result<(), WriteError> {
    let len = i16::try_from(s.len()).map_err(WriteError::Overflow)?;
    len.write(writer)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

// STRING
impl EncodedSize for String {
    fn encoded_size(&self) -> usize {
        2 + self.len()
    }
}

impl<R: Read> ReadType<R> for String {
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (len, remain) = i16::read(reader, remain)?;
        let len = usize::try_from(len).map_err(|e| ReadError::Malformed(Box::new(e)))?;
        read_utf8(reader, remain, len)
    }
}

impl<W: Write> WriteType<W> for String {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        write_str(self, writer)
    }
}

// NULLABLE_STRING
impl EncodedSize for Option<String> {
    fn encoded_size(&self) -> usize {
        2 + self.as_ref().map(String::len).unwrap_or_default()
    }
}

impl<R: Read> ReadType<R> for Option<String> {
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (len, remain) = i16::read(reader, remain)?;

        match len {
            l if l < -1 => Err(ReadError::Malformed(
                format!("Invalid negative length for nullable string: {}", l).into(),
            )),
            -1 => Ok((None, remain)),
            l => {
                let (s, remain) = read_utf8(reader, remain, usize::try_from(l)?)?;
                Ok((Some(s), remain))
            }
        }
    }
}

impl<W: Write> WriteType<W> for Option<String> {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(s) => write_str(s, writer),
            None => (-1i16).write(writer),
        }
    }
}

/// Reads an ARRAY element count.
///
/// A null array (`-1`) reads as empty.
pub fn read_array_len<R: Read>(reader: &mut R, remain: usize) -> Result<(usize, usize), ReadError> {
    let (len, remain) = i32::read(reader, remain)?;
    match len {
        -1 => Ok((0, remain)),
        l if l < -1 => Err(ReadError::Malformed(
            format!("Invalid negative length for array: {}", l).into(),
        )),
        l => Ok((usize::try_from(l)?, remain)),
    }
}

pub fn write_array_len<W: Write>(len: usize, writer: &mut W) -> Result<(), WriteError> {
    i32::try_from(len).map_err(WriteError::Overflow)?.write(writer)
}

// ARRAY
impl<T: EncodedSize> EncodedSize for Vec<T> {
    fn encoded_size(&self) -> usize {
        4 + self.iter().map(EncodedSize::encoded_size).sum::<usize>()
    }
}

impl<R, T> ReadType<R> for Vec<T>
where
    R: Read,
    T: ReadType<R>,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (len, mut remain) = read_array_len(reader, remain)?;

        // every element takes at least one byte, so the budget bounds the allocation
        let mut res = Vec::with_capacity(len.min(remain));
        for _ in 0..len {
            let (item, rest) = T::read(reader, remain)?;
            remain = rest;
            res.push(item);
        }
        Ok((res, remain))
    }
}

impl<W, T> WriteType<W> for Vec<T>
where
    W: Write,
    T: WriteType<W>,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        write_array_len(self.len(), writer)?;
        for item in self {
            item.write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::protocol::test_utils::test_roundtrip;

    use super::*;

    use assert_matches::assert_matches;

    fn encode<T: WriteType<Vec<u8>>>(value: &T) -> Vec<u8> {
        let mut buf = vec![];
        value.write(&mut buf).unwrap();
        buf
    }

    test_roundtrip!(i16, test_int16_roundtrip);

    test_roundtrip!(i32, test_int32_roundtrip);

    test_roundtrip!(i64, test_int64_roundtrip);

    test_roundtrip!(String, test_string_roundtrip);

    test_roundtrip!(Option<String>, test_nullable_string_roundtrip);

    test_roundtrip!(Vec<i32>, test_array_roundtrip);

    test_roundtrip!(Vec<String>, test_string_array_roundtrip);

    #[test]
    fn test_int_boundaries() {
        for v in [i16::MIN, -1, 0, 1, i16::MAX] {
            let data = encode(&v);
            assert_eq!(data.len(), 2);
            assert_eq!(i16::read(&mut Cursor::new(data), 2).unwrap(), (v, 0));
        }
        for v in [i32::MIN, -1, 0, 1, i32::MAX] {
            let data = encode(&v);
            assert_eq!(data.len(), 4);
            assert_eq!(i32::read(&mut Cursor::new(data), 4).unwrap(), (v, 0));
        }
        for v in [i64::MIN, -2, -1, 0, 1, i64::MAX] {
            let data = encode(&v);
            assert_eq!(data.len(), 8);
            assert_eq!(i64::read(&mut Cursor::new(data), 8).unwrap(), (v, 0));
        }
    }

    #[test]
    fn test_big_endian() {
        assert_eq!(encode(&0x0102i16), vec![0x01, 0x02]);
        assert_eq!(encode(&-2i32), vec![0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(
            encode(&0x0102030405060708i64),
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn test_int_underflow() {
        let mut buf = Cursor::new(vec![0u8; 8]);

        let err = i64::read(&mut buf, 7).unwrap_err();
        assert_matches!(err, ReadError::Underflow { need: 8, remain: 7 });

        // the reader must not have been touched
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_budget_is_decremented() {
        let data = encode(&String::from("abc"));
        let (s, remain) = String::read(&mut Cursor::new(data), 10).unwrap();
        assert_eq!(s, "abc");
        assert_eq!(remain, 5);
    }

    #[test]
    fn test_null_string_encoding() {
        let none: Option<String> = None;
        assert_eq!(encode(&none), vec![0xFF, 0xFF]);
        assert_eq!(none.encoded_size(), 2);

        let empty = Some(String::new());
        assert_eq!(encode(&empty), vec![0x00, 0x00]);

        let (restored, remain) =
            Option::<String>::read(&mut Cursor::new(vec![0xFF, 0xFF]), 2).unwrap();
        assert_eq!(restored, None);
        assert_eq!(remain, 0);
    }

    #[test]
    fn test_string_rejects_null() {
        let err = String::read(&mut Cursor::new(vec![0xFF, 0xFF]), 2).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
    }

    #[test]
    fn test_nullable_string_read_negative_length() {
        let data = encode(&-2i16);

        let err = Option::<String>::read(&mut Cursor::new(data), 2).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
        assert_eq!(
            err.to_string(),
            "Malformed data: Invalid negative length for nullable string: -2",
        );
    }

    #[test]
    fn test_string_blowup_memory() {
        // the length claims far more than the frame holds
        let data = encode(&i16::MAX);

        let err = String::read(&mut Cursor::new(data), 16).unwrap_err();
        assert_matches!(err, ReadError::Underflow { .. });
    }

    #[test]
    fn test_string_invalid_utf8() {
        let data = vec![0x00, 0x02, 0xC3, 0x28];
        let err = String::read(&mut Cursor::new(data), 4).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
    }

    #[test]
    fn test_array_blowup_memory() {
        let data = encode(&i32::MAX);

        let err = Vec::<i64>::read(&mut Cursor::new(data), 4 + 16).unwrap_err();
        assert_matches!(err, ReadError::IO(_) | ReadError::Underflow { .. });
    }

    #[test]
    fn test_array_element_exceeds_budget() {
        let data = encode(&vec![1i32, 2, 3]);
        assert_eq!(data.len(), 16);

        // frame claims one element less than the array holds
        let err = Vec::<i32>::read(&mut Cursor::new(data), 12).unwrap_err();
        assert_matches!(err, ReadError::Underflow { need: 4, remain: 0 });
    }

    #[test]
    fn test_null_array_reads_empty() {
        let data = encode(&-1i32);
        let (restored, remain) = Vec::<i32>::read(&mut Cursor::new(data), 4).unwrap();
        assert!(restored.is_empty());
        assert_eq!(remain, 0);
    }

    #[test]
    fn test_array_read_negative_length() {
        let data = encode(&-3i32);
        let err = Vec::<i32>::read(&mut Cursor::new(data), 4).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
    }

    #[test]
    fn test_string_too_long_to_write() {
        let s = "x".repeat(i16::MAX as usize + 1);
        let err = s.write(&mut Vec::new()).unwrap_err();
        assert_matches!(err, WriteError::Overflow(_));
    }
}
