use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::common::policy::Validator;
use crate::{CodecError, Violation};

pub trait Parseable<T> {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<T, CodecError>;
}

/// Forward-only cursor over an in-memory file. Every read is bounds checked up front, so running past the end
/// surfaces as [`CodecError::TruncatedData`] with the offset where the read started.
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader {
            cursor: Cursor::new(data),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<(), CodecError> {
        if needed > self.remaining() {
            return Err(CodecError::TruncatedData {
                offset: self.position(),
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u16<B: ByteOrder>(&mut self) -> Result<u16, CodecError> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<B>()?)
    }

    pub fn read_i32<B: ByteOrder>(&mut self) -> Result<i32, CodecError> {
        self.ensure(4)?;
        Ok(self.cursor.read_i32::<B>()?)
    }

    pub fn read_u32<B: ByteOrder>(&mut self) -> Result<u32, CodecError> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<B>()?)
    }

    pub fn read_f32<B: ByteOrder>(&mut self) -> Result<f32, CodecError> {
        self.ensure(4)?;
        Ok(self.cursor.read_f32::<B>()?)
    }

    /// Looks at the next `count` bytes without advancing.
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8], CodecError> {
        self.ensure(count)?;
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        Ok(&data[start..start + count])
    }

    pub fn peek_u16<B: ByteOrder>(&self) -> Result<u16, CodecError> {
        Ok(B::read_u16(self.peek_bytes(2)?))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        let bytes = self.peek_bytes(count)?;
        self.cursor.set_position((self.position() + count) as u64);
        Ok(bytes)
    }

    /// Magic values identify the file type, so a mismatch is never recoverable.
    pub fn read_magic(&mut self, expected: &[u8; 4]) -> Result<(), CodecError> {
        let offset = self.position();
        let magic = self.read_bytes(4)?;
        if magic != expected {
            return Err(CodecError::BadMagicOrVersion(Violation::at(
                offset,
                format!(
                    "expected magic {:?}, found {:?}",
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(magic)
                ),
            )));
        }
        Ok(())
    }

    /// Fails with [`CodecError::Overflow`] when `count` records of `element_size` bytes can't possibly fit into the
    /// rest of the buffer. `prefix_offset` is where the count itself was read from.
    pub fn check_count(&self, prefix_offset: usize, count: usize, element_size: usize) -> Result<(), CodecError> {
        let declared = count.saturating_mul(element_size);
        if declared > self.remaining() {
            return Err(CodecError::Overflow {
                offset: prefix_offset,
                declared,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// A u16 length prefix followed by that many bytes.
    pub fn read_prefixed_bytes<B: ByteOrder>(&mut self) -> Result<&'a [u8], CodecError> {
        let prefix_offset = self.position();
        let len = self.read_u16::<B>()? as usize;
        self.check_count(prefix_offset, len, 1)?;
        self.read_bytes(len)
    }

    /// Reads `count` records, after checking that at least `min_element_size * count` bytes are left. This keeps
    /// corrupt counts from turning into huge allocations.
    pub fn read_vec<T: Parseable<T>>(
        &mut self,
        prefix_offset: usize,
        count: usize,
        min_element_size: usize,
    ) -> Result<Vec<T>, CodecError> {
        self.check_count(prefix_offset, count, min_element_size)?;
        let mut list = Vec::with_capacity(count);
        for _ in 0..count {
            list.push(T::parse(self)?);
        }
        Ok(list)
    }

    pub fn parse<T: Parseable<T>>(&mut self) -> Result<T, CodecError> {
        T::parse(self)
    }
}

/// u16 length prefixed UTF-8 name. Invalid encodings are a format violation, recovered as an empty name.
pub fn read_name(rdr: &mut ByteReader<'_>, validator: &mut Validator) -> Result<String, CodecError> {
    let offset = rdr.position();
    let bytes = rdr.read_prefixed_bytes::<LittleEndian>()?;
    match std::str::from_utf8(bytes) {
        Ok(name) => Ok(name.to_owned()),
        Err(err) => {
            validator.violation(offset, format!("name is not valid UTF-8 ({})", err))?;
            Ok(String::new())
        }
    }
}

impl Parseable<u8> for u8 {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<u8, CodecError> {
        rdr.read_u8()
    }
}

impl Parseable<u16> for u16 {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<u16, CodecError> {
        rdr.read_u16::<LittleEndian>()
    }
}

impl Parseable<i32> for i32 {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<i32, CodecError> {
        rdr.read_i32::<LittleEndian>()
    }
}

impl Parseable<u32> for u32 {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<u32, CodecError> {
        rdr.read_u32::<LittleEndian>()
    }
}

impl Parseable<f32> for f32 {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<f32, CodecError> {
        rdr.read_f32::<LittleEndian>()
    }
}

impl<T: Parseable<T> + Copy + Default, const N: usize> Parseable<[T; N]> for [T; N] {
    fn parse(rdr: &mut ByteReader<'_>) -> Result<[T; N], CodecError> {
        let mut array = [T::default(); N];
        for element in array.iter_mut() {
            *element = T::parse(rdr)?;
        }
        Ok(array)
    }
}
