use byteorder::{ByteOrder, LittleEndian};

use crate::CodecError;

pub trait Emit {
    fn emit(&self, w: &mut ByteWriter);
}

/// Growable output buffer. Encoders build the whole file in here and only hand out the bytes once encoding
/// succeeded, so a failed export never leaves a half-written file behind.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16<B: ByteOrder>(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        B::write_u16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_i32<B: ByteOrder>(&mut self, value: i32) {
        let mut bytes = [0u8; 4];
        B::write_i32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_u32<B: ByteOrder>(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        B::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_f32<B: ByteOrder>(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        B::write_f32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a u16 element count, failing when the format can't address that many elements.
    pub fn write_count_u16<B: ByteOrder>(&mut self, count: usize, what: &str) -> Result<(), CodecError> {
        let value = u16::try_from(count).map_err(|_| {
            CodecError::unsupported(format!(
                "{} {} exceed the format limit of {}",
                count,
                what,
                u16::MAX
            ))
        })?;
        self.write_u16::<B>(value);
        Ok(())
    }

    pub fn write_count_u32<B: ByteOrder>(&mut self, count: usize, what: &str) -> Result<(), CodecError> {
        let value = u32::try_from(count).map_err(|_| {
            CodecError::unsupported(format!(
                "{} {} exceed the format limit of {}",
                count,
                what,
                u32::MAX
            ))
        })?;
        self.write_u32::<B>(value);
        Ok(())
    }

    /// Counterpart of `ByteReader::read_prefixed_bytes`.
    pub fn write_prefixed_bytes<B: ByteOrder>(&mut self, bytes: &[u8], what: &str) -> Result<(), CodecError> {
        self.write_count_u16::<B>(bytes.len(), what)?;
        self.write_bytes(bytes);
        Ok(())
    }

    pub fn emit<T: Emit + ?Sized>(&mut self, value: &T) {
        value.emit(self);
    }
}

impl Emit for u8 {
    fn emit(&self, w: &mut ByteWriter) {
        w.write_u8(*self);
    }
}

impl Emit for u16 {
    fn emit(&self, w: &mut ByteWriter) {
        w.write_u16::<LittleEndian>(*self);
    }
}

impl Emit for i32 {
    fn emit(&self, w: &mut ByteWriter) {
        w.write_i32::<LittleEndian>(*self);
    }
}

impl Emit for u32 {
    fn emit(&self, w: &mut ByteWriter) {
        w.write_u32::<LittleEndian>(*self);
    }
}

impl Emit for f32 {
    fn emit(&self, w: &mut ByteWriter) {
        w.write_f32::<LittleEndian>(*self);
    }
}

impl<T: Emit, const N: usize> Emit for [T; N] {
    fn emit(&self, w: &mut ByteWriter) {
        for element in self {
            element.emit(w);
        }
    }
}
