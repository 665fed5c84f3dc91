//! Primitive encoding/decoding for the tagged wire format.
//!
//! Implements the byte cursor, stop-bit integers (LEB128 with zigzag for
//! signed values) and length-prefixed UTF-8.

use crate::error::DecodeError;
use crate::limits::{MAX_STOP_BIT_BYTES, MAX_TEXT_LEN};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives with
/// bounds checking. The slice is the cursor's hard limit: a frame decoder
/// hands out a sub-slice and nested reads can never escape it.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.data.len() - self.pos {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Advances the cursor by n bytes.
    #[inline]
    pub fn skip(&mut self, n: usize, context: &'static str) -> Result<(), DecodeError> {
        if n > self.data.len() - self.pos {
            return Err(DecodeError::UnexpectedEof { context });
        }
        self.pos += n;
        Ok(())
    }

    /// Reads a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2, context)?;
        // SAFETY: read_bytes guarantees exactly 2 bytes, try_into always succeeds
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4, context)?;
        // SAFETY: read_bytes guarantees exactly 4 bytes, try_into always succeeds
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8, context)?;
        // SAFETY: read_bytes guarantees exactly 8 bytes, try_into always succeeds
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self, context: &'static str) -> Result<i16, DecodeError> {
        Ok(self.read_u16(context)? as i16)
    }

    /// Reads a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(self.read_u32(context)? as i32)
    }

    /// Reads a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(self.read_u64(context)? as i64)
    }

    /// Reads a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_u32(context)?))
    }

    /// Reads a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_u64(context)?))
    }

    /// Reads an unsigned stop-bit integer (LEB128).
    #[inline]
    pub fn read_stop_bit(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for i in 0..MAX_STOP_BIT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            // Check for overflow
            if shift >= 64 || (shift == 63 && value > 1) {
                return Err(DecodeError::StopBitOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;

            if i == MAX_STOP_BIT_BYTES - 1 {
                return Err(DecodeError::StopBitTooLong);
            }
        }

        Err(DecodeError::StopBitTooLong)
    }

    /// Reads a signed stop-bit integer (zigzag encoded).
    pub fn read_signed_stop_bit(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        let unsigned = self.read_stop_bit(context)?;
        Ok(zigzag_decode(unsigned))
    }

    /// Reads a stop-bit-length-prefixed UTF-8 string (zero-copy).
    #[inline]
    pub fn read_utf8(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        let len = self.read_stop_bit(field)? as usize;
        if len > MAX_TEXT_LEN {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len,
                max: MAX_TEXT_LEN,
            });
        }
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Skips over a stop-bit-length-prefixed string without validating it.
    pub fn skip_utf8(&mut self, field: &'static str) -> Result<(), DecodeError> {
        let len = self.read_stop_bit(field)? as usize;
        self.skip(len, field)
    }

    /// Reads exactly n bytes as a UTF-8 string (inline string/field forms).
    #[inline]
    pub fn read_utf8_exact(
        &mut self,
        n: usize,
        field: &'static str,
    ) -> Result<&'a str, DecodeError> {
        let bytes = self.read_bytes(n, field)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the current write position (same as [`len`](Self::len)).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i16.
    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    /// Writes a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Writes a little-endian i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    /// Writes a little-endian f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes a little-endian f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Writes an unsigned stop-bit integer (LEB128).
    #[inline]
    pub fn write_stop_bit(&mut self, mut value: u64) {
        // Stack buffer batches the writes (faster than repeated push calls)
        let mut buf = [0u8; MAX_STOP_BIT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a signed stop-bit integer (zigzag encoded).
    pub fn write_signed_stop_bit(&mut self, value: i64) {
        self.write_stop_bit(zigzag_encode(value));
    }

    /// Writes a stop-bit-length-prefixed UTF-8 string.
    pub fn write_utf8(&mut self, s: &str) {
        self.write_stop_bit(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Overwrites 4 bytes at an earlier position with a little-endian u32.
    ///
    /// Used to patch a length placeholder once a block body is complete.
    #[inline]
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Overwrites 8 bytes at an earlier position with a little-endian i64.
    #[inline]
    pub fn patch_i64(&mut self, at: usize, value: i64) {
        self.buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Returns the byte at an earlier position.
    #[inline]
    pub fn byte_at(&self, at: usize) -> u8 {
        self.buf[at]
    }
}

// =============================================================================
// ZIGZAG ENCODING
// =============================================================================

/// Encodes a signed integer using zigzag encoding.
///
/// Maps negative numbers to odd positive numbers:
/// 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Decodes a zigzag-encoded unsigned integer back to signed.
#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_roundtrip() {
        for v in [0i64, 1, -1, 127, -128, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn test_zigzag_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(2), 4);
    }

    #[test]
    fn test_stop_bit_roundtrip() {
        let test_values = [0u64, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_stop_bit(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_stop_bit("test").unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
        }
    }

    #[test]
    fn test_signed_stop_bit_roundtrip() {
        let test_values = [0i64, 1, -1, 127, -128, i64::MAX, i64::MIN];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_signed_stop_bit(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_signed_stop_bit("test").unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
        }
    }

    #[test]
    fn test_utf8_roundtrip() {
        let test_strings = ["", "hello", "hello world", "unicode: \u{1F600}"];

        for s in test_strings {
            let mut writer = Writer::new();
            writer.write_utf8(s);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_utf8("test").unwrap();
            assert_eq!(s, decoded);
        }
    }

    #[test]
    fn test_scalar_roundtrip() {
        let mut writer = Writer::new();
        writer.write_u16(0xBEEF);
        writer.write_i32(-7);
        writer.write_u64(u64::MAX);
        writer.write_f64(1.5);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_u16("test").unwrap(), 0xBEEF);
        assert_eq!(reader.read_i32("test").unwrap(), -7);
        assert_eq!(reader.read_u64("test").unwrap(), u64::MAX);
        assert_eq!(reader.read_f64("test").unwrap(), 1.5);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_stop_bit_too_long() {
        // 11 continuation bytes should fail
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        let result = reader.read_stop_bit("test");
        assert!(matches!(result, Err(DecodeError::StopBitTooLong)));
    }

    #[test]
    fn test_patch_u32() {
        let mut writer = Writer::new();
        writer.write_u32(0); // placeholder
        writer.write_bytes(b"body");
        writer.patch_u32(0, 4);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_u32("test").unwrap(), 4);
        assert_eq!(reader.read_bytes(4, "test").unwrap(), b"body");
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        let result = reader.read_bytes(10, "test");
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));
    }
}
