//! Value encoding/decoding for the tagged wire format.
//!
//! [`BinaryWriter`] emits tag + payload for every value, either at canonical
//! full width (fixed mode, rewritable in place) or using the narrowest
//! representation that round-trips exactly (adaptive mode). [`BinaryReader`]
//! reads one tag, dispatches strictly by category and fails deterministically
//! when the tag does not match the requested type.

use uuid::Uuid;

use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_BLOCK_LEN, MAX_INLINE_LEN};
use crate::tag::{Category, category, codes};

/// Encoding mode flags, fixed for a codec instance's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireConfig {
    /// Write every scalar at its full canonical width so it can be
    /// rewritten in place later.
    pub fixed: bool,
    /// Write field identifiers as numeric codes instead of names.
    pub numeric_fields: bool,
    /// Write no field identifiers at all; values are purely positional.
    pub field_less: bool,
}

const POW10: [i64; 7] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
];

// =============================================================================
// ENCODING
// =============================================================================

/// Tagged-value encoder over a growable byte buffer.
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    pub(crate) out: Writer,
    pub(crate) config: WireConfig,
}

impl BinaryWriter {
    /// Creates an adaptive, named-field writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with an explicit configuration.
    pub fn with_config(config: WireConfig) -> Self {
        Self {
            out: Writer::new(),
            config,
        }
    }

    /// Returns this writer's configuration.
    pub fn config(&self) -> WireConfig {
        self.config
    }

    /// Returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.out.into_bytes()
    }

    /// Returns a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Returns the current write position.
    pub fn position(&self) -> usize {
        self.out.position()
    }

    #[inline]
    fn write_code(&mut self, code: u8) {
        self.out.write_byte(code);
    }

    /// Writes a boolean; `None` encodes the explicit null marker.
    pub fn write_bool(&mut self, flag: Option<bool>) {
        self.write_code(match flag {
            None => codes::NULL,
            Some(false) => codes::FALSE,
            Some(true) => codes::TRUE,
        });
    }

    /// Writes a signed 64-bit integer.
    pub fn write_i64(&mut self, v: i64) {
        if self.config.fixed {
            self.write_code(codes::INT64);
            self.out.write_i64(v);
        } else {
            self.write_int_adaptive(v);
        }
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, v: i32) {
        if self.config.fixed {
            self.write_code(codes::INT32);
            self.out.write_i32(v);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes a signed 16-bit integer.
    pub fn write_i16(&mut self, v: i16) {
        if self.config.fixed {
            self.write_code(codes::INT16);
            self.out.write_i16(v);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes a signed 8-bit integer.
    pub fn write_i8(&mut self, v: i8) {
        if self.config.fixed {
            self.write_code(codes::INT8);
            self.out.write_byte(v as u8);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes an unsigned 8-bit integer.
    pub fn write_u8(&mut self, v: u8) {
        if self.config.fixed {
            self.write_code(codes::UINT8);
            self.out.write_byte(v);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes an unsigned 16-bit integer.
    pub fn write_u16(&mut self, v: u16) {
        if self.config.fixed {
            self.write_code(codes::UINT16);
            self.out.write_u16(v);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, v: u32) {
        if self.config.fixed {
            self.write_code(codes::UINT32);
            self.out.write_u32(v);
        } else {
            self.write_int_adaptive(v as i64);
        }
    }

    /// Writes a 64-bit float.
    pub fn write_f64(&mut self, v: f64) {
        if self.config.fixed {
            self.write_code(codes::FLOAT64);
            self.out.write_f64(v);
        } else {
            self.write_float_adaptive(v);
        }
    }

    /// Writes a 32-bit float.
    pub fn write_f32(&mut self, v: f32) {
        if self.config.fixed {
            self.write_code(codes::FLOAT32);
            self.out.write_f32(v);
        } else {
            self.write_float_adaptive(v as f64);
        }
    }

    /// Adaptive integer rule, part of the wire contract: inline 0-127,
    /// smallest signed width for negatives, smallest unsigned width for
    /// positives, INT64 for the rest. Two independent encoders given the
    /// same value must emit identical bytes.
    fn write_int_adaptive(&mut self, v: i64) {
        if v < i32::MIN as i64 {
            self.write_code(codes::INT64);
            self.out.write_i64(v);
        } else if v < i16::MIN as i64 {
            self.write_code(codes::INT32);
            self.out.write_i32(v as i32);
        } else if v < i8::MIN as i64 {
            self.write_code(codes::INT16);
            self.out.write_i16(v as i16);
        } else if v < 0 {
            self.write_code(codes::INT8);
            self.out.write_byte(v as u8);
        } else if v < 128 {
            self.out.write_byte(v as u8);
        } else if v < 1 << 8 {
            self.write_code(codes::UINT8);
            self.out.write_byte(v as u8);
        } else if v < 1 << 16 {
            self.write_code(codes::UINT16);
            self.out.write_u16(v as u16);
        } else if v < 1 << 32 {
            self.write_code(codes::UINT32);
            self.out.write_u32(v as u32);
        } else {
            self.write_code(codes::INT64);
            self.out.write_i64(v);
        }
    }

    /// Adaptive float rule: integral values in [-2^31, 2^32) collapse to
    /// the integer rule; otherwise FLOAT32 whenever the value round-trips
    /// exactly through f32, else FLOAT64. The f32 preference is a
    /// deliberate size/precision trade-off baked into the wire format.
    fn write_float_adaptive(&mut self, d: f64) {
        if d >= -(1i64 << 31) as f64 && d < (1i64 << 32) as f64 {
            let l = d as i64;
            if l as f64 == d {
                self.write_int_adaptive(l);
                return;
            }
        }
        let f = d as f32;
        if f as f64 == d {
            self.write_code(codes::FLOAT32);
            self.out.write_f32(f);
        } else {
            self.write_code(codes::FLOAT64);
            self.out.write_f64(d);
        }
    }

    /// Writes a string; `None` encodes the explicit null marker.
    ///
    /// Strings whose UTF-8 encoding is at most 31 bytes use the inline
    /// form with the length in the tag's low 5 bits.
    pub fn write_text(&mut self, s: Option<&str>) {
        match s {
            None => self.write_code(codes::NULL),
            Some(s) if s.len() <= MAX_INLINE_LEN => {
                self.write_code(codes::STRING0 + s.len() as u8);
                self.out.write_bytes(s.as_bytes());
            }
            Some(s) => {
                self.write_code(codes::STRING_ANY);
                self.out.write_utf8(s);
            }
        }
    }

    /// Writes a raw byte array behind a length prefix.
    pub fn write_u8_array(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        // the prefix covers the U8_ARRAY code byte as well
        self.write_len_prefix(bytes.len() + 1)?;
        self.write_code(codes::U8_ARRAY);
        self.out.write_bytes(bytes);
        Ok(())
    }

    /// Writes an 8/16/32-bit length prefix, smallest that fits.
    fn write_len_prefix(&mut self, len: usize) -> Result<(), EncodeError> {
        if len < 1 << 8 {
            self.write_code(codes::BYTES_LENGTH8);
            self.out.write_byte(len as u8);
        } else if len < 1 << 16 {
            self.write_code(codes::BYTES_LENGTH16);
            self.out.write_u16(len as u16);
        } else if len <= MAX_BLOCK_LEN {
            self.write_code(codes::BYTES_LENGTH32);
            self.out.write_u32(len as u32);
        } else {
            return Err(EncodeError::BlockLengthOutOfRange { len });
        }
        Ok(())
    }

    /// Writes a nested block (record or sequence body).
    ///
    /// Reserves a 32-bit length placeholder, runs the body closure, then
    /// patches the placeholder. Bodies longer than 32 bits are fatal.
    pub fn write_block<F>(&mut self, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        self.write_code(codes::BYTES_LENGTH32);
        let at = self.out.position();
        self.out.write_u32(0);
        body(self)?;
        let len = self.out.position() - at - 4;
        if len > MAX_BLOCK_LEN {
            return Err(EncodeError::BlockLengthOutOfRange { len });
        }
        self.out.patch_u32(at, len as u32);
        Ok(())
    }

    /// Writes a UUID as tag + two little-endian u64 halves.
    pub fn write_uuid(&mut self, uuid: Uuid) {
        self.write_code(codes::UUID);
        let (hi, lo) = uuid.as_u64_pair();
        self.out.write_u64(hi);
        self.out.write_u64(lo);
    }

    /// Writes a type-name marker.
    pub fn write_type(&mut self, name: &str) {
        self.write_code(codes::TYPE);
        self.out.write_utf8(name);
    }

    /// Writes a local time as its ISO-8601 text form.
    ///
    /// Temporal values go on the wire as tagged text; this crate does not
    /// parse or validate the representation.
    pub fn write_time(&mut self, text: &str) {
        self.write_code(codes::TIME);
        self.out.write_utf8(text);
    }

    /// Writes a date as its ISO-8601 text form.
    pub fn write_date(&mut self, text: &str) {
        self.write_code(codes::DATE);
        self.out.write_utf8(text);
    }

    /// Writes a zoned date-time as its ISO-8601 text form.
    pub fn write_zoned_date_time(&mut self, text: &str) {
        self.write_code(codes::ZONED_DATE_TIME);
        self.out.write_utf8(text);
    }

    /// Writes a diagnostic comment. Value reads skip comments transparently.
    pub fn write_comment(&mut self, text: &str) {
        self.write_code(codes::COMMENT);
        self.out.write_utf8(text);
    }

    /// Writes an encoder hint. Hints are skipped by reads and dropped by
    /// transcoding.
    pub fn write_hint(&mut self, text: &str) {
        self.write_code(codes::HINT);
        self.out.write_utf8(text);
    }

    /// Writes `n` bytes of padding.
    pub fn add_padding(&mut self, n: usize) {
        if n >= 5 {
            self.write_code(codes::PADDING32);
            self.out.write_u32((n - 5) as u32);
            for _ in 0..n - 5 {
                self.out.write_byte(0);
            }
        } else {
            for _ in 0..n {
                self.write_code(codes::PADDING);
            }
        }
    }

    /// Rewrites a fixed-width INT64 previously written at `at`.
    ///
    /// `at` must be the position returned by [`position`](Self::position)
    /// just before the original [`write_i64`](Self::write_i64) in fixed
    /// mode.
    ///
    /// # Panics
    /// Panics if the byte at `at` is not the INT64 tag.
    pub fn rewrite_i64(&mut self, at: usize, v: i64) {
        assert_eq!(self.out.byte_at(at), codes::INT64, "not a fixed INT64 site");
        self.out.patch_i64(at + 1, v);
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Tagged-value decoder over a borrowed byte slice (zero-copy).
///
/// The slice bounds every read: a frame decoder passes the frame body and
/// nested reads can never escape it.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    pub(crate) cur: Reader<'a>,
    pub(crate) config: WireConfig,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader over encoded bytes with the default configuration.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, WireConfig::default())
    }

    /// Creates a reader with an explicit configuration.
    pub fn with_config(data: &'a [u8], config: WireConfig) -> Self {
        Self {
            cur: Reader::new(data),
            config,
        }
    }

    /// Returns this reader's configuration.
    pub fn config(&self) -> WireConfig {
        self.config
    }

    /// Returns the number of remaining bytes.
    pub fn remaining(&self) -> usize {
        self.cur.remaining()
    }

    /// Returns true if all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.cur.is_empty()
    }

    /// Returns the next tag byte without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.cur.peek_byte()
    }

    #[inline]
    pub(crate) fn skip_tag(&mut self) {
        // peeked already; cannot fail
        let _ = self.cur.skip(1, "tag");
    }

    /// Skips a run of non-value markers: padding, comments and hints.
    ///
    /// Writers may interleave these freely; consumers never see them.
    pub fn consume_special(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.peek_tag() {
                Some(codes::PADDING) => self.skip_tag(),
                Some(codes::PADDING32) => {
                    self.skip_tag();
                    let n = self.cur.read_u32("padding run")? as usize;
                    self.cur.skip(n, "padding run")?;
                }
                Some(codes::COMMENT) | Some(codes::HINT) => {
                    self.skip_tag();
                    self.cur.skip_utf8("comment")?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Reads a boolean. `NULL` decodes as `None`, distinct from false.
    pub fn read_bool(&mut self) -> Result<Option<bool>, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte("bool")?;
        match tag {
            codes::NULL => Ok(None),
            codes::FALSE => Ok(Some(false)),
            codes::TRUE => Ok(Some(true)),
            _ => Err(DecodeError::UnexpectedTag {
                expected: "bool",
                tag,
            }),
        }
    }

    /// Reads a signed 64-bit integer.
    ///
    /// Accepts inline small integers, every explicit integer width, float
    /// forms (truncated) and `FALSE`/`TRUE` coerced to 0/1.
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte("int")?;
        if tag < 0x80 {
            return Ok(tag as i64);
        }
        match category(tag) {
            Category::Int => self.read_int_body(tag),
            Category::Float => Ok(self.read_float_body(tag)? as i64),
            Category::Special => match tag {
                codes::FALSE => Ok(0),
                codes::TRUE => Ok(1),
                _ => Err(DecodeError::UnexpectedTag {
                    expected: "int",
                    tag,
                }),
            },
            _ => Err(DecodeError::UnexpectedTag {
                expected: "int",
                tag,
            }),
        }
    }

    /// Reads a 64-bit float.
    ///
    /// Accepts inline small integers, float forms, integer forms widened
    /// exactly and `FALSE`/`TRUE` coerced to 0.0/1.0.
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte("float")?;
        if tag < 0x80 {
            return Ok(tag as f64);
        }
        match category(tag) {
            Category::Float => self.read_float_body(tag),
            Category::Int => Ok(self.read_int_body(tag)? as f64),
            Category::Special => match tag {
                codes::FALSE => Ok(0.0),
                codes::TRUE => Ok(1.0),
                _ => Err(DecodeError::UnexpectedTag {
                    expected: "float",
                    tag,
                }),
            },
            _ => Err(DecodeError::UnexpectedTag {
                expected: "float",
                tag,
            }),
        }
    }

    /// Decodes the payload of an INT-category tag whose tag byte has
    /// already been consumed.
    pub(crate) fn read_int_body(&mut self, tag: u8) -> Result<i64, DecodeError> {
        match tag {
            codes::INT8 => Ok(self.cur.read_byte("int8")? as i8 as i64),
            codes::INT16 => Ok(self.cur.read_i16("int16")? as i64),
            codes::INT32 => Ok(self.cur.read_i32("int32")? as i64),
            codes::INT64 => self.cur.read_i64("int64"),
            codes::UINT8 => Ok(self.cur.read_byte("uint8")? as i64),
            codes::UINT16 => Ok(self.cur.read_u16("uint16")? as i64),
            codes::UINT32 => Ok(self.cur.read_u32("uint32")? as i64),
            codes::INT_STOP_6..=codes::STOP_BIT => {
                let scale = POW10[(codes::STOP_BIT - tag) as usize];
                let raw = self.cur.read_signed_stop_bit("stop-bit int")?;
                raw.checked_mul(scale).ok_or(DecodeError::ScaledOverflow)
            }
            // UUID and UTF8 live in this category but are not integers
            _ => Err(DecodeError::Unsupported { tag }),
        }
    }

    /// Decodes the payload of a FLOAT-category tag whose tag byte has
    /// already been consumed.
    pub(crate) fn read_float_body(&mut self, tag: u8) -> Result<f64, DecodeError> {
        match tag {
            codes::FLOAT32 => Ok(self.cur.read_f32("float32")? as f64),
            codes::FLOAT64 => self.cur.read_f64("float64"),
            codes::FLOAT_STOP_1..=codes::FLOAT_STOP_6 => {
                let digits = (tag - codes::FLOAT32 - 1) as i32;
                let raw = self.cur.read_signed_stop_bit("stop-bit float")?;
                Ok(raw as f64 / 10f64.powi(digits))
            }
            _ => Err(DecodeError::Unsupported { tag }),
        }
    }

    /// Reads a string (zero-copy). `NULL` decodes as `None`.
    pub fn read_text(&mut self) -> Result<Option<&'a str>, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte("text")?;
        match tag {
            codes::NULL => Ok(None),
            codes::STRING_ANY => Ok(Some(self.cur.read_utf8("text")?)),
            _ if category(tag) == Category::Str => {
                let len = (tag & 0x1F) as usize;
                Ok(Some(self.cur.read_utf8_exact(len, "text")?))
            }
            _ => Err(DecodeError::UnexpectedTag {
                expected: "text",
                tag,
            }),
        }
    }

    /// Reads a raw byte array (zero-copy).
    pub fn read_u8_array(&mut self) -> Result<&'a [u8], DecodeError> {
        self.consume_special()?;
        let len = match self.read_len_prefix()? {
            Some(len) => len,
            None => {
                let tag = self.peek_tag().ok_or(DecodeError::UnexpectedEof {
                    context: "byte array",
                })?;
                return Err(DecodeError::UnexpectedTag {
                    expected: "byte array length prefix",
                    tag,
                });
            }
        };
        if len == 0 {
            return Err(DecodeError::UnexpectedEof {
                context: "byte array code",
            });
        }
        let tag = self.cur.read_byte("byte array code")?;
        if tag != codes::U8_ARRAY {
            return Err(DecodeError::UnexpectedTag {
                expected: "byte array",
                tag,
            });
        }
        self.cur.read_bytes(len - 1, "byte array")
    }

    /// Reads an 8/16/32-bit length prefix if one is next in the stream.
    pub fn read_len_prefix(&mut self) -> Result<Option<usize>, DecodeError> {
        match self.peek_tag() {
            Some(codes::BYTES_LENGTH8) => {
                self.skip_tag();
                Ok(Some(self.cur.read_byte("length prefix")? as usize))
            }
            Some(codes::BYTES_LENGTH16) => {
                self.skip_tag();
                Ok(Some(self.cur.read_u16("length prefix")? as usize))
            }
            Some(codes::BYTES_LENGTH32) => {
                self.skip_tag();
                Ok(Some(self.cur.read_u32("length prefix")? as usize))
            }
            _ => Ok(None),
        }
    }

    /// Reads a nested block through a bounded sub-reader.
    ///
    /// The parent cursor is advanced past the whole block before the body
    /// is parsed, so a decode error inside the block cannot leave the
    /// cursor in an inconsistent bounded state.
    pub fn read_block<T, F>(&mut self, body: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut BinaryReader<'a>) -> Result<T, DecodeError>,
    {
        self.consume_special()?;
        let len = match self.read_len_prefix()? {
            Some(len) => len,
            None => {
                let tag = self.peek_tag().ok_or(DecodeError::UnexpectedEof {
                    context: "block",
                })?;
                return Err(DecodeError::UnexpectedTag {
                    expected: "block length prefix",
                    tag,
                });
            }
        };
        let bytes = self.cur.read_bytes(len, "block body")?;
        let mut sub = BinaryReader::with_config(bytes, self.config);
        body(&mut sub)
    }

    /// Reads a UUID.
    pub fn read_uuid(&mut self) -> Result<Uuid, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte("uuid")?;
        if tag != codes::UUID {
            return Err(DecodeError::UnexpectedTag {
                expected: "uuid",
                tag,
            });
        }
        let hi = self.cur.read_u64("uuid")?;
        let lo = self.cur.read_u64("uuid")?;
        Ok(Uuid::from_u64_pair(hi, lo))
    }

    /// Reads a type-name marker (zero-copy).
    pub fn read_type_name(&mut self) -> Result<&'a str, DecodeError> {
        self.read_tagged_text(codes::TYPE, "type name")
    }

    /// Reads a local time's text form.
    pub fn read_time(&mut self) -> Result<&'a str, DecodeError> {
        self.read_tagged_text(codes::TIME, "time")
    }

    /// Reads a date's text form.
    pub fn read_date(&mut self) -> Result<&'a str, DecodeError> {
        self.read_tagged_text(codes::DATE, "date")
    }

    /// Reads a zoned date-time's text form.
    pub fn read_zoned_date_time(&mut self) -> Result<&'a str, DecodeError> {
        self.read_tagged_text(codes::ZONED_DATE_TIME, "zoned date-time")
    }

    fn read_tagged_text(
        &mut self,
        code: u8,
        expected: &'static str,
    ) -> Result<&'a str, DecodeError> {
        self.consume_special()?;
        let tag = self.cur.read_byte(expected)?;
        if tag != code {
            return Err(DecodeError::UnexpectedTag { expected, tag });
        }
        self.cur.read_utf8(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_i64(bytes: &[u8]) -> i64 {
        BinaryReader::new(bytes).read_i64().unwrap()
    }

    #[test]
    fn test_int_roundtrip() {
        for v in [
            0i64,
            1,
            -1,
            127,
            128,
            255,
            256,
            65535,
            65536,
            -128,
            -129,
            -32768,
            -32769,
            (1 << 32) - 1,
            1 << 32,
            i64::MAX,
            i64::MIN,
        ] {
            let mut w = BinaryWriter::new();
            w.write_i64(v);
            assert_eq!(decode_i64(w.as_bytes()), v, "failed for {}", v);
        }
    }

    #[test]
    fn test_adaptive_minimality() {
        // 0-127 inline: tag byte is the value
        let mut w = BinaryWriter::new();
        w.write_i64(127);
        assert_eq!(w.as_bytes(), &[0x7F]);

        // 128 takes the unsigned 8-bit form
        let mut w = BinaryWriter::new();
        w.write_i64(128);
        assert_eq!(w.as_bytes(), &[codes::UINT8, 0x80]);

        // -1 takes the signed 8-bit form
        let mut w = BinaryWriter::new();
        w.write_i64(-1);
        assert_eq!(w.as_bytes(), &[codes::INT8, 0xFF]);

        // -129 needs 16 bits
        let mut w = BinaryWriter::new();
        w.write_i64(-129);
        assert_eq!(w.as_bytes(), &[codes::INT16, 0x7F, 0xFF]);

        // 2^32 falls through to INT64
        let mut w = BinaryWriter::new();
        w.write_i64(1 << 32);
        assert_eq!(w.as_bytes()[0], codes::INT64);
        assert_eq!(w.len(), 9);
    }

    #[test]
    fn test_fixed_mode_full_width() {
        let config = WireConfig {
            fixed: true,
            ..Default::default()
        };
        let mut w = BinaryWriter::with_config(config);
        w.write_i64(3);
        assert_eq!(w.len(), 9, "fixed INT64 is always tag + 8 bytes");
        assert_eq!(w.as_bytes()[0], codes::INT64);
        assert_eq!(decode_i64(w.as_bytes()), 3);
    }

    #[test]
    fn test_rewrite_i64_in_place() {
        let config = WireConfig {
            fixed: true,
            ..Default::default()
        };
        let mut w = BinaryWriter::with_config(config);
        w.write_text(Some("counter"));
        let at = w.position();
        w.write_i64(0);
        w.write_text(Some("tail"));
        let len = w.len();

        w.rewrite_i64(at, 42);
        assert_eq!(w.len(), len, "rewrite must not shift subsequent bytes");

        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_text().unwrap(), Some("counter"));
        assert_eq!(r.read_i64().unwrap(), 42);
        assert_eq!(r.read_text().unwrap(), Some("tail"));
    }

    #[test]
    fn test_float_adaptive() {
        // integral value collapses to the inline integer form
        let mut w = BinaryWriter::new();
        w.write_f64(3.0);
        assert_eq!(w.as_bytes(), &[0x03]);

        // exact in f32
        let mut w = BinaryWriter::new();
        w.write_f64(1.5);
        assert_eq!(w.as_bytes()[0], codes::FLOAT32);

        // needs full 64-bit precision
        let mut w = BinaryWriter::new();
        w.write_f64(1e300);
        assert_eq!(w.as_bytes()[0], codes::FLOAT64);

        let mut w = BinaryWriter::new();
        w.write_f64(0.1);
        assert_eq!(w.as_bytes()[0], codes::FLOAT64);
    }

    #[test]
    fn test_float_roundtrip() {
        for v in [
            0.0f64,
            1.0,
            -1.0,
            1.5,
            0.1,
            1e300,
            -1e300,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MIN_POSITIVE,
            std::f64::consts::PI,
        ] {
            let mut w = BinaryWriter::new();
            w.write_f64(v);
            let got = BinaryReader::new(w.as_bytes()).read_f64().unwrap();
            assert_eq!(got, v, "failed for {}", v);
        }
    }

    #[test]
    fn test_cross_widening() {
        // an integer tag satisfies a float read
        let mut w = BinaryWriter::new();
        w.write_i64(1 << 40);
        assert_eq!(
            BinaryReader::new(w.as_bytes()).read_f64().unwrap(),
            (1u64 << 40) as f64
        );

        // a float tag satisfies an int read
        let mut w = BinaryWriter::new();
        w.write_f64(2.5);
        assert_eq!(BinaryReader::new(w.as_bytes()).read_i64().unwrap(), 2);

        // booleans coerce to 0/1 on numeric reads
        let mut w = BinaryWriter::new();
        w.write_bool(Some(true));
        w.write_bool(Some(false));
        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_i64().unwrap(), 1);
        assert_eq!(r.read_f64().unwrap(), 0.0);
    }

    #[test]
    fn test_numeric_read_rejects_text_tag() {
        let mut w = BinaryWriter::new();
        w.write_text(Some("nope"));
        let err = BinaryReader::new(w.as_bytes()).read_i64().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedTag {
                expected: "int",
                ..
            }
        ));
    }

    #[test]
    fn test_text_inline_boundary() {
        // 31 bytes fits the inline form
        let s31 = "a".repeat(31);
        let mut w = BinaryWriter::new();
        w.write_text(Some(&s31));
        assert_eq!(w.as_bytes()[0], codes::STRING0 + 31);
        assert_eq!(w.len(), 32);

        // 32 bytes needs the any-length form
        let s32 = "a".repeat(32);
        let mut w = BinaryWriter::new();
        w.write_text(Some(&s32));
        assert_eq!(w.as_bytes()[0], codes::STRING_ANY);

        for s in [s31, s32] {
            let mut w = BinaryWriter::new();
            w.write_text(Some(&s));
            let got = BinaryReader::new(w.as_bytes()).read_text().unwrap();
            assert_eq!(got.unwrap(), s);
        }
    }

    #[test]
    fn test_text_null_and_errors() {
        let mut w = BinaryWriter::new();
        w.write_text(None);
        assert_eq!(BinaryReader::new(w.as_bytes()).read_text().unwrap(), None);

        // a numeric tag is not text
        let mut w = BinaryWriter::new();
        w.write_i64(1000);
        let err = BinaryReader::new(w.as_bytes()).read_text().unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedTag { .. }));
    }

    #[test]
    fn test_bool_roundtrip() {
        for v in [None, Some(false), Some(true)] {
            let mut w = BinaryWriter::new();
            w.write_bool(v);
            assert_eq!(BinaryReader::new(w.as_bytes()).read_bool().unwrap(), v);
        }
    }

    #[test]
    fn test_uuid_roundtrip() {
        let id = Uuid::new_v4();
        let mut w = BinaryWriter::new();
        w.write_uuid(id);
        assert_eq!(BinaryReader::new(w.as_bytes()).read_uuid().unwrap(), id);
    }

    #[test]
    fn test_u8_array_roundtrip() {
        for data in [&b""[..], &b"abc"[..], &[0u8; 300][..]] {
            let mut w = BinaryWriter::new();
            w.write_u8_array(data).unwrap();
            let got = BinaryReader::new(w.as_bytes()).read_u8_array().unwrap();
            assert_eq!(got, data);
        }
    }

    #[test]
    fn test_block_roundtrip() {
        let mut w = BinaryWriter::new();
        w.write_block(|w| {
            w.write_text(Some("inner"));
            w.write_i64(7);
            Ok(())
        })
        .unwrap();
        w.write_text(Some("after"));

        let mut r = BinaryReader::new(w.as_bytes());
        let inner = r
            .read_block(|b| {
                let s = b.read_text()?.unwrap().to_string();
                let n = b.read_i64()?;
                Ok((s, n))
            })
            .unwrap();
        assert_eq!(inner, ("inner".to_string(), 7));
        assert_eq!(r.read_text().unwrap(), Some("after"));
    }

    #[test]
    fn test_block_error_leaves_parent_consistent() {
        let mut w = BinaryWriter::new();
        w.write_block(|w| {
            w.write_i64(1);
            Ok(())
        })
        .unwrap();
        w.write_text(Some("after"));

        let mut r = BinaryReader::new(w.as_bytes());
        // asking the block body for text fails, but the parent cursor is
        // already past the block
        let err = r.read_block(|b| b.read_text().map(|_| ()));
        assert!(err.is_err());
        assert_eq!(r.read_text().unwrap(), Some("after"));
    }

    #[test]
    fn test_temporal_text_roundtrip() {
        let mut w = BinaryWriter::new();
        w.write_time("10:15:30");
        w.write_date("2015-07-01");
        w.write_zoned_date_time("2015-07-01T10:15:30+01:00[Europe/London]");

        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_time().unwrap(), "10:15:30");
        assert_eq!(r.read_date().unwrap(), "2015-07-01");
        assert_eq!(
            r.read_zoned_date_time().unwrap(),
            "2015-07-01T10:15:30+01:00[Europe/London]"
        );
        assert!(r.is_empty());

        // each temporal read insists on its own tag
        let mut w = BinaryWriter::new();
        w.write_date("2015-07-01");
        let err = BinaryReader::new(w.as_bytes()).read_time().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedTag {
                expected: "time",
                tag: codes::DATE
            }
        ));
    }

    #[test]
    fn test_special_markers_skipped() {
        let mut w = BinaryWriter::new();
        w.add_padding(3);
        w.write_comment("produced by test");
        w.write_hint("align");
        w.add_padding(9);
        w.write_i64(99);

        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_i64().unwrap(), 99);
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_input() {
        let mut w = BinaryWriter::new();
        w.write_i64(1 << 40);
        let bytes = &w.as_bytes()[..4]; // cut the INT64 payload short
        let err = BinaryReader::new(bytes).read_i64().unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_scaled_stop_bit_forms() {
        // hand-encoded: INT_STOP_2 with raw 123 decodes as 12300
        let mut w = Writer::new();
        w.write_byte(codes::INT_STOP_2);
        w.write_signed_stop_bit(123);
        assert_eq!(decode_i64(w.as_bytes()), 12300);

        // FLOAT_STOP_2 with raw 123 decodes as 1.23
        let mut w = Writer::new();
        w.write_byte(codes::FLOAT_STOP_2);
        w.write_signed_stop_bit(123);
        let got = BinaryReader::new(w.as_bytes()).read_f64().unwrap();
        assert_eq!(got, 1.23);

        // scaled overflow is a decode error, not a wrap
        let mut w = Writer::new();
        w.write_byte(codes::INT_STOP_6);
        w.write_signed_stop_bit(i64::MAX / 10);
        let err = BinaryReader::new(w.as_bytes()).read_i64().unwrap_err();
        assert_eq!(err, DecodeError::ScaledOverflow);
    }

    #[test]
    fn test_deterministic_encoding() {
        // two independent encoders must emit identical bytes
        for v in [0i64, 127, 128, -1, 1 << 20, i64::MIN] {
            let mut a = BinaryWriter::new();
            let mut b = BinaryWriter::new();
            a.write_i64(v);
            b.write_i64(v);
            assert_eq!(a.as_bytes(), b.as_bytes());
        }
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_int_roundtrip(v in any::<i64>()) {
                let mut w = BinaryWriter::new();
                w.write_i64(v);
                prop_assert_eq!(decode_i64(w.as_bytes()), v);
            }

            #[test]
            fn prop_int_fixed_and_adaptive_agree(v in any::<i64>()) {
                let mut adaptive = BinaryWriter::new();
                adaptive.write_i64(v);
                let mut fixed = BinaryWriter::with_config(WireConfig {
                    fixed: true,
                    ..Default::default()
                });
                fixed.write_i64(v);
                prop_assert_eq!(
                    decode_i64(adaptive.as_bytes()),
                    decode_i64(fixed.as_bytes())
                );
            }

            #[test]
            fn prop_float_roundtrip(v in any::<f64>()) {
                prop_assume!(!v.is_nan());
                let mut w = BinaryWriter::new();
                w.write_f64(v);
                let got = BinaryReader::new(w.as_bytes()).read_f64().unwrap();
                prop_assert_eq!(got, v);
            }

            #[test]
            fn prop_text_roundtrip(s in proptest::string::string_regex(".{0,1000}").unwrap()) {
                let mut w = BinaryWriter::new();
                w.write_text(Some(&s));
                let got = BinaryReader::new(w.as_bytes()).read_text().unwrap();
                prop_assert_eq!(got.unwrap(), s);
            }
        }
    }
}
