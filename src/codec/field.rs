//! Field identifier encoding/decoding.
//!
//! A wire stream can identify fields three ways, chosen by the writer's
//! configuration: by name (the self-describing default), by numeric code
//! (compact) or not at all (purely positional). Readers consume whichever
//! form is present; an expected-field read fails fast on any mismatch
//! instead of searching the record.

use crate::codec::value::{BinaryReader, BinaryWriter};
use crate::error::DecodeError;
use crate::limits::MAX_INLINE_LEN;
use crate::tag::{Category, category, codes};

/// A field known to the application: its name plus its numeric code.
///
/// The same key works in every wire mode; the writer's configuration
/// decides which half goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key<'a> {
    pub name: &'a str,
    pub code: u64,
}

impl<'a> Key<'a> {
    pub const fn new(name: &'a str, code: u64) -> Self {
        Self { name, code }
    }
}

/// A field identifier as found on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId<'a> {
    /// No field identifier precedes the next value.
    None,
    /// A field name.
    Name(&'a str),
    /// A numeric field code.
    Code(u64),
}

impl BinaryWriter {
    /// Writes the identifier for `key` according to this writer's mode.
    pub fn write_key(&mut self, key: &Key<'_>) {
        if self.config.field_less {
            return;
        }
        if self.config.numeric_fields {
            self.write_field_number(key.code);
        } else {
            self.write_field_name(key.name);
        }
    }

    /// Writes a numeric field code.
    pub fn write_field_number(&mut self, code: u64) {
        self.out.write_byte(codes::FIELD_NUMBER);
        self.out.write_stop_bit(code);
    }

    /// Writes a field name.
    ///
    /// Names of at most 31 bytes use the inline form. A name that is
    /// entirely digits and fits u64 is rewritten as a numeric field code,
    /// which is both smaller and canonical for such names.
    pub fn write_field_name(&mut self, name: &str) {
        if name.as_bytes().first().is_some_and(u8::is_ascii_digit) {
            if let Ok(code) = name.parse::<u64>() {
                self.write_field_number(code);
                return;
            }
        }
        if name.len() <= MAX_INLINE_LEN {
            self.out.write_byte(codes::FIELD_NAME0 + name.len() as u8);
            self.out.write_bytes(name.as_bytes());
        } else {
            self.out.write_byte(codes::FIELD_NAME_ANY);
            self.out.write_utf8(name);
        }
    }
}

impl<'a> BinaryReader<'a> {
    /// Reads the next field identifier, whichever form it takes.
    ///
    /// Returns [`FieldId::None`] without consuming anything when the next
    /// tag is not a field identifier (a field-less stream, or the end of a
    /// record).
    pub fn read_any_key(&mut self) -> Result<FieldId<'a>, DecodeError> {
        self.consume_special()?;
        match self.peek_tag() {
            Some(codes::FIELD_NUMBER) => {
                self.skip_tag();
                Ok(FieldId::Code(self.cur.read_stop_bit("field number")?))
            }
            Some(codes::FIELD_NAME_ANY) => {
                self.skip_tag();
                Ok(FieldId::Name(self.cur.read_utf8("field name")?))
            }
            Some(tag) if category(tag) == Category::FieldName => {
                self.skip_tag();
                let len = (tag & 0x1F) as usize;
                Ok(FieldId::Name(self.cur.read_utf8_exact(len, "field name")?))
            }
            _ => Ok(FieldId::None),
        }
    }

    /// Reads and checks the identifier for an expected field.
    ///
    /// Fields must arrive in the order they are asked for; any mismatch or
    /// absent identifier is fatal for the read. Two forms match any key: a
    /// field-less reader skips the check entirely, and an anonymous
    /// (zero-length) field name on the wire is a wildcard.
    pub fn read_key(&mut self, key: &Key<'_>) -> Result<(), DecodeError> {
        if self.config.field_less {
            return Ok(());
        }
        match self.read_any_key()? {
            FieldId::None => Err(DecodeError::FieldAbsent {
                expected: key.name.to_string(),
            }),
            FieldId::Name("") => Ok(()),
            FieldId::Name(name) if name == key.name => Ok(()),
            FieldId::Name(name) => Err(DecodeError::FieldNameMismatch {
                expected: key.name.to_string(),
                found: name.to_string(),
            }),
            // a digit-only name is rewritten as a code on the wire, so an
            // expected name may legitimately arrive as its numeric value
            FieldId::Code(code) if code == key.code || key.name.parse() == Ok(code) => Ok(()),
            FieldId::Code(code) => Err(DecodeError::FieldNumberMismatch {
                expected: key.code,
                found: code,
            }),
        }
    }
}
