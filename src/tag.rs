//! Type-tag table for the binary wire format.
//!
//! Every byte value 0-255 maps to exactly one [`Category`] selected by its
//! high nibble. Tag values are protocol constants shared with other
//! implementations of the format and must never be renumbered.

use lazy_static::lazy_static;

/// Dispatch category of a tag byte.
///
/// The mapping is total: every possible byte falls into exactly one
/// category. Unassigned values inside a category exist so the decoder can
/// fail with a named tag instead of misreading the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// 0x00-0x7F: the tag byte is itself an inline unsigned integer 0-127.
    Num,
    /// 0x80-0x8F: length prefixes, raw byte arrays, padding markers.
    Control,
    /// 0x90-0x9F: floating point and scaled-down stop-bit decimals.
    Float,
    /// 0xA0-0xAF: explicit-width integers and scaled-up stop-bit integers.
    Int,
    /// 0xB0-0xBF: booleans, null, type hints, comments, field numbers.
    Special,
    /// 0xC0-0xDF: inline field name, byte length in the low 5 bits.
    FieldName,
    /// 0xE0-0xFF: inline string, byte length in the low 5 bits.
    Str,
}

/// Returns the category a tag byte dispatches to.
#[inline]
pub fn category(tag: u8) -> Category {
    match tag >> 4 {
        0x0..=0x7 => Category::Num,
        0x8 => Category::Control,
        0x9 => Category::Float,
        0xA => Category::Int,
        0xB => Category::Special,
        0xC | 0xD => Category::FieldName,
        _ => Category::Str,
    }
}

/// Named tag constants.
///
/// Values above 0x7F carry an explicit payload; 0x00-0x7F are the inline
/// small-integer range and have no names.
pub mod codes {
    // --- CONTROL (0x8_) ---
    /// Length prefix: unsigned 8-bit length follows.
    pub const BYTES_LENGTH8: u8 = 0x80;
    /// Length prefix: unsigned 16-bit little-endian length follows.
    pub const BYTES_LENGTH16: u8 = 0x81;
    /// Length prefix: unsigned 32-bit little-endian length follows.
    pub const BYTES_LENGTH32: u8 = 0x82;
    /// Raw byte array; always preceded by a length prefix covering it.
    pub const U8_ARRAY: u8 = 0x8A;
    /// Padding run: unsigned 32-bit count of padding bytes follows.
    pub const PADDING32: u8 = 0x8E;
    /// Single padding byte.
    pub const PADDING: u8 = 0x8F;

    // --- FLOAT (0x9_) ---
    pub const FLOAT32: u8 = 0x90;
    pub const FLOAT64: u8 = 0x91;
    /// Signed stop-bit integer scaled down by 10^1 (FLOAT_STOP_2..6 follow).
    pub const FLOAT_STOP_1: u8 = 0x92;
    pub const FLOAT_STOP_2: u8 = 0x93;
    pub const FLOAT_STOP_3: u8 = 0x94;
    pub const FLOAT_STOP_4: u8 = 0x95;
    pub const FLOAT_STOP_5: u8 = 0x96;
    pub const FLOAT_STOP_6: u8 = 0x97;

    // --- INT (0xA_) ---
    /// 16-byte UUID, written as two little-endian u64 halves.
    pub const UUID: u8 = 0xA0;
    /// Reserved for a raw UTF-8 codepoint; not supported by this decoder.
    pub const UTF8: u8 = 0xA1;
    pub const INT8: u8 = 0xA2;
    pub const INT16: u8 = 0xA3;
    pub const INT32: u8 = 0xA4;
    pub const INT64: u8 = 0xA5;
    pub const UINT8: u8 = 0xA6;
    pub const UINT16: u8 = 0xA7;
    pub const UINT32: u8 = 0xA8;
    /// Signed stop-bit integer scaled up by 10^6 (INT_STOP_5..1 follow).
    pub const INT_STOP_6: u8 = 0xA9;
    pub const INT_STOP_5: u8 = 0xAA;
    pub const INT_STOP_4: u8 = 0xAB;
    pub const INT_STOP_3: u8 = 0xAC;
    pub const INT_STOP_2: u8 = 0xAD;
    pub const INT_STOP_1: u8 = 0xAE;
    /// Unscaled signed stop-bit integer.
    pub const STOP_BIT: u8 = 0xAF;

    // --- SPECIAL (0xB_) ---
    /// Field name of any length: stop-bit length + UTF-8 bytes.
    pub const FIELD_NAME_ANY: u8 = 0xB0;
    /// String of any length: stop-bit length + UTF-8 bytes.
    pub const STRING_ANY: u8 = 0xB1;
    /// Diagnostic comment; skipped by value reads, forwarded by transcoding.
    pub const COMMENT: u8 = 0xB2;
    /// Encoder hint; skipped by value reads, dropped by transcoding.
    pub const HINT: u8 = 0xB3;
    pub const TIME: u8 = 0xB4;
    pub const ZONED_DATE_TIME: u8 = 0xB5;
    pub const DATE: u8 = 0xB6;
    /// Type name marker: stop-bit length + UTF-8 type name.
    pub const TYPE: u8 = 0xB7;
    /// Numeric field code: stop-bit integer follows.
    pub const FIELD_NUMBER: u8 = 0xB9;
    pub const NULL: u8 = 0xBB;
    pub const FALSE: u8 = 0xBD;
    pub const TRUE: u8 = 0xBE;

    // --- Inline bases ---
    /// Base tag for inline field names; low 5 bits carry the byte length.
    pub const FIELD_NAME0: u8 = 0xC0;
    /// Base tag for inline strings; low 5 bits carry the byte length.
    pub const STRING0: u8 = 0xE0;
}

lazy_static! {
    static ref TAG_NAMES: [String; 256] = build_tag_names();
}

/// Returns a diagnostic name for a tag byte, e.g. `"INT64"` or `"STRING11"`.
pub fn tag_name(tag: u8) -> &'static str {
    TAG_NAMES[tag as usize].as_str()
}

fn build_tag_names() -> [String; 256] {
    let names: Vec<String> = (0u16..256).map(|t| name_for(t as u8)).collect();
    // SAFETY: the iterator above yields exactly 256 elements
    names.try_into().unwrap()
}

fn name_for(tag: u8) -> String {
    use codes::*;
    let named = match tag {
        BYTES_LENGTH8 => "BYTES_LENGTH8",
        BYTES_LENGTH16 => "BYTES_LENGTH16",
        BYTES_LENGTH32 => "BYTES_LENGTH32",
        U8_ARRAY => "U8_ARRAY",
        PADDING32 => "PADDING32",
        PADDING => "PADDING",
        FLOAT32 => "FLOAT32",
        FLOAT64 => "FLOAT64",
        FLOAT_STOP_1 => "FLOAT_STOP_1",
        FLOAT_STOP_2 => "FLOAT_STOP_2",
        FLOAT_STOP_3 => "FLOAT_STOP_3",
        FLOAT_STOP_4 => "FLOAT_STOP_4",
        FLOAT_STOP_5 => "FLOAT_STOP_5",
        FLOAT_STOP_6 => "FLOAT_STOP_6",
        UUID => "UUID",
        UTF8 => "UTF8",
        INT8 => "INT8",
        INT16 => "INT16",
        INT32 => "INT32",
        INT64 => "INT64",
        UINT8 => "UINT8",
        UINT16 => "UINT16",
        UINT32 => "UINT32",
        INT_STOP_6 => "INT_STOP_6",
        INT_STOP_5 => "INT_STOP_5",
        INT_STOP_4 => "INT_STOP_4",
        INT_STOP_3 => "INT_STOP_3",
        INT_STOP_2 => "INT_STOP_2",
        INT_STOP_1 => "INT_STOP_1",
        STOP_BIT => "STOP_BIT",
        FIELD_NAME_ANY => "FIELD_NAME_ANY",
        STRING_ANY => "STRING_ANY",
        COMMENT => "COMMENT",
        HINT => "HINT",
        TIME => "TIME",
        ZONED_DATE_TIME => "ZONED_DATE_TIME",
        DATE => "DATE",
        TYPE => "TYPE",
        FIELD_NUMBER => "FIELD_NUMBER",
        NULL => "NULL",
        FALSE => "FALSE",
        TRUE => "TRUE",
        _ => "",
    };
    if !named.is_empty() {
        return named.to_string();
    }
    match category(tag) {
        Category::Num => format!("NUM({tag})"),
        Category::FieldName => format!("FIELD_NAME{}", tag & 0x1F),
        Category::Str => format!("STRING{}", tag & 0x1F),
        _ => format!("RESERVED({tag:#04X})"),
    }
}
