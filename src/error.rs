//! Error types for wire encoding, decoding and transcoding.

use thiserror::Error;

use crate::tag::tag_name;

/// Error during binary decoding.
///
/// All variants are fatal for the current read: the decoder never retries
/// internally and there is no partial/best-effort mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("cannot read {expected} from tag {tag:#04x} ({})", tag_name(*tag))]
    UnexpectedTag { expected: &'static str, tag: u8 },

    #[error("tag {tag:#04x} ({}) is not supported here", tag_name(*tag))]
    Unsupported { tag: u8 },

    #[error("field number {found} did not match expected {expected} (out-of-order fields are not supported)")]
    FieldNumberMismatch { expected: u64, found: u64 },

    #[error("field name {found:?} did not match expected {expected:?} (out-of-order fields are not supported)")]
    FieldNameMismatch { expected: String, found: String },

    #[error("expected field {expected:?} but the stream has no field identifier here")]
    FieldAbsent { expected: String },

    #[error("stop-bit integer exceeds maximum length (10 bytes)")]
    StopBitTooLong,

    #[error("stop-bit integer overflows u64")]
    StopBitOverflow,

    #[error("scaled stop-bit value overflows i64")]
    ScaledOverflow,

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("unknown type name {name:?}")]
    UnknownType { name: String },

    #[error("expected metadata but found a document of length {len}")]
    UnexpectedDocument { len: usize },

    #[error("frame body of length {len} overruns the buffer (capacity {cap})")]
    TruncatedFrame { len: usize, cap: usize },
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("document length {len} out of 30-bit range")]
    DocumentLengthOutOfRange { len: usize },

    #[error("block length {len} out of 32-bit range")]
    BlockLengthOutOfRange { len: usize },

    #[error("frame of {needed} bytes does not fit in the remaining {remaining} bytes")]
    FrameBufFull { needed: usize, remaining: usize },

    #[error("frame buffer already has an active appender")]
    AppenderClaimed,
}

/// Either side of a transcoding operation can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
