//! Wire-format limits enforced during encoding and decoding.

/// Maximum bytes in a stop-bit integer (64 bits at 7 bits per byte).
pub const MAX_STOP_BIT_BYTES: usize = 10;

/// Inline strings and field names carry their byte length in the tag's low
/// 5 bits.
pub const MAX_INLINE_LEN: usize = 0x1F;

/// A frame body length must fit the header's 30-bit field; the all-ones
/// pattern is reserved as the unknown-length sentinel.
pub const MAX_DOCUMENT_LEN: usize = (1 << 30) - 2;

/// Nested blocks and byte arrays carry at most a 32-bit length prefix.
pub const MAX_BLOCK_LEN: usize = u32::MAX as usize;

/// Decoder-side guard on any single string (text, comments, type names),
/// bounding allocations on untrusted input.
pub const MAX_TEXT_LEN: usize = 1 << 24;
