//! Self-describing binary tagged-value codec with lock-free document
//! framing.
//!
//! Every value on the wire starts with a one-byte tag whose high nibble
//! selects its category, so a reader can always tell what the next bytes
//! mean without a schema. On top of the value codec sits a document
//! framing layer: 4-byte headers over a shared buffer that let one writer
//! publish documents to concurrent readers without locks.
//!
//! # Quick Start
//!
//! ```rust
//! use tagwire::{BinaryReader, BinaryWriter, Key};
//!
//! let mut w = BinaryWriter::new();
//! w.write_key(&Key::new("name", 1));
//! w.write_text(Some("hello world"));
//! w.write_key(&Key::new("count", 2));
//! w.write_i64(42);
//!
//! let mut r = BinaryReader::new(w.as_bytes());
//! r.read_key(&Key::new("name", 1)).unwrap();
//! assert_eq!(r.read_text().unwrap(), Some("hello world"));
//! r.read_key(&Key::new("count", 2)).unwrap();
//! assert_eq!(r.read_i64().unwrap(), 42);
//! ```
//!
//! # Modules
//!
//! - [`tag`]: the tag table, categories and named tag constants
//! - [`codec`]: value, field and stream codecs
//! - [`frame`]: lock-free document framing over a shared buffer
//! - [`registry`]: marshallable traits and runtime type dispatch
//! - [`error`]: error types
//! - [`limits`]: security limits for decoding
//!
//! # Encoding modes
//!
//! A [`WireConfig`] fixes three independent choices for a stream's
//! lifetime: adaptive (narrowest representation, canonical) versus fixed
//! (full width, rewritable in place) scalars, and named, numeric or absent
//! field identifiers. Any reader configuration can decode any writer
//! configuration; [`codec::transcode`] converts between layouts.
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - every read is bounds-checked against the input slice, and nested
//!   blocks are decoded through sub-readers that cannot escape their block
//! - stop-bit integers are limited to prevent overflow
//! - string allocations are bounded by [`limits::MAX_TEXT_LEN`]
//! - invalid data is rejected with descriptive errors; there is no
//!   best-effort mode

pub mod codec;
pub mod error;
pub mod frame;
pub mod limits;
pub mod registry;
pub mod tag;

// Re-export commonly used types at crate root
pub use codec::{BinaryReader, BinaryWriter, FieldId, Key, WireConfig, transcode};
pub use error::{DecodeError, EncodeError, WireError};
pub use frame::{FrameAppender, FrameBuf, FramePoll, FrameTailer, TryRead};
pub use registry::{ReadMarshallable, TypeRegistry, WriteMarshallable};
pub use tag::{Category, category, tag_name};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
