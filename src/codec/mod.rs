//! Value, field and stream codecs for the tagged wire format.

pub mod field;
pub mod primitives;
pub mod transcode;
pub mod value;

pub use field::{FieldId, Key};
pub use primitives::{Reader, Writer, zigzag_decode, zigzag_encode};
pub use transcode::transcode;
pub use value::{BinaryReader, BinaryWriter, WireConfig};
