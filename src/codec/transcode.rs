//! Stream transcoding: decode every element of one stream and re-encode it
//! under another writer's configuration.
//!
//! Transcoding normalizes representation (an adaptive stream can be
//! re-laid-out as fixed-width and vice versa) without interpreting the
//! data. Layout-only markers are handled per kind: padding is dropped
//! (the output writer does its own layout), hints are dropped, comments
//! and type markers are forwarded.

use crate::codec::value::{BinaryReader, BinaryWriter};
use crate::error::{DecodeError, EncodeError, WireError};
use crate::limits::MAX_BLOCK_LEN;
use crate::tag::{Category, category, codes};

/// Copies every remaining element of `r` into `w`.
///
/// Elements the transcoder cannot carry faithfully (dates, times, uuids,
/// raw codepoints, unassigned tags) are fatal; nothing is silently skipped
/// or guessed at.
pub fn transcode(r: &mut BinaryReader<'_>, w: &mut BinaryWriter) -> Result<(), WireError> {
    while !r.is_empty() {
        transcode_one(r, w)?;
    }
    Ok(())
}

fn transcode_one(r: &mut BinaryReader<'_>, w: &mut BinaryWriter) -> Result<(), WireError> {
    let tag = match r.peek_tag() {
        Some(tag) => tag,
        None => return Ok(()),
    };
    match category(tag) {
        Category::Num => {
            r.skip_tag();
            w.write_i64(tag as i64);
        }
        Category::Control => transcode_control(r, w, tag)?,
        Category::Float => {
            r.skip_tag();
            let v = r.read_float_body(tag)?;
            w.write_f64(v);
        }
        Category::Int => {
            r.skip_tag();
            // read_int_body rejects UUID and UTF8 as unsupported
            let v = r.read_int_body(tag)?;
            w.write_i64(v);
        }
        Category::Special => transcode_special(r, w, tag)?,
        Category::FieldName => {
            r.skip_tag();
            let len = (tag & 0x1F) as usize;
            let name = r.cur.read_utf8_exact(len, "field name")?;
            forward_field_name(w, name);
        }
        Category::Str => {
            r.skip_tag();
            let len = (tag & 0x1F) as usize;
            let s = r.cur.read_utf8_exact(len, "text")?;
            w.write_text(Some(s));
        }
    }
    Ok(())
}

fn transcode_control(
    r: &mut BinaryReader<'_>,
    w: &mut BinaryWriter,
    tag: u8,
) -> Result<(), WireError> {
    match tag {
        codes::PADDING => {
            r.skip_tag();
        }
        codes::PADDING32 => {
            r.skip_tag();
            let n = r.cur.read_u32("padding run")? as usize;
            r.cur.skip(n, "padding run")?;
        }
        codes::BYTES_LENGTH8 | codes::BYTES_LENGTH16 | codes::BYTES_LENGTH32 => {
            // peeked, so the prefix is guaranteed present
            let len = r.read_len_prefix()?.unwrap_or(0);
            let body = r.cur.read_bytes(len, "block body")?;
            if body.first() == Some(&codes::U8_ARRAY) {
                w.write_u8_array(&body[1..]).map_err(WireError::from)?;
            } else {
                transcode_block(body, r, w)?;
            }
        }
        _ => return Err(DecodeError::Unsupported { tag }.into()),
    }
    Ok(())
}

/// Re-frames a nested block, transcoding its body recursively.
fn transcode_block(
    body: &[u8],
    r: &BinaryReader<'_>,
    w: &mut BinaryWriter,
) -> Result<(), WireError> {
    w.out.write_byte(codes::BYTES_LENGTH32);
    let at = w.out.position();
    w.out.write_u32(0);
    let mut sub = BinaryReader::with_config(body, r.config());
    transcode(&mut sub, w)?;
    let len = w.out.position() - at - 4;
    if len > MAX_BLOCK_LEN {
        return Err(EncodeError::BlockLengthOutOfRange { len }.into());
    }
    w.out.patch_u32(at, len as u32);
    Ok(())
}

/// Re-emits a field identifier in the target's own field mode: dropped
/// for a field-less target, otherwise written as a name (which itself
/// rewrites digit-only names as numeric codes). A wire name cannot be
/// mapped to a registry code, so a numeric-mode target keeps the name.
fn forward_field_name(w: &mut BinaryWriter, name: &str) {
    if !w.config().field_less {
        w.write_field_name(name);
    }
}

fn transcode_special(
    r: &mut BinaryReader<'_>,
    w: &mut BinaryWriter,
    tag: u8,
) -> Result<(), WireError> {
    r.skip_tag();
    match tag {
        codes::FIELD_NAME_ANY => {
            let name = r.cur.read_utf8("field name")?;
            forward_field_name(w, name);
        }
        codes::STRING_ANY => {
            let s = r.cur.read_utf8("text")?;
            w.write_text(Some(s));
        }
        codes::COMMENT => {
            let s = r.cur.read_utf8("comment")?;
            w.write_comment(s);
        }
        codes::HINT => {
            r.cur.skip_utf8("hint")?;
        }
        codes::TYPE => {
            let name = r.cur.read_utf8("type name")?;
            w.write_type(name);
        }
        codes::FIELD_NUMBER => {
            let code = r.cur.read_stop_bit("field number")?;
            if !w.config().field_less {
                w.write_field_number(code);
            }
        }
        codes::NULL => w.write_bool(None),
        codes::FALSE => w.write_bool(Some(false)),
        codes::TRUE => w.write_bool(Some(true)),
        _ => return Err(DecodeError::Unsupported { tag }.into()),
    }
    Ok(())
}
