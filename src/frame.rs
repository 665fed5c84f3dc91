//! Document framing over a shared in-memory buffer.
//!
//! Each document is a 4-byte little-endian header followed by the encoded
//! body, padded so the next header stays 4-byte aligned. The header packs
//! three fields: bit 31 set while the frame is being written, bit 30 set
//! for metadata frames, and the low 30 bits carrying the body length. A
//! zero header means no frame has been started at that position.
//!
//! One appender and any number of tailers may work over the same buffer
//! from different threads without locks. The appender publishes a frame
//! with a release store of its final header; a tailer's acquire load of
//! that header therefore observes the complete body.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::codec::value::{BinaryReader, BinaryWriter, WireConfig};
use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_DOCUMENT_LEN;

/// Set while the frame at this position is still being written.
pub const NOT_READY: u32 = 1 << 31;
/// Set when the frame carries metadata rather than application data.
pub const META_DATA: u32 = 1 << 30;
/// The low 30 bits of a header carry the body length.
pub const LENGTH_MASK: u32 = (1 << 30) - 1;
/// Length sentinel used while the final length is not yet known.
pub const UNKNOWN_LENGTH: u32 = LENGTH_MASK;
/// Size of a frame header.
pub const HEADER_BYTES: usize = 4;

/// Returns true once the frame is fully written.
#[inline]
pub fn is_ready(header: u32) -> bool {
    header & NOT_READY == 0
}

/// Returns true if the frame carries metadata.
#[inline]
pub fn is_metadata(header: u32) -> bool {
    header & META_DATA != 0
}

/// Returns true if the header carries a real length rather than the
/// unknown-length sentinel.
#[inline]
pub fn is_known_length(header: u32) -> bool {
    header & LENGTH_MASK != UNKNOWN_LENGTH
}

/// Extracts the body length from a header.
#[inline]
pub fn body_len(header: u32) -> usize {
    (header & LENGTH_MASK) as usize
}

/// What a tailer found at its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePoll {
    /// No frame has been started here.
    Empty,
    /// A frame is being written; try again shortly.
    Writing,
    /// A complete data document of `len` body bytes.
    Document { len: usize },
    /// A complete metadata document of `len` body bytes.
    Metadata { len: usize },
}

/// Outcome of a non-blocking document read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRead<T> {
    /// No frame available.
    Empty,
    /// A frame is mid-write; try again shortly.
    Writing,
    /// A data document was decoded.
    Data(T),
    /// A metadata document was handled.
    Metadata,
}

/// Fixed-capacity frame buffer shared between one appender and any number
/// of tailers.
///
/// Backed by u32 cells so every header sits on a 4-byte boundary with the
/// alignment the atomic header accesses require.
pub struct FrameBuf {
    cells: Box<[UnsafeCell<u32>]>,
    claimed: AtomicBool,
}

// Cross-thread access to the cells is coordinated entirely through the
// atomic header protocol: body bytes are only written before the release
// store that publishes them and never mutated afterwards.
unsafe impl Sync for FrameBuf {}
unsafe impl Send for FrameBuf {}

impl FrameBuf {
    /// Creates a zeroed buffer of at least `bytes` capacity, rounded up to
    /// whole 4-byte words.
    pub fn with_capacity(bytes: usize) -> Self {
        let words = bytes.div_ceil(4);
        let cells = (0..words)
            .map(|_| UnsafeCell::new(0u32))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            cells,
            claimed: AtomicBool::new(false),
        }
    }

    /// Returns the capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.cells.len() * 4
    }

    /// Claims the single appender slot.
    pub fn appender(&self) -> Result<FrameAppender<'_>, EncodeError> {
        self.appender_with_config(WireConfig::default())
    }

    /// Claims the single appender slot with an explicit wire configuration.
    pub fn appender_with_config(
        &self,
        config: WireConfig,
    ) -> Result<FrameAppender<'_>, EncodeError> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(EncodeError::AppenderClaimed);
        }
        // resume after the last complete frame
        let mut pos = 0;
        while pos + HEADER_BYTES <= self.capacity() {
            let header = self.header(pos).load(Ordering::Acquire);
            if header == 0 {
                break;
            }
            pos += HEADER_BYTES + padded(body_len(header));
        }
        Ok(FrameAppender {
            buf: self,
            pos,
            config,
        })
    }

    /// Creates a tailer positioned at the first frame.
    pub fn tailer(&self) -> FrameTailer<'_> {
        self.tailer_with_config(WireConfig::default())
    }

    /// Creates a tailer with an explicit wire configuration.
    pub fn tailer_with_config(&self, config: WireConfig) -> FrameTailer<'_> {
        FrameTailer {
            buf: self,
            pos: 0,
            config,
        }
    }

    /// Atomic view of the header at a 4-byte-aligned byte offset.
    fn header(&self, at: usize) -> &AtomicU32 {
        debug_assert_eq!(at % 4, 0);
        // SAFETY: the cell is in bounds and u32-aligned by construction
        unsafe { AtomicU32::from_ptr(self.cells[at / 4].get()) }
    }

    fn base(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.cells.as_ptr()) as *mut u8
    }

    /// Body bytes of a published frame.
    ///
    /// Only called after an acquire load observed a ready header, so the
    /// bytes are fully written and will never change again.
    fn body(&self, at: usize, len: usize) -> &[u8] {
        debug_assert!(at + len <= self.capacity());
        // SAFETY: in bounds, and immutable once published (see above)
        unsafe { std::slice::from_raw_parts(self.base().add(at), len) }
    }
}

/// Rounds a body length up to the next 4-byte boundary.
#[inline]
fn padded(len: usize) -> usize {
    len.div_ceil(4) * 4
}

/// The buffer's single writer. Dropping it releases the claim.
pub struct FrameAppender<'a> {
    buf: &'a FrameBuf,
    pos: usize,
    config: WireConfig,
}

impl FrameAppender<'_> {
    /// Byte offset where the next frame will start.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Appends a data document.
    pub fn write_document<F>(&mut self, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut BinaryWriter) -> Result<(), EncodeError>,
    {
        self.append(false, body)
    }

    /// Appends a metadata document.
    pub fn write_metadata<F>(&mut self, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut BinaryWriter) -> Result<(), EncodeError>,
    {
        self.append(true, body)
    }

    /// Stages the body off to the side, then publishes it in three steps:
    /// a not-ready placeholder header, the body bytes, and finally the
    /// real header with a release store. A tailer that sees the final
    /// header is therefore guaranteed to see the whole body. If the body
    /// closure fails nothing is written at all.
    fn append<F>(&mut self, metadata: bool, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut BinaryWriter) -> Result<(), EncodeError>,
    {
        let mut scratch = BinaryWriter::with_config(self.config);
        body(&mut scratch)?;
        let pad = padded(scratch.len()) - scratch.len();
        if pad > 0 {
            scratch.add_padding(pad);
        }
        let len = scratch.len();
        if len > MAX_DOCUMENT_LEN {
            return Err(EncodeError::DocumentLengthOutOfRange { len });
        }
        if self.pos + HEADER_BYTES + len > self.buf.capacity() {
            return Err(EncodeError::FrameBufFull {
                needed: HEADER_BYTES + len,
                remaining: self.buf.capacity().saturating_sub(self.pos),
            });
        }

        let meta_bit = if metadata { META_DATA } else { 0 };
        let header = self.buf.header(self.pos);
        header.store(NOT_READY | meta_bit | UNKNOWN_LENGTH, Ordering::Relaxed);
        // SAFETY: the range was bounds-checked above and no published frame
        // overlaps it; tailers do not look past a zero or not-ready header
        unsafe {
            std::ptr::copy_nonoverlapping(
                scratch.as_bytes().as_ptr(),
                self.buf.base().add(self.pos + HEADER_BYTES),
                len,
            );
        }
        header.store(meta_bit | len as u32, Ordering::Release);
        self.pos += HEADER_BYTES + len;
        Ok(())
    }
}

impl Drop for FrameAppender<'_> {
    fn drop(&mut self) {
        self.buf.claimed.store(false, Ordering::Release);
    }
}

/// A sequential frame reader. Multiple tailers may run concurrently, each
/// with its own position.
pub struct FrameTailer<'a> {
    buf: &'a FrameBuf,
    pos: usize,
    config: WireConfig,
}

impl<'a> FrameTailer<'a> {
    /// Byte offset of the frame this tailer will read next.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Inspects the header at the current position without consuming it.
    pub fn poll(&self) -> FramePoll {
        if self.pos + HEADER_BYTES > self.buf.capacity() {
            return FramePoll::Empty;
        }
        let header = self.buf.header(self.pos).load(Ordering::Acquire);
        if header == 0 {
            FramePoll::Empty
        } else if !is_ready(header) || !is_known_length(header) {
            FramePoll::Writing
        } else if is_metadata(header) {
            FramePoll::Metadata {
                len: body_len(header),
            }
        } else {
            FramePoll::Document {
                len: body_len(header),
            }
        }
    }

    /// Attempts to consume the next document without blocking.
    ///
    /// A metadata frame goes to `on_metadata` when present and is skipped
    /// otherwise; the tailer then moves on to the next frame. A data frame
    /// with no `on_document` handler is an error rather than a silent
    /// skip. The tailer advances past a frame before its handler runs, so
    /// a decode error cannot leave the position inside a frame.
    pub fn try_read_document<T>(
        &mut self,
        mut on_document: Option<&mut dyn FnMut(&mut BinaryReader<'_>) -> Result<T, DecodeError>>,
        mut on_metadata: Option<&mut dyn FnMut(&mut BinaryReader<'_>) -> Result<(), DecodeError>>,
    ) -> Result<TryRead<T>, DecodeError> {
        loop {
            match self.poll() {
                FramePoll::Empty => return Ok(TryRead::Empty),
                FramePoll::Writing => return Ok(TryRead::Writing),
                FramePoll::Metadata { len } => {
                    let body = self.frame_body(len)?;
                    self.pos += HEADER_BYTES + padded(len);
                    match on_metadata.as_mut() {
                        Some(handler) => {
                            let mut reader = BinaryReader::with_config(body, self.config);
                            handler(&mut reader)?;
                            return Ok(TryRead::Metadata);
                        }
                        None => continue,
                    }
                }
                FramePoll::Document { len } => {
                    let handler = match on_document.as_mut() {
                        Some(handler) => handler,
                        None => return Err(DecodeError::UnexpectedDocument { len }),
                    };
                    let body = self.frame_body(len)?;
                    self.pos += HEADER_BYTES + padded(len);
                    let mut reader = BinaryReader::with_config(body, self.config);
                    return Ok(TryRead::Data(handler(&mut reader)?));
                }
            }
        }
    }

    /// Consumes the next data document, spinning while the buffer is empty
    /// or a frame is mid-write. Metadata frames are skipped.
    pub fn read_document<T>(
        &mut self,
        on_document: &mut dyn FnMut(&mut BinaryReader<'_>) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        loop {
            match self.try_read_document(Some(&mut *on_document), None)? {
                TryRead::Data(value) => return Ok(value),
                TryRead::Empty | TryRead::Writing => std::hint::spin_loop(),
                TryRead::Metadata => unreachable!("metadata is skipped without a handler"),
            }
        }
    }

    fn frame_body(&self, len: usize) -> Result<&'a [u8], DecodeError> {
        let start = self.pos + HEADER_BYTES;
        if start + len > self.buf.capacity() {
            return Err(DecodeError::TruncatedFrame {
                len,
                cap: self.buf.capacity().saturating_sub(start),
            });
        }
        Ok(self.buf.body(start, len))
    }
}
