//! Typed messages and their frame encoding.
//!
//! Every frame on the wire is
//!
//! ```text
//! +------------------+-------------------+---------------------------+
//! | length (u16 BE)  | type id (u32 BE)  | payload (length - 6)      |
//! +------------------+-------------------+---------------------------+
//! ```
//!
//! where `length` counts the whole frame, header included.

use std::any::Any;
use std::fmt;

use crate::prelude::*;
use super::buffer::{BufferError, ByteBuffer};
use super::message_type::MessageType;
use super::wire::Wire;

pub const HEADER_SIZE: usize = 6;
/// Largest frame the u16 length field can describe.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}
impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A unit of application data that knows how to lay out its own payload.
///
/// `serialize_data` and `deserialize_data` must touch the fields in the same
/// order. Reads never fail loudly (see [`MessageBuf::take`]), so every field
/// should be read unconditionally to keep the cursor aligned with the writer.
pub trait Message: AsAny + fmt::Debug + 'static {
    fn message_type(&self) -> MessageType;
    fn serialize_data(&self, buf: &mut MessageBuf);
    fn deserialize_data(&mut self, buf: &mut MessageBuf);
}

/// A message with a statically known type and a blank starting state, which
/// is what the registry needs to build one from a frame.
pub trait TypedMessage: Message + Default {
    const TYPE: MessageType;
}

impl dyn Message {
    pub fn downcast_ref<M: Message + 'static>(&self) -> Option<&M> {
        AsAny::as_any(self).downcast_ref()
    }
}

/// Read/write cursor handed to a message while it (de)serialises itself.
#[derive(Debug, Default)]
pub struct MessageBuf {
    bytes: ByteBuffer,
    short_reads: usize,
}

impl MessageBuf {
    pub fn new() -> Self {
        Self::default()
    }
    /// Cursor over a payload without its header.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self { bytes: ByteBuffer::from_slice(payload), short_reads: 0 }
    }
    pub fn into_payload(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
    pub fn put<T: Wire>(&mut self, value: &T) {
        value.encode(&mut self.bytes);
    }
    pub fn put_bytes(&mut self, raw: &[u8]) {
        self.bytes.append(raw);
    }
    /// Reads the next value into `dst`.
    ///
    /// If the buffer is too short the error is logged, counted, and `dst`
    /// keeps its previous value. A message that keeps reading after a short
    /// read is working with values it cannot trust.
    pub fn take<T: Wire>(&mut self, dst: &mut T) -> bool {
        match T::decode(&mut self.bytes) {
            Some(v) => {
                *dst = v;
                true
            }
            None => {
                self.short_reads += 1;
                false
            }
        }
    }
    pub fn take_bytes(&mut self, n: usize) -> Option<Vec<u8>> {
        if n > self.bytes.len() {
            log::error!("requested {n} raw bytes but only {} available", self.bytes.len());
            self.short_reads += 1;
            return None;
        }
        let mut raw = vec![0; n];
        match self.bytes.extract_front(&mut raw) {
            Ok(()) => Some(raw),
            Err(_) => {
                self.short_reads += 1;
                None
            }
        }
    }
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame of {len} bytes does not fit the 16-bit length field")]
    FrameTooLarge { len: usize },
    #[error("frame of {len} bytes is shorter than the {header}-byte header", header = HEADER_SIZE)]
    Truncated { len: usize },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Outcome of a deserialisation that went through. Anything other than
/// clean points at a framing or version mismatch between the peers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStatus {
    pub short_reads: usize,
    pub trailing_bytes: usize,
}

impl DecodeStatus {
    pub fn is_clean(&self) -> bool {
        self.short_reads == 0 && self.trailing_bytes == 0
    }
}

/// A serialised message, header included. Immutable once built, so the same
/// frame can be queued on any number of connections.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    pub fn message_type(&self) -> MessageType {
        // the constructor guarantees a full header
        MessageType::from_tag(&[self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]])
    }
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("type", &self.message_type())
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Writes the header with a zero length, lets the message append its
/// payload, then patches the real length into bytes 0..2.
pub fn serialize(msg: &dyn Message) -> Result<Frame, CodecError> {
    let mut buf = MessageBuf::new();
    buf.put(&0u16);
    buf.put(&msg.message_type().id());
    msg.serialize_data(&mut buf);

    let len = buf.bytes.len();
    let [hi, lo] = u16::try_from(len)
        .map_err(|_| CodecError::FrameTooLarge { len })?
        .to_be_bytes();
    buf.bytes.overwrite_position(0, hi)?;
    buf.bytes.overwrite_position(1, lo)?;
    Ok(Frame { bytes: buf.bytes.into_vec() })
}

/// Fills `msg` from a whole frame, header included.
///
/// Scalar and string fields are overwritten. A message holding a list must
/// clear it in `deserialize_data`, so that decoding into a used instance
/// gives the same result as decoding into a blank one.
pub fn deserialize(msg: &mut dyn Message, frame: &[u8]) -> Result<DecodeStatus, CodecError> {
    if frame.len() < HEADER_SIZE {
        return Err(CodecError::Truncated { len: frame.len() });
    }
    let mut buf = MessageBuf::from_payload(&frame[HEADER_SIZE..]);
    msg.deserialize_data(&mut buf);

    let status = DecodeStatus { short_reads: buf.short_reads, trailing_bytes: buf.remaining() };
    if status.trailing_bytes != 0 {
        log::error!(
            "deserializing message (type '{}', size {}), buffer not empty ({} bytes)",
            msg.message_type(), frame.len(), status.trailing_bytes
        );
    }
    if status.short_reads != 0 {
        log::error!(
            "deserializing message (type '{}', size {}), {} reads ran past the end",
            msg.message_type(), frame.len(), status.short_reads
        );
    }
    Ok(status)
}

pub fn decode<M: TypedMessage>(frame: &[u8]) -> Result<(M, DecodeStatus), CodecError> {
    let mut msg = M::default();
    let status = deserialize(&mut msg, frame)?;
    Ok((msg, status))
}
