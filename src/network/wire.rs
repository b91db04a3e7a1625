//! Big-endian codec shared by every message type.
//!
//! Byte order is fixed regardless of the host, so this module is the only
//! place that knows about endianness.

use crate::prelude::*;
use super::buffer::ByteBuffer;

/// A value with a fixed encoding on the wire.
///
/// `decode` returns `None` when the buffer runs short. Fixed-size values
/// check the whole width up front, so a short read consumes nothing.
pub trait Wire: Sized {
    fn encode(&self, buf: &mut ByteBuffer);
    fn decode(buf: &mut ByteBuffer) -> Option<Self>;
}

macro_rules! be {
    { $($i:ident)* } => {
        $(
            impl Wire for $i {
                fn encode(&self, buf: &mut ByteBuffer) {
                    buf.append(&self.to_be_bytes());
                }
                fn decode(buf: &mut ByteBuffer) -> Option<Self> {
                    let mut n = [0; core::mem::size_of::<$i>()];
                    buf.extract_front(&mut n).ok()?;
                    Some($i::from_be_bytes(n))
                }
            }
        )*
    }
}
// f32 goes through to_be_bytes as its raw IEEE-754 bit pattern
be! { u8 i8 u16 i16 u32 i32 u64 i64 f32 }

impl Wire for bool {
    fn encode(&self, buf: &mut ByteBuffer) {
        buf.push(*self as u8);
    }
    fn decode(buf: &mut ByteBuffer) -> Option<Self> {
        u8::decode(buf).map(|b| b != 0)
    }
}

/// NUL-terminated. A string holding an interior NUL is written up to that
/// NUL only, so it comes back truncated.
impl Wire for String {
    fn encode(&self, buf: &mut ByteBuffer) {
        let bytes = self.as_bytes();
        let text = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => {
                log::warn!("string has a NUL at byte {nul}, writing {nul} of {} bytes", bytes.len());
                &bytes[..nul]
            }
            None => bytes,
        };
        buf.append(text);
        buf.push(0);
    }
    fn decode(buf: &mut ByteBuffer) -> Option<Self> {
        if buf.is_empty() {
            log::error!("reading string from an exhausted buffer");
            return None;
        }
        let bytes = buf.as_slice();
        let (text, consumed) = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => (String::from_utf8_lossy(&bytes[..nul]).into_owned(), nul + 1),
            None => {
                log::warn!("string ran to the end of the buffer without a terminator");
                (String::from_utf8_lossy(bytes).into_owned(), bytes.len())
            }
        };
        let mut skip = vec![0; consumed];
        buf.extract_front(&mut skip).ok()?;
        Some(text)
    }
}

impl Wire for Vec3 {
    fn encode(&self, buf: &mut ByteBuffer) {
        self.x.encode(buf);
        self.y.encode(buf);
        self.z.encode(buf);
    }
    fn decode(buf: &mut ByteBuffer) -> Option<Self> {
        if buf.len() < 12 {
            log::error!("vector needs 12 bytes, only {} available", buf.len());
            return None;
        }
        Some(Vec3 { x: f32::decode(buf)?, y: f32::decode(buf)?, z: f32::decode(buf)? })
    }
}

// Slice peeks, for looking at a frame header without consuming it.
macro_rules! peek {
    { $($i:ident)* } => {
        $(
            pub fn $i(buf: &[u8]) -> Option<($i, &[u8])> {
                (buf.len() >= core::mem::size_of::<$i>()).then(|| {
                    let (n, rem) = buf.split_at(core::mem::size_of::<$i>());
                    let mut b = [0; core::mem::size_of::<$i>()];
                    b.copy_from_slice(n);
                    ($i::from_be_bytes(b), rem)
                })
            }
        )*
    }
}
peek! { u16 u32 }

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: Wire>(v: T) -> Vec<u8> {
        let mut buf = ByteBuffer::new();
        v.encode(&mut buf);
        buf.into_vec()
    }

    #[test]
    fn integers_are_big_endian_twos_complement() {
        assert_eq!(encoded(0x1234u16), [0x12, 0x34]);
        assert_eq!(encoded(-2i16), [0xFF, 0xFE]);
        assert_eq!(encoded(0xDEADBEEFu32), [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(encoded(-1i32), [0xFF; 4]);
        assert_eq!(encoded(1u64), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encoded(-128i8), [0x80]);
    }

    #[test]
    fn float_keeps_its_bit_pattern() {
        assert_eq!(encoded(1.0f32), [0x3F, 0x80, 0, 0]);
        let mut buf = ByteBuffer::from_slice(&f32::NAN.to_bits().to_be_bytes());
        assert!(f32::decode(&mut buf).unwrap().is_nan());
    }

    #[test]
    fn bool_is_any_nonzero_byte() {
        assert_eq!(encoded(true), [1]);
        let mut buf = ByteBuffer::from_slice(&[0, 7]);
        assert_eq!(bool::decode(&mut buf), Some(false));
        assert_eq!(bool::decode(&mut buf), Some(true));
    }

    #[test]
    fn strings_are_nul_terminated() {
        assert_eq!(encoded(String::from("ab")), b"ab\0");
        assert_eq!(encoded(String::new()), b"\0");

        let mut buf = ByteBuffer::from_slice(b"\0rest\0");
        assert_eq!(String::decode(&mut buf).as_deref(), Some(""));
        assert_eq!(String::decode(&mut buf).as_deref(), Some("rest"));
        assert!(buf.is_empty());
    }

    #[test]
    fn interior_nul_truncates_without_shifting_later_fields() {
        let mut buf = ByteBuffer::new();
        String::from("a\0x").encode(&mut buf);
        7u32.encode(&mut buf);
        assert_eq!(buf.as_slice(), b"a\0\0\0\0\x07");

        assert_eq!(String::decode(&mut buf).as_deref(), Some("a"));
        assert_eq!(u32::decode(&mut buf), Some(7));
        assert!(buf.is_empty());
    }

    #[test]
    fn unterminated_string_returns_what_was_there() {
        let mut buf = ByteBuffer::from_slice(b"partial");
        assert_eq!(String::decode(&mut buf).as_deref(), Some("partial"));
        assert!(buf.is_empty());
        assert_eq!(String::decode(&mut buf), None);
    }

    #[test]
    fn short_read_consumes_nothing() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3]);
        assert_eq!(u32::decode(&mut buf), None);
        assert_eq!(buf.len(), 3);
        let mut buf = ByteBuffer::from_slice(&[0; 8]);
        assert_eq!(Vec3::decode(&mut buf), None);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn vector_is_three_floats() {
        let v = Vec3::new(1.5, -2.0, 0.25);
        let bytes = encoded(v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[4..8], &encoded(-2.0f32)[..]);
        assert_eq!(Vec3::decode(&mut ByteBuffer::from(bytes)), Some(v));
    }

    #[test]
    fn peeks_leave_the_remainder() {
        let frame = [0x00, 0x0A, b'C', b'h', b'a', b't', 9];
        let (len, rem) = u16(&frame).unwrap();
        assert_eq!(len, 10);
        let (ty, rem) = u32(rem).unwrap();
        assert_eq!(ty, u32::from_be_bytes(*b"Chat"));
        assert_eq!(rem, &[9]);
        assert!(u32(&frame[..3]).is_none());
    }
}
