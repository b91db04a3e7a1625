//! A message carrying one of every wire type, for checking that two builds
//! agree on the encoding.

use super::{Message, MessageBuf, MessageType, TypedMessage};

message! {
    TestDataTypes(
        str1: String,
        uint64_1: u64, uint64_2: u64, uint64_3: u64,
        uint32_1: u32, uint32_2: u32, uint32_3: u32,
        uint16_1: u16, uint16_2: u16, uint16_3: u16,
        uint8_1: u8, uint8_2: u8, uint8_3: u8,
        str2: String,
        int32_1: i32, int32_2: i32, int32_3: i32,
        int16_1: i16, int16_2: i16, int16_3: i16,
        int8_1: i8, int8_2: i8, int8_3: i8,
        str3: String,
        c: u8,
        b: bool,
        f1: f32, f2: f32, f3: f32,
        str4: String
    ): b"Test"
}

impl TestDataTypes {
    /// Extremes, zeroes and a mid-range value for each width.
    pub fn sample() -> Self {
        Self {
            str1: "String 1".into(),
            uint64_1: u64::MAX,
            uint64_2: 0,
            uint64_3: 1_234_567_890_123_456_789,
            uint32_1: u32::MAX,
            uint32_2: 0,
            uint32_3: 1_234_567_890,
            uint16_1: u16::MAX,
            uint16_2: 0,
            uint16_3: 12345,
            uint8_1: u8::MAX,
            uint8_2: 0,
            uint8_3: 123,
            str2: "String 2".into(),
            int32_1: -123_456_789,
            int32_2: 0,
            int32_3: 123_456_789,
            int16_1: -12345,
            int16_2: 0,
            int16_3: 12345,
            int8_1: -123,
            int8_2: 0,
            int8_3: 123,
            str3: "String 3".into(),
            c: b'c',
            b: true,
            f1: -123_456.78,
            f2: 0.0,
            f3: 123_456.78,
            str4: "String 4".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::{decode, serialize};

    #[test]
    fn sample_survives_the_wire() {
        let frame = serialize(&TestDataTypes::sample()).unwrap();
        // four strings, the unsigned and signed triples, char and bool, three floats
        assert_eq!(frame.payload().len(), 4 * 9 + 3 * 15 + 3 * 7 + 2 + 12);
        let (back, status) = decode::<TestDataTypes>(frame.as_bytes()).unwrap();
        assert!(status.is_clean());
        assert_eq!(back, TestDataTypes::sample());
    }

    #[test]
    fn starts_with_the_first_string() {
        let frame = serialize(&TestDataTypes::sample()).unwrap();
        assert_eq!(&frame.payload()[..9], b"String 1\0");
        assert_eq!(&frame.payload()[9..17], &[0xFF; 8]);
    }
}
