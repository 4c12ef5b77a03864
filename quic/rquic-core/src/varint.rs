// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The QUIC variable-length integer encoding (RFC 9000 section 16).
//!
//! The two most significant bits of the first byte encode the base-2
//! logarithm of the encoding length in bytes, so values are encoded on 1, 2,
//! 4, or 8 bytes, representing 6-, 14-, 30-, or 62-bit values respectively.

use core::{convert::TryFrom, fmt, ops};
use rquic_codec::{DecoderBuffer, DecoderError, DecoderValue, Encoder, EncoderValue};

pub const MAX_VARINT_VALUE: u64 = 4_611_686_018_427_387_903;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarIntError;

impl fmt::Display for VarIntError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "varint range exceeded")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for VarIntError {}

#[derive(Clone, Copy, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct VarInt(u64);

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VarInt({})", self.0)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl VarInt {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(MAX_VARINT_VALUE);

    #[inline]
    pub fn new(value: u64) -> Result<Self, VarIntError> {
        if value > MAX_VARINT_VALUE {
            Err(VarIntError)
        } else {
            Ok(Self(value))
        }
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self(value as u64)
    }

    #[inline]
    pub const fn from_u16(value: u16) -> Self {
        Self(value as u64)
    }

    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Self(value as u64)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).filter(|v| *v <= MAX_VARINT_VALUE).map(Self)
    }

    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Number of bytes this value would take on the wire
    #[inline]
    pub fn encoding_size(self) -> usize {
        encoding_size(self.0)
    }
}

#[inline]
fn encoding_size(value: u64) -> usize {
    debug_assert!(value <= MAX_VARINT_VALUE);
    if value <= 63 {
        1
    } else if value <= 16_383 {
        2
    } else if value <= 1_073_741_823 {
        4
    } else {
        8
    }
}

impl From<VarInt> for u64 {
    #[inline]
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl TryFrom<u64> for VarInt {
    type Error = VarIntError;

    #[inline]
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<usize> for VarInt {
    type Error = VarIntError;

    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value as u64)
    }
}

impl TryFrom<VarInt> for usize {
    type Error = VarIntError;

    #[inline]
    fn try_from(value: VarInt) -> Result<Self, Self::Error> {
        usize::try_from(value.0).map_err(|_| VarIntError)
    }
}

impl From<u8> for VarInt {
    #[inline]
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<u16> for VarInt {
    #[inline]
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<u32> for VarInt {
    #[inline]
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl ops::Add for VarInt {
    type Output = VarInt;

    #[inline]
    fn add(self, rhs: VarInt) -> VarInt {
        self.checked_add(rhs).expect("VarInt overflow")
    }
}

impl ops::Sub for VarInt {
    type Output = VarInt;

    #[inline]
    fn sub(self, rhs: VarInt) -> VarInt {
        self.checked_sub(rhs).expect("VarInt underflow")
    }
}

impl<'a> DecoderValue<'a> for VarInt {
    #[inline]
    fn decode(buffer: DecoderBuffer<'a>) -> Result<(Self, DecoderBuffer<'a>), DecoderError> {
        let (tag, _) = buffer.decode_slice(1)?;
        let first = tag.as_less_safe_slice()[0];
        let prefix = first >> 6;
        let len = 1usize << prefix;

        let (slice, buffer) = buffer.decode_slice(len)?;
        let bytes = slice.as_less_safe_slice();

        let mut value = (bytes[0] & 0x3f) as u64;
        for byte in &bytes[1..] {
            value = (value << 8) | (*byte as u64);
        }

        Ok((VarInt(value), buffer))
    }
}

impl EncoderValue for VarInt {
    #[inline]
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        let value = self.0;
        let len = encoding_size(value);
        let prefix = len.trailing_zeros() as u8; // len is 1, 2, 4, or 8

        match len {
            1 => encoder.write_slice(&[(prefix << 6) | value as u8]),
            2 => {
                let v = (value as u16) | ((prefix as u16) << 14);
                encoder.write_slice(&v.to_be_bytes());
            }
            4 => {
                let v = (value as u32) | ((prefix as u32) << 30);
                encoder.write_slice(&v.to_be_bytes());
            }
            _ => {
                let v = value | ((prefix as u64) << 62);
                encoder.write_slice(&v.to_be_bytes());
            }
        }
    }

    #[inline]
    fn encoding_size(&self) -> usize {
        VarInt::encoding_size(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_codec::EncoderBuffer;

    #[test]
    fn boundary_encoding_sizes() {
        assert_eq!(VarInt::from_u32(0).encoding_size(), 1);
        assert_eq!(VarInt::from_u32(63).encoding_size(), 1);
        assert_eq!(VarInt::from_u32(64).encoding_size(), 2);
        assert_eq!(VarInt::from_u32(16_383).encoding_size(), 2);
        assert_eq!(VarInt::from_u32(16_384).encoding_size(), 4);
        assert_eq!(VarInt::from_u32(1_073_741_823).encoding_size(), 4);
        assert_eq!(VarInt::new(1_073_741_824).unwrap().encoding_size(), 8);
        assert_eq!(VarInt::MAX.encoding_size(), 8);
    }

    #[test]
    fn rfc9000_appendix_a_examples() {
        // RFC 9000 Appendix A.1 worked examples
        let cases: &[(u64, &[u8])] = &[
            (151_288_809_941_952_652, &[0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c]),
            (494_878_333, &[0x9d, 0x7f, 0x3e, 0x7d]),
            (15_293, &[0x7b, 0xbd]),
            (37, &[0x25]),
        ];

        for (value, wire) in cases {
            let var = VarInt::new(*value).unwrap();
            let mut out = vec![0u8; wire.len()];
            let mut encoder = EncoderBuffer::new(&mut out);
            var.encode(&mut encoder);
            assert_eq!(encoder.as_slice(), *wire);

            let buffer = DecoderBuffer::new(wire);
            let (decoded, rest) = buffer.decode::<VarInt>().unwrap();
            assert_eq!(decoded, var);
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(VarInt::new(MAX_VARINT_VALUE + 1).is_err());
        assert!(VarInt::new(MAX_VARINT_VALUE).is_ok());
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(VarInt::MAX.checked_add(VarInt::from_u32(1)), None);
        assert_eq!(
            VarInt::from_u32(1).checked_add(VarInt::from_u32(2)),
            Some(VarInt::from_u32(3))
        );
    }
}
