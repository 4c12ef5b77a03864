// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! ACK and ACK_ECN frames (RFC 9000 section 19.3).
//!
//! Ranges are kept as absolute `(smallest, largest)` pairs, largest first,
//! rather than the wire's delta-encoded gap/length pairs — `recovery`
//! builds and consumes them this way, and the gap/length transform is
//! purely an encoding detail confined to this module.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{ACK_ECN_TAG, ACK_TAG};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EcnCounts {
    pub ect0: VarInt,
    pub ect1: VarInt,
    pub ce: VarInt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack<'a> {
    pub ack_delay: VarInt,
    /// Acknowledged packet number ranges, largest range first, each as
    /// `(smallest, largest)` inclusive bounds.
    pub ack_ranges: Vec<(VarInt, VarInt)>,
    pub ecn_counts: Option<EcnCounts>,
    _marker: core::marker::PhantomData<&'a ()>,
}

impl<'a> Ack<'a> {
    pub fn new(ack_delay: VarInt, ack_ranges: Vec<(VarInt, VarInt)>, ecn_counts: Option<EcnCounts>) -> Self {
        debug_assert!(!ack_ranges.is_empty(), "an ACK frame must cover at least one packet");
        Self { ack_delay, ack_ranges, ecn_counts, _marker: core::marker::PhantomData }
    }

    pub fn largest_acknowledged(&self) -> VarInt {
        self.ack_ranges[0].1
    }

    pub fn decode(with_ecn: bool, buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (largest_acknowledged, buffer) = buffer.decode::<VarInt>()?;
        let (ack_delay, buffer) = buffer.decode::<VarInt>()?;
        let (range_count, buffer) = buffer.decode::<VarInt>()?;
        let (first_ack_range, mut buffer) = buffer.decode::<VarInt>()?;

        let mut ack_ranges = Vec::with_capacity(1 + range_count.as_u64() as usize);
        let mut largest = largest_acknowledged;
        let smallest = largest
            .checked_sub(first_ack_range)
            .ok_or(rquic_codec::DecoderError::InvariantViolation("first ack range exceeds largest acked"))?;
        ack_ranges.push((smallest, largest));
        largest = smallest;

        for _ in 0..range_count.as_u64() {
            let (gap, next) = buffer.decode::<VarInt>()?;
            let (len, next) = next.decode::<VarInt>()?;
            buffer = next;
            let range_largest = largest
                .checked_sub(gap)
                .and_then(|v| v.checked_sub(VarInt::from_u8(2)))
                .ok_or(rquic_codec::DecoderError::InvariantViolation("ack gap underflows"))?;
            let range_smallest = range_largest
                .checked_sub(len)
                .ok_or(rquic_codec::DecoderError::InvariantViolation("ack length underflows"))?;
            ack_ranges.push((range_smallest, range_largest));
            largest = range_smallest;
        }

        let (ecn_counts, buffer) = if with_ecn {
            let (ect0, buffer) = buffer.decode::<VarInt>()?;
            let (ect1, buffer) = buffer.decode::<VarInt>()?;
            let (ce, buffer) = buffer.decode::<VarInt>()?;
            (Some(EcnCounts { ect0, ect1, ce }), buffer)
        } else {
            (None, buffer)
        };

        Ok((Self::new(ack_delay, ack_ranges, ecn_counts), buffer))
    }
}

impl<'a> EncoderValue for Ack<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        let tag = if self.ecn_counts.is_some() { ACK_ECN_TAG } else { ACK_TAG };
        encoder.write_slice(&[tag]);
        encoder.encode(&self.largest_acknowledged());
        encoder.encode(&self.ack_delay);
        encoder.encode(&VarInt::new((self.ack_ranges.len() - 1) as u64).expect("range count fits"));

        let (first_smallest, first_largest) = self.ack_ranges[0];
        encoder.encode(&(first_largest - first_smallest));

        let mut prev_smallest = first_smallest;
        for &(smallest, largest) in &self.ack_ranges[1..] {
            let gap = (prev_smallest - largest) - VarInt::from_u8(2);
            let len = largest - smallest;
            encoder.encode(&gap);
            encoder.encode(&len);
            prev_smallest = smallest;
        }

        if let Some(ecn) = &self.ecn_counts {
            encoder.encode(&ecn.ect0);
            encoder.encode(&ecn.ect1);
            encoder.encode(&ecn.ce);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_codec::EncoderBuffer;

    #[test]
    fn round_trips_multiple_ranges() {
        let ranges = vec![
            (VarInt::from_u32(90), VarInt::from_u32(100)),
            (VarInt::from_u32(50), VarInt::from_u32(80)),
            (VarInt::from_u32(10), VarInt::from_u32(20)),
        ];
        let ack = Ack::new(VarInt::from_u32(1000), ranges.clone(), None);

        let mut out = vec![0u8; ack.encoding_size()];
        let mut encoder = EncoderBuffer::new(&mut out);
        ack.encode(&mut encoder);

        let buffer = DecoderBuffer::new(&out);
        let (decoded, rest) = Ack::decode(false, buffer).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded.ack_ranges, ranges);
        assert_eq!(decoded.ecn_counts, None);
    }

    #[test]
    fn round_trips_with_ecn_counts() {
        let ranges = vec![(VarInt::from_u32(5), VarInt::from_u32(5))];
        let ecn = EcnCounts { ect0: VarInt::from_u32(1), ect1: VarInt::ZERO, ce: VarInt::from_u32(2) };
        let ack = Ack::new(VarInt::ZERO, ranges.clone(), Some(ecn));

        let mut out = vec![0u8; ack.encoding_size()];
        let mut encoder = EncoderBuffer::new(&mut out);
        ack.encode(&mut encoder);

        let (decoded, _) = Ack::decode(true, DecoderBuffer::new(&out)).unwrap();
        assert_eq!(decoded.ecn_counts, Some(ecn));
    }
}
