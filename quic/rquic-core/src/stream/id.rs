// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The QUIC stream identifier (RFC 9000 section 2.1): a 62-bit integer
//! whose two least significant bits encode who opened the stream and
//! whether it is bidirectional.

use crate::{endpoint, stream::StreamType, varint::VarInt};

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub struct StreamId(VarInt);

impl From<StreamId> for VarInt {
    fn from(id: StreamId) -> Self {
        id.0
    }
}

impl From<StreamId> for u64 {
    fn from(id: StreamId) -> Self {
        id.0.as_u64()
    }
}

impl StreamId {
    #[inline]
    pub const fn from_varint(id: VarInt) -> StreamId {
        StreamId(id)
    }

    #[inline]
    pub const fn as_varint(self) -> VarInt {
        self.0
    }

    /// The lowest stream ID for the given `(initiator, stream_type)`
    /// combination — e.g. `3` for a server-initiated unidirectional stream.
    #[inline]
    pub fn initial(initiator: endpoint::Type, stream_type: StreamType) -> StreamId {
        match (stream_type == StreamType::Bidirectional, initiator == endpoint::Type::Client) {
            (true, true) => StreamId(VarInt::from_u32(0)),
            (true, false) => StreamId(VarInt::from_u32(1)),
            (false, true) => StreamId(VarInt::from_u32(2)),
            (false, false) => StreamId(VarInt::from_u32(3)),
        }
    }

    /// The `n`-th stream ID of this type, counting the initial ID as 0.
    /// `None` if it would overflow the varint range.
    #[inline]
    pub fn nth(initiator: endpoint::Type, stream_type: StreamType, n: u64) -> Option<StreamId> {
        let initial = Self::initial(initiator, stream_type);
        let id = VarInt::new(n.checked_mul(4)?.checked_add(initial.into())?).ok()?;
        Some(StreamId(id))
    }

    /// The next stream ID of the same type as `self` (IDs of one type are
    /// spaced 4 apart). `None` at the top of the varint range.
    #[inline]
    pub fn next_of_type(self) -> Option<StreamId> {
        self.0.checked_add(VarInt::from_u32(4)).map(StreamId::from_varint)
    }

    #[inline]
    pub fn initiator(self) -> endpoint::Type {
        if u64::from(self.0) & 0x01 == 0 {
            endpoint::Type::Client
        } else {
            endpoint::Type::Server
        }
    }

    #[inline]
    pub fn stream_type(self) -> StreamType {
        if u64::from(self.0) & 0x02 == 0 {
            StreamType::Bidirectional
        } else {
            StreamType::Unidirectional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::MAX_VARINT_VALUE;

    #[test]
    fn initial_stream_ids_round_trip_their_type_and_initiator() {
        for stream_type in [StreamType::Bidirectional, StreamType::Unidirectional] {
            for initiator in [endpoint::Type::Client, endpoint::Type::Server] {
                let id = StreamId::initial(initiator, stream_type);
                assert_eq!(stream_type, id.stream_type());
                assert_eq!(initiator, id.initiator());
            }
        }
    }

    #[test]
    fn next_of_type_is_none_past_the_varint_max() {
        let max_stream_id_varint = VarInt::new((1 << 62) - 1).unwrap();
        let max_increaseable = StreamId::from_varint(max_stream_id_varint - VarInt::from_u8(4));
        assert!(max_increaseable.next_of_type().is_some());

        for increment in 1u32..5 {
            let id_varint = max_stream_id_varint - VarInt::from_u8(4) + VarInt::from_u32(increment);
            let stream_id = StreamId::from_varint(id_varint);
            assert!(stream_id.next_of_type().is_none());
        }
    }

    #[test]
    fn nth_matches_manual_stepping() {
        for stream_type in [StreamType::Bidirectional, StreamType::Unidirectional] {
            for initiator in [endpoint::Type::Client, endpoint::Type::Server] {
                let first = StreamId::nth(initiator, stream_type, 0).unwrap();
                assert_eq!(StreamId::initial(initiator, stream_type), first);
                for n in 1..10u64 {
                    let nth = StreamId::nth(initiator, stream_type, n).unwrap();
                    assert_eq!(VarInt::from_u32(n as u32 * 4), nth.as_varint() - first.as_varint());
                }
            }
        }
    }

    #[test]
    fn nth_past_the_range_is_none() {
        for stream_type in [StreamType::Bidirectional, StreamType::Unidirectional] {
            for initiator in [endpoint::Type::Client, endpoint::Type::Server] {
                assert_eq!(None, StreamId::nth(initiator, stream_type, MAX_VARINT_VALUE / 2));
            }
        }
    }
}
