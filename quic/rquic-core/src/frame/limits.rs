// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The flow-control and stream-limit frames. All six share the same shape —
//! either a single VarInt, or a stream ID plus a VarInt — and differ only in
//! tag and, for the streams variants, a directionality bit.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{
    DATA_BLOCKED_TAG, MAX_DATA_TAG, MAX_STREAMS_BIDI_TAG, MAX_STREAMS_UNI_TAG, MAX_STREAM_DATA_TAG,
    STREAMS_BLOCKED_BIDI_TAG, STREAMS_BLOCKED_UNI_TAG, STREAM_DATA_BLOCKED_TAG,
};

macro_rules! varint_frame {
    ($name:ident, $tag:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub value: VarInt,
        }

        impl<'a> DecoderValue<'a> for $name {
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                let (_, buffer) = buffer.decode_slice(1)?;
                let (value, buffer) = buffer.decode::<VarInt>()?;
                Ok(($name { value }, buffer))
            }
        }

        impl EncoderValue for $name {
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                encoder.write_slice(&[$tag]);
                encoder.encode(&self.value);
            }
        }
    };
}

varint_frame!(MaxData, MAX_DATA_TAG);
varint_frame!(DataBlocked, DATA_BLOCKED_TAG);

macro_rules! stream_scoped_frame {
    ($name:ident, $tag:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub stream_id: VarInt,
            pub value: VarInt,
        }

        impl<'a> DecoderValue<'a> for $name {
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                let (_, buffer) = buffer.decode_slice(1)?;
                let (stream_id, buffer) = buffer.decode::<VarInt>()?;
                let (value, buffer) = buffer.decode::<VarInt>()?;
                Ok(($name { stream_id, value }, buffer))
            }
        }

        impl EncoderValue for $name {
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                encoder.write_slice(&[$tag]);
                encoder.encode(&self.stream_id);
                encoder.encode(&self.value);
            }
        }
    };
}

stream_scoped_frame!(MaxStreamData, MAX_STREAM_DATA_TAG);
stream_scoped_frame!(StreamDataBlocked, STREAM_DATA_BLOCKED_TAG);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamDirection {
    Bidirectional,
    Unidirectional,
}

macro_rules! directional_frame {
    ($name:ident, $bidi_tag:expr, $uni_tag:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub direction: StreamDirection,
            pub value: VarInt,
        }

        impl<'a> $name {
            pub fn decode(unidirectional: bool, buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                let (_, buffer) = buffer.decode_slice(1)?;
                let (value, buffer) = buffer.decode::<VarInt>()?;
                let direction = if unidirectional { StreamDirection::Unidirectional } else { StreamDirection::Bidirectional };
                Ok(($name { direction, value }, buffer))
            }
        }

        impl EncoderValue for $name {
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                let tag = match self.direction {
                    StreamDirection::Bidirectional => $bidi_tag,
                    StreamDirection::Unidirectional => $uni_tag,
                };
                encoder.write_slice(&[tag]);
                encoder.encode(&self.value);
            }
        }
    };
}

directional_frame!(MaxStreams, MAX_STREAMS_BIDI_TAG, MAX_STREAMS_UNI_TAG);
directional_frame!(StreamsBlocked, STREAMS_BLOCKED_BIDI_TAG, STREAMS_BLOCKED_UNI_TAG);

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_codec::EncoderBuffer;

    #[test]
    fn max_streams_round_trips_both_directions() {
        for (direction, unidirectional) in [(StreamDirection::Bidirectional, false), (StreamDirection::Unidirectional, true)] {
            let frame = MaxStreams { direction, value: VarInt::from_u32(10) };
            let mut out = vec![0u8; frame.encoding_size()];
            let mut encoder = EncoderBuffer::new(&mut out);
            frame.encode(&mut encoder);
            let (decoded, rest) = MaxStreams::decode(unidirectional, DecoderBuffer::new(&out)).unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded, frame);
        }
    }
}
