// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! STREAM, RESET_STREAM, STOP_SENDING and NEW_TOKEN frames.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{NEW_TOKEN_TAG, RESET_STREAM_TAG, STOP_SENDING_TAG, STREAM_TAG_MIN};

const OFF_BIT: u8 = 0x04;
const LEN_BIT: u8 = 0x02;
const FIN_BIT: u8 = 0x01;

/// RFC 9000 section 19.8. `fin` marks the final size of the stream as
/// `offset + data.len()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stream<'a> {
    pub stream_id: VarInt,
    pub offset: VarInt,
    pub data: &'a [u8],
    pub is_fin: bool,
}

impl<'a> Stream<'a> {
    pub fn decode(tag: u8, buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        debug_assert!((STREAM_TAG_MIN..=0x0f).contains(&tag));
        let flags = tag & 0x07;
        let (_, buffer) = buffer.decode_slice(1)?;
        let (stream_id, buffer) = buffer.decode::<VarInt>()?;

        let (offset, buffer) = if flags & OFF_BIT != 0 {
            buffer.decode::<VarInt>()?
        } else {
            (VarInt::ZERO, buffer)
        };

        let (data, buffer) = if flags & LEN_BIT != 0 {
            let (len, buffer) = buffer.decode::<VarInt>()?;
            let (data, buffer) = buffer.decode_slice(len.as_u64() as usize)?;
            (data.as_less_safe_slice(), buffer)
        } else {
            let len = buffer.len();
            let (data, buffer) = buffer.decode_slice(len)?;
            (data.as_less_safe_slice(), buffer)
        };

        Ok((Stream { stream_id, offset, data, is_fin: flags & FIN_BIT != 0 }, buffer))
    }
}

impl<'a> EncoderValue for Stream<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        let mut tag = STREAM_TAG_MIN | LEN_BIT;
        if self.offset != VarInt::ZERO {
            tag |= OFF_BIT;
        }
        if self.is_fin {
            tag |= FIN_BIT;
        }
        encoder.write_slice(&[tag]);
        encoder.encode(&self.stream_id);
        if self.offset != VarInt::ZERO {
            encoder.encode(&self.offset);
        }
        encoder.encode_with_len_prefix::<VarInt, _>(&self.data);
    }
}

/// RFC 9000 section 19.4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetStream {
    pub stream_id: VarInt,
    pub application_error_code: VarInt,
    pub final_size: VarInt,
}

impl<'a> DecoderValue<'a> for ResetStream {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (stream_id, buffer) = buffer.decode::<VarInt>()?;
        let (application_error_code, buffer) = buffer.decode::<VarInt>()?;
        let (final_size, buffer) = buffer.decode::<VarInt>()?;
        Ok((ResetStream { stream_id, application_error_code, final_size }, buffer))
    }
}

impl EncoderValue for ResetStream {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[RESET_STREAM_TAG]);
        encoder.encode(&self.stream_id);
        encoder.encode(&self.application_error_code);
        encoder.encode(&self.final_size);
    }
}

/// RFC 9000 section 19.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopSending {
    pub stream_id: VarInt,
    pub application_error_code: VarInt,
}

impl<'a> DecoderValue<'a> for StopSending {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (stream_id, buffer) = buffer.decode::<VarInt>()?;
        let (application_error_code, buffer) = buffer.decode::<VarInt>()?;
        Ok((StopSending { stream_id, application_error_code }, buffer))
    }
}

impl EncoderValue for StopSending {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[STOP_SENDING_TAG]);
        encoder.encode(&self.stream_id);
        encoder.encode(&self.application_error_code);
    }
}

/// RFC 9000 section 19.7. Sent only by servers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewToken<'a> {
    pub token: &'a [u8],
}

impl<'a> DecoderValue<'a> for NewToken<'a> {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (len, buffer) = buffer.decode::<VarInt>()?;
        let (token, buffer) = buffer.decode_slice(len.as_u64() as usize)?;
        Ok((NewToken { token: token.as_less_safe_slice() }, buffer))
    }
}

impl<'a> EncoderValue for NewToken<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[NEW_TOKEN_TAG]);
        encoder.encode_with_len_prefix::<VarInt, _>(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_codec::EncoderBuffer;

    #[test]
    fn stream_frame_round_trips_with_offset_and_fin() {
        let frame = Stream { stream_id: VarInt::from_u32(4), offset: VarInt::from_u32(16), data: b"hello", is_fin: true };
        let mut out = vec![0u8; frame.encoding_size()];
        let mut encoder = EncoderBuffer::new(&mut out);
        frame.encode(&mut encoder);

        let tag = out[0];
        let (decoded, rest) = Stream::decode(tag, DecoderBuffer::new(&out)).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
    }

    #[test]
    fn reset_stream_round_trips() {
        let frame = ResetStream {
            stream_id: VarInt::from_u32(8),
            application_error_code: VarInt::from_u32(1),
            final_size: VarInt::from_u32(4096),
        };
        let mut out = vec![0u8; frame.encoding_size()];
        let mut encoder = EncoderBuffer::new(&mut out);
        frame.encode(&mut encoder);
        let (decoded, rest) = DecoderBuffer::new(&out).decode::<ResetStream>().unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
    }
}
