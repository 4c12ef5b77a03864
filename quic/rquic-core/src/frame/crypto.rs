// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! CRYPTO frames carry TLS handshake bytes (RFC 9000 section 19.6).

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::CRYPTO_TAG;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crypto<'a> {
    pub offset: VarInt,
    pub data: &'a [u8],
}

impl<'a> DecoderValue<'a> for Crypto<'a> {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (offset, buffer) = buffer.decode::<VarInt>()?;
        let (len, buffer) = buffer.decode::<VarInt>()?;
        let (data, buffer) = buffer.decode_slice(len.as_u64() as usize)?;
        Ok((Crypto { offset, data: data.as_less_safe_slice() }, buffer))
    }
}

impl<'a> EncoderValue for Crypto<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[CRYPTO_TAG]);
        encoder.encode(&self.offset);
        encoder.encode_with_len_prefix::<VarInt, _>(&self.data);
    }
}
