// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! DATAGRAM frames (RFC 9221), an unreliable, unordered application-data
//! extension frame that bypasses stream flow control entirely.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, Encoder, EncoderValue};

use super::{DATAGRAM_TAG, DATAGRAM_WITH_LEN_TAG};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram<'a> {
    pub data: &'a [u8],
}

impl<'a> Datagram<'a> {
    pub fn decode(with_len: bool, buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (data, buffer) = if with_len {
            let (len, buffer) = buffer.decode::<VarInt>()?;
            buffer.decode_slice(len.as_u64() as usize)?
        } else {
            let len = buffer.len();
            buffer.decode_slice(len)?
        };
        Ok((Datagram { data: data.as_less_safe_slice() }, buffer))
    }
}

impl<'a> EncoderValue for Datagram<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[DATAGRAM_WITH_LEN_TAG]);
        encoder.encode_with_len_prefix::<VarInt, _>(&self.data);
    }
}
