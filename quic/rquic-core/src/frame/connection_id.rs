// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! NEW_CONNECTION_ID and RETIRE_CONNECTION_ID frames (RFC 9000 sections 19.15-19.16).

use crate::varint::VarInt;
use core::convert::TryInto;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{NEW_CONNECTION_ID_TAG, RETIRE_CONNECTION_ID_TAG};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewConnectionId<'a> {
    pub sequence_number: VarInt,
    pub retire_prior_to: VarInt,
    pub connection_id: &'a [u8],
    pub stateless_reset_token: &'a [u8; 16],
}

impl<'a> DecoderValue<'a> for NewConnectionId<'a> {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (sequence_number, buffer) = buffer.decode::<VarInt>()?;
        let (retire_prior_to, buffer) = buffer.decode::<VarInt>()?;
        let (len, buffer) = buffer.decode_slice(1)?;
        let len = len.as_less_safe_slice()[0] as usize;
        let (connection_id, buffer) = buffer.decode_slice(len)?;
        let (token, buffer) = buffer.decode_slice(16)?;
        let token: &[u8; 16] = token
            .as_less_safe_slice()
            .try_into()
            .map_err(|_| rquic_codec::DecoderError::InvariantViolation("stateless reset token must be 16 bytes"))?;

        Ok((
            NewConnectionId {
                sequence_number,
                retire_prior_to,
                connection_id: connection_id.as_less_safe_slice(),
                stateless_reset_token: token,
            },
            buffer,
        ))
    }
}

impl<'a> EncoderValue for NewConnectionId<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[NEW_CONNECTION_ID_TAG]);
        encoder.encode(&self.sequence_number);
        encoder.encode(&self.retire_prior_to);
        encoder.write_slice(&[self.connection_id.len() as u8]);
        encoder.write_slice(self.connection_id);
        encoder.write_slice(self.stateless_reset_token);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetireConnectionId {
    pub sequence_number: VarInt,
}

impl<'a> DecoderValue<'a> for RetireConnectionId {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (sequence_number, buffer) = buffer.decode::<VarInt>()?;
        Ok((RetireConnectionId { sequence_number }, buffer))
    }
}

impl EncoderValue for RetireConnectionId {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[RETIRE_CONNECTION_ID_TAG]);
        encoder.encode(&self.sequence_number);
    }
}
