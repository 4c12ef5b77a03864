// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! RELIABLE_RESET_STREAM, an extension frame (draft-ietf-quic-reliable-
//! stream-reset) that lets a sender reset a stream while still
//! guaranteeing delivery of the bytes up to a chosen "reliable size".
//! Unlike RESET_STREAM, the receiver keeps reassembling data below
//! `reliable_size` even after the reset notification arrives.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::RELIABLE_RESET_STREAM_TAG;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReliableResetStream {
    pub stream_id: VarInt,
    pub application_error_code: VarInt,
    pub final_size: VarInt,
    pub reliable_size: VarInt,
}

impl<'a> DecoderValue<'a> for ReliableResetStream {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (stream_id, buffer) = buffer.decode::<VarInt>()?;
        let (application_error_code, buffer) = buffer.decode::<VarInt>()?;
        let (final_size, buffer) = buffer.decode::<VarInt>()?;
        let (reliable_size, buffer) = buffer.decode::<VarInt>()?;
        Ok((ReliableResetStream { stream_id, application_error_code, final_size, reliable_size }, buffer))
    }
}

impl EncoderValue for ReliableResetStream {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[RELIABLE_RESET_STREAM_TAG]);
        encoder.encode(&self.stream_id);
        encoder.encode(&self.application_error_code);
        encoder.encode(&self.final_size);
        encoder.encode(&self.reliable_size);
    }
}
