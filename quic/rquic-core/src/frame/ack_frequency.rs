// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! ACK_FREQUENCY and IMMEDIATE_ACK (draft-ietf-quic-ack-frequency), and
//! TIMESTAMP (an experimental one-way-delay measurement extension). All
//! three are negotiated via transport parameters before either side may
//! send them.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{ACK_FREQUENCY_TAG, IMMEDIATE_ACK_TAG, TIMESTAMP_TAG};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckFrequency {
    pub sequence_number: VarInt,
    pub ack_eliciting_threshold: VarInt,
    pub request_max_ack_delay: VarInt,
    pub reordering_threshold: VarInt,
}

impl<'a> DecoderValue<'a> for AckFrequency {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (sequence_number, buffer) = buffer.decode::<VarInt>()?;
        let (ack_eliciting_threshold, buffer) = buffer.decode::<VarInt>()?;
        let (request_max_ack_delay, buffer) = buffer.decode::<VarInt>()?;
        let (reordering_threshold, buffer) = buffer.decode::<VarInt>()?;
        Ok((
            AckFrequency { sequence_number, ack_eliciting_threshold, request_max_ack_delay, reordering_threshold },
            buffer,
        ))
    }
}

impl EncoderValue for AckFrequency {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[ACK_FREQUENCY_TAG]);
        encoder.encode(&self.sequence_number);
        encoder.encode(&self.ack_eliciting_threshold);
        encoder.encode(&self.request_max_ack_delay);
        encoder.encode(&self.reordering_threshold);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImmediateAck;

impl<'a> DecoderValue<'a> for ImmediateAck {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        Ok((ImmediateAck, buffer))
    }
}

impl EncoderValue for ImmediateAck {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[IMMEDIATE_ACK_TAG]);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub timestamp: VarInt,
}

impl<'a> DecoderValue<'a> for Timestamp {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (timestamp, buffer) = buffer.decode::<VarInt>()?;
        Ok((Timestamp { timestamp }, buffer))
    }
}

impl EncoderValue for Timestamp {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&[TIMESTAMP_TAG]);
        encoder.encode(&self.timestamp);
    }
}
