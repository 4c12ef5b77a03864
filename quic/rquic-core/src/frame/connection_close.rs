// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! CONNECTION_CLOSE frames (RFC 9000 section 19.19). The transport and
//! application variants share a shape except the transport variant also
//! carries the frame type that triggered the error.

use crate::varint::VarInt;
use rquic_codec::{DecoderBuffer, DecoderBufferResult, Encoder, EncoderValue};

use super::{CONNECTION_CLOSE_APPLICATION_TAG, CONNECTION_CLOSE_TRANSPORT_TAG};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionClose<'a> {
    pub error_code: VarInt,
    /// Set only for the transport-error variant; `None` for application closes.
    pub frame_type: Option<VarInt>,
    pub reason: &'a [u8],
}

impl<'a> ConnectionClose<'a> {
    pub fn is_application(&self) -> bool {
        self.frame_type.is_none()
    }

    pub fn decode(application: bool, buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (_, buffer) = buffer.decode_slice(1)?;
        let (error_code, buffer) = buffer.decode::<VarInt>()?;

        let (frame_type, buffer) = if application {
            (None, buffer)
        } else {
            let (frame_type, buffer) = buffer.decode::<VarInt>()?;
            (Some(frame_type), buffer)
        };

        let (len, buffer) = buffer.decode::<VarInt>()?;
        let (reason, buffer) = buffer.decode_slice(len.as_u64() as usize)?;

        Ok((ConnectionClose { error_code, frame_type, reason: reason.as_less_safe_slice() }, buffer))
    }
}

impl<'a> EncoderValue for ConnectionClose<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        let tag = if self.is_application() { CONNECTION_CLOSE_APPLICATION_TAG } else { CONNECTION_CLOSE_TRANSPORT_TAG };
        encoder.write_slice(&[tag]);
        encoder.encode(&self.error_code);
        if let Some(frame_type) = self.frame_type {
            encoder.encode(&frame_type);
        }
        encoder.encode_with_len_prefix::<VarInt, _>(&self.reason);
    }
}
