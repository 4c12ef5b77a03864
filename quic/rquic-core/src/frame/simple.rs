// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The zero-field frames: PADDING, PING, HANDSHAKE_DONE.

use super::{HANDSHAKE_DONE_TAG, PADDING_TAG, PING_TAG};
use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

macro_rules! zero_field_frame {
    ($name:ident, $tag:expr) => {
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl<'a> DecoderValue<'a> for $name {
            #[inline]
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                let (_, buffer) = buffer.decode_slice(1)?;
                Ok(($name, buffer))
            }
        }

        impl EncoderValue for $name {
            #[inline]
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                encoder.write_slice(&[$tag]);
            }

            #[inline]
            fn encoding_size(&self) -> usize {
                1
            }
        }
    };
}

zero_field_frame!(Padding, PADDING_TAG);
zero_field_frame!(Ping, PING_TAG);
zero_field_frame!(HandshakeDone, HANDSHAKE_DONE_TAG);
