// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! PATH_CHALLENGE and PATH_RESPONSE frames (RFC 9000 sections 19.17-19.18),
//! used for path validation during migration.

use rquic_codec::{DecoderBuffer, DecoderBufferResult, DecoderValue, Encoder, EncoderValue};

use super::{PATH_CHALLENGE_TAG, PATH_RESPONSE_TAG};

macro_rules! challenge_frame {
    ($name:ident, $tag:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub data: [u8; 8],
        }

        impl<'a> DecoderValue<'a> for $name {
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                let (_, buffer) = buffer.decode_slice(1)?;
                let (data, buffer) = buffer.decode_slice(8)?;
                let mut fixed = [0u8; 8];
                fixed.copy_from_slice(data.as_less_safe_slice());
                Ok(($name { data: fixed }, buffer))
            }
        }

        impl EncoderValue for $name {
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                encoder.write_slice(&[$tag]);
                encoder.write_slice(&self.data);
            }
        }
    };
}

challenge_frame!(PathChallenge, PATH_CHALLENGE_TAG);
challenge_frame!(PathResponse, PATH_RESPONSE_TAG);
