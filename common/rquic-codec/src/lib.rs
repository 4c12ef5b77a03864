// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! A small, allocation-light buffer codec used to parse and generate every
//! QUIC wire type in `rquic-core`. Decoding always consumes a buffer and
//! hands back the remainder, so a frame parser chains `decode` calls without
//! tracking a cursor by hand.

pub mod decoder;
pub mod encoder;

pub use decoder::{
    DecoderBuffer, DecoderBufferMut, DecoderBufferMutResult, DecoderBufferResult, DecoderError,
    DecoderValue,
};
pub use encoder::{Encoder, EncoderBuffer, EncoderValue};
