// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use super::{DecoderBuffer, DecoderBufferResult};

/// A value that can be decoded out of the front of a [`DecoderBuffer`]
pub trait DecoderValue<'a>: Sized {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self>;
}

macro_rules! impl_int {
    ($ty:ty) => {
        impl<'a> DecoderValue<'a> for $ty {
            #[inline]
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
                const LEN: usize = core::mem::size_of::<$ty>();
                let (slice, buffer) = buffer.decode_slice(LEN)?;
                let mut bytes = [0u8; LEN];
                bytes.copy_from_slice(slice.as_less_safe_slice());
                Ok((<$ty>::from_be_bytes(bytes), buffer))
            }
        }
    };
}

impl_int!(u8);
impl_int!(u16);
impl_int!(u32);
impl_int!(u64);
impl_int!(u128);

impl<'a> DecoderValue<'a> for DecoderBuffer<'a> {
    #[inline]
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        Ok((buffer, DecoderBuffer::new(&[])))
    }
}

impl<'a> DecoderValue<'a> for &'a [u8] {
    #[inline]
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let slice = buffer.as_less_safe_slice();
        Ok((slice, DecoderBuffer::new(&[])))
    }
}
