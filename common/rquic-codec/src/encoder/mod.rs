// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

mod buffer;
mod estimator;
mod value;

pub use buffer::EncoderBuffer;
pub use estimator::EncoderLenEstimator;
pub use value::EncoderValue;

/// A sink that accepts encoded bytes.
///
/// Implemented both by [`EncoderBuffer`] (which actually writes bytes) and
/// by [`EncoderLenEstimator`] (which only counts them), so
/// [`EncoderValue::encoding_size`] can be derived for free from `encode`.
pub trait Encoder {
    fn write_slice(&mut self, bytes: &[u8]);
    fn remaining_capacity(&self) -> usize;

    #[inline]
    fn encode<T: EncoderValue>(&mut self, value: &T)
    where
        Self: Sized,
    {
        value.encode(self)
    }

    #[inline]
    fn encode_with_len_prefix<Length, T>(&mut self, value: &T)
    where
        Length: EncoderValue + TryFrom<usize>,
        T: EncoderValue,
        Self: Sized,
    {
        let len = value.encoding_size();
        let length = Length::try_from(len).unwrap_or_else(|_| panic!("length prefix overflow"));
        self.encode(&length);
        value.encode(self);
    }
}
