// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use super::{Encoder, EncoderLenEstimator};

/// A value that knows how to write itself into an [`Encoder`]
pub trait EncoderValue {
    fn encode<E: Encoder>(&self, encoder: &mut E);

    /// The number of bytes `encode` would write. The default
    /// implementation runs `encode` against a counting encoder; override it
    /// when the size is cheaper to compute directly (e.g. fixed-width ints).
    #[inline]
    fn encoding_size(&self) -> usize {
        let mut estimator = EncoderLenEstimator::default();
        self.encode(&mut estimator);
        estimator.len()
    }
}

macro_rules! impl_int {
    ($ty:ty) => {
        impl EncoderValue for $ty {
            #[inline]
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                encoder.write_slice(&self.to_be_bytes());
            }

            #[inline]
            fn encoding_size(&self) -> usize {
                core::mem::size_of::<$ty>()
            }
        }
    };
}

impl_int!(u8);
impl_int!(u16);
impl_int!(u32);
impl_int!(u64);
impl_int!(u128);

impl EncoderValue for &[u8] {
    #[inline]
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(self);
    }

    #[inline]
    fn encoding_size(&self) -> usize {
        self.len()
    }
}
