// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use super::Encoder;

/// An [`Encoder`] that only counts the bytes that would have been written.
///
/// `EncoderValue::encoding_size` is derived from this by default, so frame
/// types only need to implement `encode` once.
#[derive(Default)]
pub struct EncoderLenEstimator {
    len: usize,
}

impl EncoderLenEstimator {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
}

impl Encoder for EncoderLenEstimator {
    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }

    #[inline]
    fn remaining_capacity(&self) -> usize {
        usize::MAX - self.len
    }
}
