// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use super::Encoder;

/// Writes encoded values into a caller-owned byte slice, tracking how much
/// capacity remains.
pub struct EncoderBuffer<'a> {
    bytes: &'a mut [u8],
    index: usize,
}

impl<'a> EncoderBuffer<'a> {
    #[inline]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.index]
    }
}

impl<'a> Encoder for EncoderBuffer<'a> {
    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) {
        let end = self.index + bytes.len();
        self.bytes[self.index..end].copy_from_slice(bytes);
        self.index = end;
    }

    #[inline]
    fn remaining_capacity(&self) -> usize {
        self.bytes.len() - self.index
    }
}

#[cfg(any(test, feature = "std"))]
impl Encoder for std::vec::Vec<u8> {
    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    #[inline]
    fn remaining_capacity(&self) -> usize {
        usize::MAX - self.len()
    }
}
