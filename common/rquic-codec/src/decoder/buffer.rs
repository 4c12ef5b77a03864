// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use super::{DecoderBufferMut, DecoderBufferResult, DecoderError, DecoderValue};

/// An immutable view over a byte slice that is consumed as values are
/// decoded out of it.
///
/// ```
/// # use rquic_codec::DecoderBuffer;
/// let data = [1u8, 2, 3, 4];
/// let buffer = DecoderBuffer::new(&data);
/// let (value, buffer): (u8, _) = buffer.decode().unwrap();
/// assert_eq!(value, 1);
/// assert_eq!(buffer.len(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> DecoderBuffer<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_less_safe_slice(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    fn ensure_len(&self, count: usize) -> Result<(), DecoderError> {
        if self.bytes.len() < count {
            Err(DecoderError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    /// Splits `count` bytes off the front of the buffer, returning the
    /// slice and the remainder.
    #[inline]
    pub fn decode_slice(self, count: usize) -> DecoderBufferResult<'a, DecoderBuffer<'a>> {
        self.ensure_len(count)?;
        let (head, tail) = self.bytes.split_at(count);
        Ok((DecoderBuffer::new(head), DecoderBuffer::new(tail)))
    }

    /// Decodes a value implementing [`DecoderValue`]
    #[inline]
    pub fn decode<T: DecoderValue<'a>>(self) -> DecoderBufferResult<'a, T> {
        T::decode(self)
    }

    /// Decodes a length-prefixed slice, where `Length` is itself decoded
    /// from the front of the buffer.
    #[inline]
    pub fn decode_slice_with_len_prefix<Length>(self) -> DecoderBufferResult<'a, DecoderBuffer<'a>>
    where
        Length: DecoderValue<'a> + TryInto<usize>,
    {
        let (len, buffer): (Length, _) = self.decode()?;
        let len = len
            .try_into()
            .map_err(|_| DecoderError::LengthCapacityExceeded)?;
        buffer.decode_slice(len)
    }

    /// Decodes a length-prefixed value of type `T`; `T::decode` must consume
    /// the entire sub-slice.
    #[inline]
    pub fn decode_with_len_prefix<Length, T>(self) -> DecoderBufferResult<'a, T>
    where
        Length: DecoderValue<'a> + TryInto<usize>,
        T: DecoderValue<'a>,
    {
        let (slice, buffer) = self.decode_slice_with_len_prefix::<Length>()?;
        let (value, slice) = slice.decode::<T>()?;
        if !slice.is_empty() {
            return Err(DecoderError::UnexpectedBytes);
        }
        Ok((value, buffer))
    }

    /// Discards `count` bytes from the front of the buffer
    #[inline]
    pub fn skip(self, count: usize) -> Result<Self, DecoderError> {
        self.ensure_len(count)?;
        Ok(Self::new(&self.bytes[count..]))
    }

    /// Returns an error unless the buffer has been fully consumed
    #[inline]
    pub fn ensure_empty(self) -> Result<(), DecoderError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecoderError::UnexpectedBytes)
        }
    }

    /// Peeks at `count` bytes without consuming them
    #[inline]
    pub fn peek_slice(&self, count: usize) -> Result<&'a [u8], DecoderError> {
        self.ensure_len(count)?;
        Ok(&self.bytes[..count])
    }
}

impl<'a> From<&'a [u8]> for DecoderBuffer<'a> {
    #[inline]
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<DecoderBufferMut<'a>> for DecoderBuffer<'a> {
    #[inline]
    fn from(buffer: DecoderBufferMut<'a>) -> Self {
        Self::new(buffer.into_less_safe_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{EncoderBuffer, EncoderValue};

    #[test]
    fn decode_roundtrip() {
        let mut out = vec![];
        let mut encoder = EncoderBuffer::new(&mut out);
        1u8.encode(&mut encoder);
        0x1234u16.encode(&mut encoder);

        let buffer = DecoderBuffer::new(&out);
        let (a, buffer) = buffer.decode::<u8>().unwrap();
        let (b, buffer) = buffer.decode::<u16>().unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 0x1234);
        assert!(buffer.is_empty());
    }

    #[test]
    fn eof_is_reported() {
        let data = [0u8; 1];
        let buffer = DecoderBuffer::new(&data);
        let err = buffer.decode::<u32>().unwrap_err();
        assert_eq!(err, DecoderError::UnexpectedEof);
    }
}
