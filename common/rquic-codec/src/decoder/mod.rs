// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

mod buffer;
mod buffer_mut;
mod value;

pub use buffer::DecoderBuffer;
pub use buffer_mut::DecoderBufferMut;
pub use value::DecoderValue;

use core::fmt;

/// An error produced while decoding a buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderError {
    /// The buffer did not contain enough bytes to decode the requested value
    UnexpectedEof,
    /// A length-prefixed value's length exceeds what `usize` can represent
    /// on this platform
    LengthCapacityExceeded,
    /// A length-prefixed value did not consume its entire sub-slice
    UnexpectedBytes,
    /// A decoded value violates an invariant of the wire format
    InvariantViolation(&'static str),
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of buffer"),
            Self::LengthCapacityExceeded => write!(f, "length prefix exceeds usize capacity"),
            Self::UnexpectedBytes => write!(f, "value did not consume its entire sub-slice"),
            Self::InvariantViolation(reason) => write!(f, "invariant violation: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecoderError {}

pub type DecoderBufferResult<'a, T> = Result<(T, DecoderBuffer<'a>), DecoderError>;
pub type DecoderBufferMutResult<'a, T> = Result<(T, DecoderBufferMut<'a>), DecoderError>;
