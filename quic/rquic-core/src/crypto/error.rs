// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// AEAD decryption failed; the packet is dropped (RFC 9001 section 5.8
    /// forbids treating this as a connection error to avoid becoming an
    /// oracle for active attacks).
    Decrypt,
    /// A key reached its confidentiality or integrity limit (RFC 9001
    /// section 6.6) and must be retired before further use.
    KeyLimitExceeded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Decrypt => write!(f, "aead decryption failed"),
            Self::KeyLimitExceeded => write!(f, "key reached its usage limit"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
